//! Execution/read/write hook registry.
//!
//! The registry keeps every callback it hands to the host reachable under a
//! monotonically increasing [`CallbackId`] until it is removed with
//! [`HookRegistry::off`] or [`HookRegistry::clear`]. Ids are never reused.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::{HookHost, HostHookId, ScriptError};

/// Callback run by the host when a hook fires; receives the triggering
/// address.
pub type HookCallback = Rc<dyn Fn(u32)>;

/// Host activity a hook reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum HookKind {
    /// CPU execution reaches the tagged address.
    Exec,
    /// CPU reads the tagged address.
    Read,
    /// CPU writes the tagged address.
    Write,
}

impl HookKind {
    /// Host-facing hook name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl FromStr for HookKind {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exec" => Ok(Self::Exec),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            other => Err(ScriptError::UnknownHookKind(other.to_owned())),
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-local id of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub u32);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ids returned by a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle {
    /// Local registry id.
    pub id: CallbackId,
    /// Handle the host returned for the installed hook.
    pub host: HostHookId,
}

/// One live hook registration.
#[derive(Clone)]
pub struct Registration {
    /// Local registry id.
    pub id: CallbackId,
    /// Hooked activity.
    pub kind: HookKind,
    /// Address (or other host tag) scoping the hook.
    pub tag: u32,
    /// Host-side handle.
    pub host: HostHookId,
    callback: HookCallback,
}

impl Registration {
    /// The retained callback.
    #[must_use]
    pub fn callback(&self) -> HookCallback {
        Rc::clone(&self.callback)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Table of hook callbacks owned by a scripting session.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: BTreeMap<CallbackId, Registration>,
    next_id: u32,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `kind` scoped by `tag` and installs it with
    /// the host.
    ///
    /// A fresh id is consumed even when the host rejects the hook.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged; nothing is stashed in that case.
    pub fn on<H: HookHost + ?Sized>(
        &mut self,
        host: &mut H,
        kind: HookKind,
        tag: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        let id = self.allocate_id();
        let callback: HookCallback = Rc::new(callback);
        let host_id = host.add_callback(kind, tag, Rc::clone(&callback))?;

        log::debug!("hook {id} installed: {kind} @ {tag:#010X} (host {})", host_id.0);
        self.entries.insert(
            id,
            Registration {
                id,
                kind,
                tag,
                host: host_id,
                callback,
            },
        );
        Ok(HookHandle { id, host: host_id })
    }

    /// Hooks execution reaching `address`.
    ///
    /// # Errors
    ///
    /// See [`HookRegistry::on`].
    pub fn onexec<H: HookHost + ?Sized>(
        &mut self,
        host: &mut H,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(host, HookKind::Exec, address, callback)
    }

    /// Hooks reads of `address`.
    ///
    /// # Errors
    ///
    /// See [`HookRegistry::on`].
    pub fn onread<H: HookHost + ?Sized>(
        &mut self,
        host: &mut H,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(host, HookKind::Read, address, callback)
    }

    /// Hooks writes of `address`.
    ///
    /// # Errors
    ///
    /// See [`HookRegistry::on`].
    pub fn onwrite<H: HookHost + ?Sized>(
        &mut self,
        host: &mut H,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(host, HookKind::Write, address, callback)
    }

    /// Removes one registration from the host and from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownCallback`] for ids not in the registry,
    /// or the host failure (the registration is kept in that case).
    pub fn off<H: HookHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: CallbackId,
    ) -> Result<Registration, ScriptError> {
        let host_id = self
            .entries
            .get(&id)
            .map(|entry| entry.host)
            .ok_or(ScriptError::UnknownCallback(id))?;
        host.remove_callback(host_id)?;

        log::debug!("hook {id} removed (host {})", host_id.0);
        self.entries
            .remove(&id)
            .ok_or(ScriptError::UnknownCallback(id))
    }

    /// Removes every registration in id order.
    ///
    /// # Errors
    ///
    /// Stops at the first host failure; registrations not yet removed stay in
    /// the registry.
    pub fn clear<H: HookHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        let ids: Vec<CallbackId> = self.entries.keys().copied().collect();
        for id in ids {
            self.off(host, id)?;
        }
        Ok(())
    }

    /// Looks up a registration.
    #[must_use]
    pub fn get(&self, id: CallbackId) -> Option<&Registration> {
        self.entries.get(&id)
    }

    /// Retained callback for `id`.
    #[must_use]
    pub fn callback(&self, id: CallbackId) -> Option<HookCallback> {
        self.get(id).map(Registration::callback)
    }

    /// Runs the callback registered under `id` with `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownCallback`] for ids not in the registry.
    pub fn invoke(&self, id: CallbackId, address: u32) -> Result<(), ScriptError> {
        let callback = self.callback(id).ok_or(ScriptError::UnknownCallback(id))?;
        callback(address);
        Ok(())
    }

    /// Live registration ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = CallbackId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    const fn allocate_id(&mut self) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        id
    }
}
