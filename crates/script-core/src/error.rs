use thiserror::Error;

use crate::{CallbackId, ThreadState};

/// Error classes used for diagnostics and host-facing policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Lifecycle operation attempted in a state that forbids it.
    InvalidState,
    /// Type tag absent from the primitive type registry.
    UnrecognizedType,
    /// A host primitive reported a failure.
    HostCallFailure,
    /// Name or id lookup failed (register, field, callback, hook kind).
    Lookup,
}

/// Failure reported by a host primitive.
///
/// The core never inspects or rewrites these; they travel to the caller
/// unchanged through [`ScriptError::Host`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("host call `{call}` failed: {message}")]
pub struct HostError {
    /// Name of the host primitive that failed.
    pub call: &'static str,
    /// Host-provided description.
    pub message: String,
}

impl HostError {
    /// Creates a host error for the named primitive.
    #[must_use]
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

/// Error surface of every fallible scripting API operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// Thread lifecycle transition not allowed from the current state.
    #[error("invalid state: cannot {operation} a thread that is {state}")]
    InvalidState {
        /// Attempted operation (`start`, `suspend`, ...).
        operation: &'static str,
        /// State the thread was in when the operation was attempted.
        state: ThreadState,
    },
    /// Type tag is not one of `u8 u16 u32 s8 s16 s32 float double`.
    #[error("unrecognized type `{0}`")]
    UnrecognizedType(String),
    /// Register name is not in the register name table.
    #[error("unknown register `{0}`")]
    UnknownRegister(String),
    /// Bound object has no property with this name.
    #[error("unknown field `{0}`")]
    UnknownField(String),
    /// Struct definition lists the same field name twice.
    #[error("duplicate field `{0}` in struct definition")]
    DuplicateField(String),
    /// Target object already has a bound property with this name.
    #[error("property `{0}` is already bound")]
    PropertyRedefined(String),
    /// No hook registration exists for this id.
    #[error("no callback registered with id {0}")]
    UnknownCallback(CallbackId),
    /// Hook kind name is not `exec`, `read` or `write`.
    #[error("unknown hook kind `{0}`")]
    UnknownHookKind(String),
    /// Host primitive failure, propagated unchanged.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl ScriptError {
    /// Returns the diagnostics class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidState { .. } => ErrorClass::InvalidState,
            Self::UnrecognizedType(_) => ErrorClass::UnrecognizedType,
            Self::Host(_) => ErrorClass::HostCallFailure,
            Self::UnknownRegister(_)
            | Self::UnknownField(_)
            | Self::DuplicateField(_)
            | Self::PropertyRedefined(_)
            | Self::UnknownCallback(_)
            | Self::UnknownHookKind(_) => ErrorClass::Lookup,
        }
    }
}

/// Result alias used across the scripting API.
pub type ScriptResult<T> = Result<T, ScriptError>;
