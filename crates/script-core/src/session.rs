//! Script-facing entry point bundling a host, its configuration and the
//! hook registry.

use crate::console::report_error;
use crate::hex::{hex_width, ToHex};
use crate::{
    alert, CallbackId, Console, Debugger, DebugHost, DialogHost, Fpr, Gpr, HookHandle, HookKind,
    HookRegistry, Host, Memory, Registration, Rom, ScriptError, Server, SessionConfig, Socket,
    SocketHost, System, SystemHost, Thread, ThreadHost,
};

/// One scripting session over an embedding host.
///
/// The session owns the host and every hook registered through it. Views
/// returned by the accessor methods borrow the host for their lifetime.
#[derive(Debug)]
pub struct ScriptSession<H> {
    host: H,
    config: SessionConfig,
    events: HookRegistry,
}

impl<H: Host> ScriptSession<H> {
    /// Starts a session with default configuration.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, SessionConfig::default())
    }

    /// Starts a session with `config`.
    #[must_use]
    pub fn with_config(host: H, config: SessionConfig) -> Self {
        Self {
            host,
            config,
            events: HookRegistry::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared access to the host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Exclusive access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Ends the session, returning the host. Registered hooks stay installed.
    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }

    /// `gpr` view.
    pub fn gpr(&mut self) -> Gpr<'_, H> {
        Gpr::new(&mut self.host)
    }

    /// `fpr` view.
    pub fn fpr(&mut self) -> Fpr<'_, H> {
        Fpr::new(&mut self.host)
    }

    /// `mem` view.
    pub fn mem(&mut self) -> Memory<'_, H> {
        Memory::new(&mut self.host)
    }

    /// `rom` view.
    pub fn rom(&mut self) -> Rom<'_, H> {
        Rom::new(&mut self.host)
    }

    /// `console` view.
    pub fn console(&mut self) -> Console<'_, H> {
        Console::new(&mut self.host)
    }

    /// Hook registry.
    #[must_use]
    pub const fn events(&self) -> &HookRegistry {
        &self.events
    }

    /// See [`HookRegistry::on`].
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn on(
        &mut self,
        kind: HookKind,
        tag: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.events.on(&mut self.host, kind, tag, callback)
    }

    /// See [`HookRegistry::onexec`].
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn onexec(
        &mut self,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(HookKind::Exec, address, callback)
    }

    /// See [`HookRegistry::onread`].
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn onread(
        &mut self,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(HookKind::Read, address, callback)
    }

    /// See [`HookRegistry::onwrite`].
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn onwrite(
        &mut self,
        address: u32,
        callback: impl Fn(u32) + 'static,
    ) -> Result<HookHandle, ScriptError> {
        self.on(HookKind::Write, address, callback)
    }

    /// See [`HookRegistry::off`].
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownCallback`] or the host failure.
    pub fn off(&mut self, id: CallbackId) -> Result<Registration, ScriptError> {
        self.events.off(&mut self.host, id)
    }

    /// See [`HookRegistry::clear`].
    ///
    /// # Errors
    ///
    /// Returns the first host failure.
    pub fn clear_hooks(&mut self) -> Result<(), ScriptError> {
        self.events.clear(&mut self.host)
    }

    /// Formats `value` with the configured default width.
    #[must_use]
    pub fn hex(&self, value: impl ToHex) -> String {
        hex_width(value, self.config.hex_digits)
    }

    /// Runs one script step, reporting a failure instead of returning it.
    ///
    /// A failure is logged and, unless disabled in the configuration, printed
    /// to the console as `error: <message>`.
    pub fn run<T>(
        &mut self,
        script: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Option<T> {
        match script(self) {
            Ok(value) => Some(value),
            Err(error) => {
                if self.config.report_errors_to_console {
                    if let Err(console) = report_error(&mut self.host, &error) {
                        log::warn!("could not report script error to console: {console}");
                    }
                } else {
                    log::error!("script error: {error}");
                }
                None
            }
        }
    }
}

impl<H: Host + DialogHost> ScriptSession<H> {
    /// Shows a modal message box.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn alert(&mut self, text: &str, caption: Option<&str>) -> Result<(), ScriptError> {
        alert(&mut self.host, text, caption)
    }
}

impl<H: Host + SystemHost> ScriptSession<H> {
    /// `system` view.
    pub fn system(&mut self) -> System<'_, H> {
        System::new(&mut self.host)
    }
}

impl<H: Host + DebugHost> ScriptSession<H> {
    /// `debug` view.
    pub fn debug(&mut self) -> Debugger<'_, H> {
        Debugger::new(&mut self.host)
    }
}

impl<H: Host + SocketHost> ScriptSession<H> {
    /// Creates a client socket using the session's socket defaults.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn socket(&mut self) -> Result<Socket, ScriptError> {
        Socket::with_config(&mut self.host, &self.config)
    }

    /// Creates a server, listening on `port` when given.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn server(&mut self, port: Option<u16>) -> Result<Server, ScriptError> {
        Server::with_config(&mut self.host, port, self.config.clone())
    }
}

impl<H: Host + ThreadHost> ScriptSession<H> {
    /// Creates a READY thread and starts it.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn spawn(&mut self, proc: impl Fn() + Send + Sync + 'static) -> Result<Thread, ScriptError> {
        let mut thread = Thread::new(proc);
        thread.start(&mut self.host)?;
        Ok(thread)
    }

    /// Blocks the script for `ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn sleep(&mut self, ms: u32) -> Result<(), ScriptError> {
        Thread::sleep(&mut self.host, ms)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::ScriptSession;
    use crate::test_support::{Call, FakeHost};
    use crate::{HookKind, MemorySpace, ScriptError, SessionConfig, ThreadState};

    #[test]
    fn views_share_the_session_host() {
        let mut session = ScriptSession::new(FakeHost::default());

        session.gpr().set_named("sp", 0x801F_FF00).unwrap();
        session.mem().u16().set(0x8000_0000, 0xBEEF).unwrap();

        assert_eq!(session.gpr().get(29).unwrap(), 0x801F_FF00);
        assert_eq!(session.mem().u16().get(0x8000_0000).unwrap(), 0xBEEF);
        assert_eq!(
            session.host_mut().peek(MemorySpace::Main, 0x8000_0000, 2),
            vec![0xBE, 0xEF]
        );
    }

    #[test]
    fn hook_helpers_register_and_remove() {
        let mut session = ScriptSession::new(FakeHost::default());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);

        let handle = session
            .onexec(0x8024_6DD8, move |_| counter.set(counter.get() + 1))
            .unwrap();
        session.events().invoke(handle.id, 0x8024_6DD8).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(session.events().get(handle.id).unwrap().kind, HookKind::Exec);

        session.off(handle.id).unwrap();
        assert!(session.events().is_empty());
        assert!(session.host().hooks.is_empty());
    }

    #[test]
    fn clear_hooks_empties_registry() {
        let mut session = ScriptSession::new(FakeHost::default());
        session.onread(1, |_| {}).unwrap();
        session.onwrite(2, |_| {}).unwrap();

        session.clear_hooks().unwrap();

        assert!(session.events().is_empty());
    }

    #[test]
    fn run_reports_failures_on_the_console() {
        let mut session = ScriptSession::new(FakeHost::default());

        let outcome: Option<u32> = session.run(|s| s.gpr().get_named("r99"));

        assert_eq!(outcome, None);
        assert_eq!(
            session.host().calls,
            vec![Call::Print("error: unknown register `r99`\r\n".into())]
        );
    }

    #[test]
    fn run_returns_the_script_value() {
        let mut session = ScriptSession::new(FakeHost::default());
        assert_eq!(session.run(|s| s.gpr().get_named("pc")), Some(0));
    }

    #[test]
    fn console_reporting_can_be_disabled() {
        let config = SessionConfig {
            report_errors_to_console: false,
            ..SessionConfig::default()
        };
        let mut session = ScriptSession::with_config(FakeHost::default(), config);

        let outcome = session.run(|_| Err::<(), _>(ScriptError::UnknownField("hp".into())));

        assert!(outcome.is_none());
        assert!(session.host().calls.is_empty());
    }

    #[test]
    fn hex_uses_configured_width() {
        let config = SessionConfig {
            hex_digits: 4,
            ..SessionConfig::default()
        };
        let session = ScriptSession::with_config(FakeHost::default(), config);
        assert_eq!(session.hex(0xAB_u32), "00AB");
    }

    #[test]
    fn extended_host_surfaces() {
        let mut session = ScriptSession::new(FakeHost::default());

        session.alert("done", None).unwrap();
        session.system().pause().unwrap();
        session.debug().showcommands(0x10).unwrap();
        let thread = session.spawn(|| {}).unwrap();
        let socket = session.socket().unwrap();
        let server = session.server(Some(8080)).unwrap();

        assert_eq!(thread.state(), ThreadState::Running);
        assert_eq!(socket.buffer_size(), 2048);
        assert_ne!(socket.fd(), server.fd());
        assert_eq!(
            session.host().calls[..3],
            [
                Call::MessageBox("done".into(), String::new()),
                Call::System("pause"),
                Call::ShowCommands(0x10),
            ]
        );
    }
}
