//! Host thread wrapper with a checked lifecycle.
//!
//! ```text
//! READY --start--> RUNNING --suspend--> SUSPENDED
//!   |                 ^  |                  |
//!   |                 |  +------resume------+
//!   +------stop-------+--stop--> STOPPED
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{ScriptError, ThreadHandle, ThreadHost, ThreadProc};

/// Lifecycle state of a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
#[repr(u8)]
pub enum ThreadState {
    /// Constructed, not yet started.
    Ready = 0,
    /// Running on a host thread.
    Running = 1,
    /// Suspended by [`Thread::suspend`].
    Suspended = 2,
    /// Terminal.
    Stopped = 3,
}

impl ThreadState {
    /// Numeric state code exposed to scripts.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script-owned handle to a host thread running a procedure.
pub struct Thread {
    proc: ThreadProc,
    state: ThreadState,
    handle: Option<ThreadHandle>,
}

impl Thread {
    /// Creates a thread in [`ThreadState::Ready`] that will run `proc`.
    #[must_use]
    pub fn new(proc: impl Fn() + Send + Sync + 'static) -> Self {
        Self::from_proc(Arc::new(proc))
    }

    /// Creates a thread from an already shared procedure.
    #[must_use]
    pub const fn from_proc(proc: ThreadProc) -> Self {
        Self {
            proc,
            state: ThreadState::Ready,
            handle: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ThreadState {
        self.state
    }

    /// Host handle, once started.
    #[must_use]
    pub const fn handle(&self) -> Option<ThreadHandle> {
        self.handle
    }

    /// Spawns the procedure on a host thread. READY → RUNNING.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidState`] unless the thread is READY, or
    /// the host failure. Neither changes the state.
    pub fn start<H: ThreadHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        self.expect_state("start", &[ThreadState::Ready])?;
        let handle = host.create_thread(Arc::clone(&self.proc))?;
        self.handle = Some(handle);
        self.commit(ThreadState::Running);
        Ok(())
    }

    /// Suspends the host thread. RUNNING → SUSPENDED.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidState`] unless the thread is RUNNING, or
    /// the host failure.
    pub fn suspend<H: ThreadHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        let handle = self.started("suspend", &[ThreadState::Running])?;
        host.suspend_thread(handle)?;
        self.commit(ThreadState::Suspended);
        Ok(())
    }

    /// Resumes the host thread. SUSPENDED → RUNNING.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidState`] unless the thread is SUSPENDED,
    /// or the host failure.
    pub fn resume<H: ThreadHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        let handle = self.started("resume", &[ThreadState::Suspended])?;
        host.resume_thread(handle)?;
        self.commit(ThreadState::Running);
        Ok(())
    }

    /// Stops the thread. READY or RUNNING → STOPPED.
    ///
    /// A thread that was never started is stopped without a host call.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidState`] from SUSPENDED or STOPPED, or the
    /// host failure.
    pub fn stop<H: ThreadHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        self.expect_state("stop", &[ThreadState::Ready, ThreadState::Running])?;
        if self.state == ThreadState::Running {
            let handle = self.started("stop", &[ThreadState::Running])?;
            host.terminate_thread(handle)?;
        }
        self.commit(ThreadState::Stopped);
        Ok(())
    }

    /// Blocks the calling thread for `ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn sleep<H: ThreadHost + ?Sized>(host: &mut H, ms: u32) -> Result<(), ScriptError> {
        Ok(host.sleep(ms)?)
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[ThreadState],
    ) -> Result<(), ScriptError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            log::warn!("thread: rejected {operation} while {}", self.state);
            Err(ScriptError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn started(
        &self,
        operation: &'static str,
        allowed: &[ThreadState],
    ) -> Result<ThreadHandle, ScriptError> {
        self.expect_state(operation, allowed)?;
        self.handle.ok_or(ScriptError::InvalidState {
            operation,
            state: self.state,
        })
    }

    fn commit(&mut self, next: ThreadState) {
        log::debug!("thread: {} -> {next}", self.state);
        self.state = next;
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("state", &self.state)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
