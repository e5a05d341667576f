//! Script console output and modal alerts.

use std::fmt::{self, Write as _};

use crate::{ConsoleHost, DialogHost, ScriptError};

/// Line terminator appended by [`Console::log`].
pub const LINE_END: &str = "\r\n";

/// Console view over a [`ConsoleHost`].
#[derive(Debug)]
pub struct Console<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: ConsoleHost + ?Sized> Console<'h, H> {
    /// Wraps a console host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Writes `text` verbatim.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn print(&mut self, text: &str) -> Result<(), ScriptError> {
        Ok(self.host.print(text)?)
    }

    /// Writes `args` joined by single spaces, then `"\r\n"`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn log(&mut self, args: &[&dyn fmt::Display]) -> Result<(), ScriptError> {
        self.print(&log_line(args))
    }

    /// Clears the console.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn clear(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.clear()?)
    }
}

/// Formats one `console.log` line.
#[must_use]
pub fn log_line(args: &[&dyn fmt::Display]) -> String {
    let mut line = String::new();
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        let _ = write!(line, "{arg}");
    }
    line.push_str(LINE_END);
    line
}

/// Shows a modal message box; `caption` defaults to empty.
///
/// # Errors
///
/// Returns the host failure unchanged.
pub fn alert<H: DialogHost + ?Sized>(
    host: &mut H,
    text: &str,
    caption: Option<&str>,
) -> Result<(), ScriptError> {
    Ok(host.message_box(text, caption.unwrap_or_default())?)
}

/// Reports a failed script step on the console as `error: <message>`.
///
/// # Errors
///
/// Returns the host failure if the console itself rejects the write.
pub fn report_error<H: ConsoleHost + ?Sized>(
    host: &mut H,
    error: &ScriptError,
) -> Result<(), ScriptError> {
    log::error!("script error: {error}");
    Console::new(host).log(&[&"error:", error])
}
