//! Emulator lifecycle (`system`) and debugger (`debug`) controls.

use crate::{DebugHost, RegisterHost, ScriptError, SystemHost};

/// Lifecycle controls. Every call is forwarded to the host as-is.
#[derive(Debug)]
pub struct System<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: SystemHost + ?Sized> System<'h, H> {
    /// Wraps a system host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Pauses emulation.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn pause(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.pause()?)
    }

    /// Resumes emulation.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn resume(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.resume()?)
    }

    /// Soft reset.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn reset(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.reset()?)
    }

    /// Hard reset.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn hardreset(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.hard_reset()?)
    }

    /// Saves to the current slot.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn savestate(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.save_state()?)
    }

    /// Loads from the current slot.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn loadstate(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.load_state()?)
    }

    /// Current save slot.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn saveslot(&mut self) -> Result<u32, ScriptError> {
        Ok(self.host.save_slot()?)
    }

    /// Selects the save slot.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn set_saveslot(&mut self, slot: u32) -> Result<(), ScriptError> {
        Ok(self.host.set_save_slot(slot)?)
    }

    /// Captures a screenshot.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn generatebitmap(&mut self) -> Result<(), ScriptError> {
        Ok(self.host.generate_bitmap()?)
    }
}

/// Debugger window controls.
#[derive(Debug)]
pub struct Debugger<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: DebugHost + ?Sized> Debugger<'h, H> {
    /// Wraps a debug host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Opens the memory viewer at `address`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn showmemory(&mut self, address: u32) -> Result<(), ScriptError> {
        Ok(self.host.show_memory(address)?)
    }

    /// Opens the commands view at `address`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn showcommands(&mut self, address: u32) -> Result<(), ScriptError> {
        Ok(self.host.show_commands(address)?)
    }
}

impl<H: DebugHost + RegisterHost + SystemHost + ?Sized> Debugger<'_, H> {
    /// Shows the disassembly at the current `pc`, then pauses.
    ///
    /// # Errors
    ///
    /// Returns the first host failure; later calls are skipped.
    pub fn breakhere(&mut self) -> Result<(), ScriptError> {
        let pc = self.host.pc()?;
        self.host.show_commands(pc)?;
        self.host.pause()?;
        log::debug!("breakhere at {pc:#010X}");
        Ok(())
    }
}
