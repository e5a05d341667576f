//! Register file accessors.
//!
//! Numeric indices are forwarded to the host as-is; only symbolic names are
//! validated against the name table.

use crate::registers::names::{fpr_index, GprTarget};
use crate::{RegisterHost, ScriptError};

/// General-purpose register view (`gpr`).
#[derive(Debug)]
pub struct Gpr<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: RegisterHost + ?Sized> Gpr<'h, H> {
    /// Wraps a register host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Reads register `index`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn get(&mut self, index: u32) -> Result<u32, ScriptError> {
        Ok(self.host.gpr(index)?)
    }

    /// Writes register `index`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn set(&mut self, index: u32, value: u32) -> Result<(), ScriptError> {
        Ok(self.host.set_gpr(index, value)?)
    }

    /// Reads a register by name (`sp`, `ra`, ... or `pc`).
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownRegister`] for names outside the table,
    /// or the host failure.
    pub fn get_named(&mut self, name: &str) -> Result<u32, ScriptError> {
        match name.parse::<GprTarget>()? {
            GprTarget::Index(index) => self.get(index),
            GprTarget::Pc => self.pc(),
        }
    }

    /// Writes a register by name (`sp`, `ra`, ... or `pc`).
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownRegister`] for names outside the table,
    /// or the host failure.
    pub fn set_named(&mut self, name: &str, value: u32) -> Result<(), ScriptError> {
        match name.parse::<GprTarget>()? {
            GprTarget::Index(index) => self.set(index, value),
            GprTarget::Pc => self.set_pc(value),
        }
    }

    /// Reads the program counter.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn pc(&mut self) -> Result<u32, ScriptError> {
        Ok(self.host.pc()?)
    }

    /// Writes the program counter.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn set_pc(&mut self, value: u32) -> Result<(), ScriptError> {
        Ok(self.host.set_pc(value)?)
    }
}

/// Floating-point register view (`fpr`).
#[derive(Debug)]
pub struct Fpr<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: RegisterHost + ?Sized> Fpr<'h, H> {
    /// Wraps a register host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Reads register `index`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn get(&mut self, index: u32) -> Result<f32, ScriptError> {
        Ok(self.host.fpr(index)?)
    }

    /// Writes register `index`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn set(&mut self, index: u32, value: f32) -> Result<(), ScriptError> {
        Ok(self.host.set_fpr(index, value)?)
    }

    /// Reads a register by name (`f0`..`f31`).
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownRegister`] for names outside the table,
    /// or the host failure.
    pub fn get_named(&mut self, name: &str) -> Result<f32, ScriptError> {
        let index = resolve_fpr(name)?;
        self.get(index)
    }

    /// Writes a register by name (`f0`..`f31`).
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownRegister`] for names outside the table,
    /// or the host failure.
    pub fn set_named(&mut self, name: &str, value: f32) -> Result<(), ScriptError> {
        let index = resolve_fpr(name)?;
        self.set(index, value)
    }
}

fn resolve_fpr(name: &str) -> Result<u32, ScriptError> {
    fpr_index(name).ok_or_else(|| ScriptError::UnknownRegister(name.to_owned()))
}
