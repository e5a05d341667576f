//! Typed accessors over host main memory and ROM.
//!
//! Every `get`/`set` is exactly one host call; nothing is cached or bounds
//! checked here. ROM integer accessors are read-only while ROM float/double
//! accessors accept writes, matching the host's capabilities.

use std::marker::PhantomData;

use crate::{
    Encoding, FloatScalar, MemoryHost, MemorySpace, PrimitiveType, Scalar, ScriptError, Value,
};

/// Reads one value of `ty` at `address` with a single host call.
///
/// # Errors
///
/// Propagates host failures.
pub fn read_value<H: MemoryHost + ?Sized>(
    host: &mut H,
    space: MemorySpace,
    address: u32,
    ty: PrimitiveType,
) -> Result<Value, ScriptError> {
    let value = match ty.encoding() {
        Encoding::Int { bits, signed } => Value::Int(host.read_int(space, address, bits, signed)?),
        Encoding::Float { double } => Value::Float(host.read_float(space, address, double)?),
    };
    Ok(value)
}

/// Writes one value of `ty` at `address` with a single host call.
///
/// # Errors
///
/// Propagates host failures.
pub fn write_value<H: MemoryHost + ?Sized>(
    host: &mut H,
    space: MemorySpace,
    address: u32,
    ty: PrimitiveType,
    value: Value,
) -> Result<(), ScriptError> {
    match ty.encoding() {
        Encoding::Int { bits, .. } => host.write_int(space, address, bits, value.as_i64())?,
        Encoding::Float { double } => {
            host.write_float(space, address, value.as_f64(), double)?;
        }
    }
    Ok(())
}

/// Main memory view (`mem`).
#[derive(Debug)]
pub struct Memory<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: MemoryHost + ?Sized> Memory<'h, H> {
    /// Wraps a memory host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Statically typed accessor for `T`.
    pub fn typed<T: Scalar>(&mut self) -> Accessor<'_, H, T> {
        Accessor {
            host: &mut *self.host,
            _ty: PhantomData,
        }
    }

    /// `mem.u8`
    pub fn u8(&mut self) -> Accessor<'_, H, u8> {
        self.typed()
    }

    /// `mem.u16`
    pub fn u16(&mut self) -> Accessor<'_, H, u16> {
        self.typed()
    }

    /// `mem.u32`
    pub fn u32(&mut self) -> Accessor<'_, H, u32> {
        self.typed()
    }

    /// `mem.s8`
    pub fn s8(&mut self) -> Accessor<'_, H, i8> {
        self.typed()
    }

    /// `mem.s16`
    pub fn s16(&mut self) -> Accessor<'_, H, i16> {
        self.typed()
    }

    /// `mem.s32`
    pub fn s32(&mut self) -> Accessor<'_, H, i32> {
        self.typed()
    }

    /// `mem.float`
    pub fn float(&mut self) -> Accessor<'_, H, f32> {
        self.typed()
    }

    /// `mem.double`
    pub fn double(&mut self) -> Accessor<'_, H, f64> {
        self.typed()
    }

    /// Dynamically typed read.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn read(&mut self, ty: PrimitiveType, address: u32) -> Result<Value, ScriptError> {
        read_value(&mut *self.host, MemorySpace::Main, address, ty)
    }

    /// Dynamically typed write.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn write(
        &mut self,
        ty: PrimitiveType,
        address: u32,
        value: impl Into<Value>,
    ) -> Result<(), ScriptError> {
        write_value(&mut *self.host, MemorySpace::Main, address, ty, value.into())
    }

    /// Reads `size` raw bytes.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn getblock(&mut self, address: u32, size: usize) -> Result<Vec<u8>, ScriptError> {
        Ok(self.host.read_block(MemorySpace::Main, address, size)?)
    }

    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn setblock(&mut self, address: u32, data: &[u8]) -> Result<(), ScriptError> {
        Ok(self.host.write_block(MemorySpace::Main, address, data)?)
    }

    /// Reads a null-terminated string.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn getstring(&mut self, address: u32) -> Result<String, ScriptError> {
        Ok(self.host.read_string(MemorySpace::Main, address)?)
    }

    /// Writes a null-terminated string.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn setstring(&mut self, address: u32, text: &str) -> Result<(), ScriptError> {
        Ok(self.host.write_string(MemorySpace::Main, address, text)?)
    }
}

/// Read/write accessor for one primitive type in main memory.
#[derive(Debug)]
pub struct Accessor<'h, H: ?Sized, T> {
    host: &'h mut H,
    _ty: PhantomData<T>,
}

impl<H: MemoryHost + ?Sized, T: Scalar> Accessor<'_, H, T> {
    /// Reads the value at `address`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn get(&mut self, address: u32) -> Result<T, ScriptError> {
        read_value(&mut *self.host, MemorySpace::Main, address, T::TYPE).map(T::from_value)
    }

    /// Writes `value` at `address`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn set(&mut self, address: u32, value: T) -> Result<(), ScriptError> {
        write_value(&mut *self.host, MemorySpace::Main, address, T::TYPE, value.into())
    }
}

/// Cartridge ROM view (`rom`).
#[derive(Debug)]
pub struct Rom<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: MemoryHost + ?Sized> Rom<'h, H> {
    /// Wraps a memory host.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Statically typed accessor for `T`.
    pub fn typed<T: Scalar>(&mut self) -> RomAccessor<'_, H, T> {
        RomAccessor {
            host: &mut *self.host,
            _ty: PhantomData,
        }
    }

    /// `rom.u8`
    pub fn u8(&mut self) -> RomAccessor<'_, H, u8> {
        self.typed()
    }

    /// `rom.u16`
    pub fn u16(&mut self) -> RomAccessor<'_, H, u16> {
        self.typed()
    }

    /// `rom.u32`
    pub fn u32(&mut self) -> RomAccessor<'_, H, u32> {
        self.typed()
    }

    /// `rom.s8`
    pub fn s8(&mut self) -> RomAccessor<'_, H, i8> {
        self.typed()
    }

    /// `rom.s16`
    pub fn s16(&mut self) -> RomAccessor<'_, H, i16> {
        self.typed()
    }

    /// `rom.s32`
    pub fn s32(&mut self) -> RomAccessor<'_, H, i32> {
        self.typed()
    }

    /// `rom.float`
    pub fn float(&mut self) -> RomAccessor<'_, H, f32> {
        self.typed()
    }

    /// `rom.double`
    pub fn double(&mut self) -> RomAccessor<'_, H, f64> {
        self.typed()
    }

    /// Dynamically typed read.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn read(&mut self, ty: PrimitiveType, address: u32) -> Result<Value, ScriptError> {
        read_value(&mut *self.host, MemorySpace::Rom, address, ty)
    }

    /// Reads `size` raw bytes.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn getblock(&mut self, address: u32, size: usize) -> Result<Vec<u8>, ScriptError> {
        Ok(self.host.read_block(MemorySpace::Rom, address, size)?)
    }

    /// Reads a null-terminated string.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn getstring(&mut self, address: u32) -> Result<String, ScriptError> {
        Ok(self.host.read_string(MemorySpace::Rom, address)?)
    }
}

/// Accessor for one primitive type in ROM. Only float types can be written.
#[derive(Debug)]
pub struct RomAccessor<'h, H: ?Sized, T> {
    host: &'h mut H,
    _ty: PhantomData<T>,
}

impl<H: MemoryHost + ?Sized, T: Scalar> RomAccessor<'_, H, T> {
    /// Reads the value at `address`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn get(&mut self, address: u32) -> Result<T, ScriptError> {
        read_value(&mut *self.host, MemorySpace::Rom, address, T::TYPE).map(T::from_value)
    }
}

impl<H: MemoryHost + ?Sized, T: FloatScalar> RomAccessor<'_, H, T> {
    /// Writes `value` at `address`.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub fn set(&mut self, address: u32, value: T) -> Result<(), ScriptError> {
        write_value(&mut *self.host, MemorySpace::Rom, address, T::TYPE, value.into())
    }
}
