//! Main memory and ROM accessors plus the struct binding engine.

/// Typed per-space accessors (`mem.u32`, `rom.float`, ...).
pub mod access;
/// Named live properties (`bindvar`, `bindvars`, `bindstruct`).
pub mod bind;
/// Struct layouts and reusable struct types (`typedef`).
pub mod layout;

pub use access::{read_value, write_value, Accessor, Memory, Rom, RomAccessor};
pub use bind::{bindstruct, bindvar, bindvars, BoundObject, VarBinding};
pub use layout::{typedef, FieldDescriptor, LayoutField, StructLayout, StructType};
