//! Register name table and register file accessors.

/// Typed GPR/FPR views over a register host.
pub mod access;
/// Symbolic register name table.
pub mod names;

pub use access::{Fpr, Gpr};
pub use names::{fpr_index, gpr_index, GprTarget, FPR_NAMES, GPR_NAMES, REGISTER_COUNT};
