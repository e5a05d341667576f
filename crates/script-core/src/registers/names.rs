//! Symbolic register names and their host register numbers.

use std::str::FromStr;

use crate::ScriptError;

/// Number of architecturally visible registers in each register file.
pub const REGISTER_COUNT: usize = 32;

/// General-purpose register names in index order (`r0` is the zero register).
pub const GPR_NAMES: [&str; REGISTER_COUNT] = [
    "r0", "at", "v0", "v1", "a0", "a1", "a2", "a3", //
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", //
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", //
    "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
];

/// Floating-point register names in index order.
pub const FPR_NAMES: [&str; REGISTER_COUNT] = [
    "f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", //
    "f8", "f9", "f10", "f11", "f12", "f13", "f14", "f15", //
    "f16", "f17", "f18", "f19", "f20", "f21", "f22", "f23", //
    "f24", "f25", "f26", "f27", "f28", "f29", "f30", "f31",
];

/// Resolves a general-purpose register name to its index.
#[must_use]
pub fn gpr_index(name: &str) -> Option<u32> {
    position(&GPR_NAMES, name)
}

/// Resolves a floating-point register name to its index.
#[must_use]
pub fn fpr_index(name: &str) -> Option<u32> {
    position(&FPR_NAMES, name)
}

fn position(table: &[&str; REGISTER_COUNT], name: &str) -> Option<u32> {
    table
        .iter()
        .zip(0_u32..)
        .find_map(|(candidate, index)| (*candidate == name).then_some(index))
}

/// Target of a named general-purpose register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GprTarget {
    /// Indexed register `0..=31`.
    Index(u32),
    /// Program counter.
    Pc,
}

impl FromStr for GprTarget {
    type Err = ScriptError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name == "pc" {
            return Ok(Self::Pc);
        }
        gpr_index(name)
            .map(Self::Index)
            .ok_or_else(|| ScriptError::UnknownRegister(name.to_owned()))
    }
}
