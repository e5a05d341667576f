//! Uppercase hexadecimal formatting of 32-bit values.

use crate::DEFAULT_HEX_DIGITS;

/// Values formatted as their unsigned 32-bit pattern.
pub trait ToHex: Copy {
    /// The 32-bit pattern to format.
    fn hex_bits(self) -> u32;
}

impl ToHex for u32 {
    fn hex_bits(self) -> u32 {
        self
    }
}

impl ToHex for i32 {
    #[allow(clippy::cast_sign_loss)]
    fn hex_bits(self) -> u32 {
        self as u32
    }
}

impl ToHex for u16 {
    fn hex_bits(self) -> u32 {
        u32::from(self)
    }
}

impl ToHex for u8 {
    fn hex_bits(self) -> u32 {
        u32::from(self)
    }
}

/// Formats `value` as at least eight uppercase, zero-padded digits.
#[must_use]
pub fn hex(value: impl ToHex) -> String {
    hex_width(value, DEFAULT_HEX_DIGITS)
}

/// Formats `value` padded to at least `digits`; `0` selects the default
/// width. Longer values are never truncated.
#[must_use]
pub fn hex_width(value: impl ToHex, digits: usize) -> String {
    let width = if digits == 0 { DEFAULT_HEX_DIGITS } else { digits };
    format!("{:0width$X}", value.hex_bits())
}
