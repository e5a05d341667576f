//! Primitive type registry and the numeric value model shared by accessors.

use std::fmt;
use std::str::FromStr;

use crate::ScriptError;

/// Primitive field/accessor type understood by the host memory primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum PrimitiveType {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 8-bit integer.
    S8,
    /// Signed 16-bit integer.
    S16,
    /// Signed 32-bit integer.
    S32,
    /// IEEE-754 single precision.
    Float,
    /// IEEE-754 double precision.
    Double,
}

/// How a primitive type is marshalled to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Integer access parameterised by bit width and signedness.
    Int {
        /// Access width in bits (8, 16 or 32).
        bits: u32,
        /// Sign-extend on read.
        signed: bool,
    },
    /// Floating point access, single or double precision.
    Float {
        /// `true` for 8-byte doubles.
        double: bool,
    },
}

impl PrimitiveType {
    /// Every registered primitive type, in tag order.
    pub const ALL: [Self; 8] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::S8,
        Self::S16,
        Self::S32,
        Self::Float,
        Self::Double,
    ];

    /// Size of one value in bytes.
    #[must_use]
    pub const fn byte_width(self) -> u32 {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 => 2,
            Self::U32 | Self::S32 | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Size of one value in bits.
    #[must_use]
    pub const fn bit_width(self) -> u32 {
        self.byte_width() * 8
    }

    /// `true` for the signed integer types.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::S8 | Self::S16 | Self::S32)
    }

    /// `true` for `float` and `double`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Host call parameters implied by this type.
    #[must_use]
    pub const fn encoding(self) -> Encoding {
        match self {
            Self::Float => Encoding::Float { double: false },
            Self::Double => Encoding::Float { double: true },
            _ => Encoding::Int {
                bits: self.bit_width(),
                signed: self.is_signed(),
            },
        }
    }

    /// Script-facing type tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Looks up a type by its script tag.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnrecognizedType`] for tags outside the registry.
    pub fn from_tag(tag: &str) -> Result<Self, ScriptError> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.tag() == tag)
            .ok_or_else(|| ScriptError::UnrecognizedType(tag.to_owned()))
    }
}

impl FromStr for PrimitiveType {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Decoded numeric value exchanged with the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Integer payload; wide enough for every integer primitive.
    Int(i64),
    /// Floating point payload.
    Float(f64),
}

impl Value {
    /// Integer view; floats truncate toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Int(value) => value,
            Self::Float(value) => value as i64,
        }
    }

    /// Floating point view.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(<$wide>::from(value))
                }
            }
        )+
    };
}

value_from!(Int, i64: u8, u16, u32, i8, i16, i32, i64);
value_from!(Float, f64: f32, f64);

mod sealed {
    pub trait Sealed {}
}

/// Rust primitive bound 1:1 to a [`PrimitiveType`], used by statically typed
/// accessors such as `mem.u32()`.
pub trait Scalar: sealed::Sealed + Copy + fmt::Debug + PartialEq + Into<Value> {
    /// Registry entry for this Rust type.
    const TYPE: PrimitiveType;

    /// Narrows a host value to this type (two's complement wrap for
    /// integers, IEEE rounding for floats).
    fn from_value(value: Value) -> Self;
}

/// Marker for scalars the ROM space accepts writes for.
pub trait FloatScalar: Scalar {}

macro_rules! int_scalar {
    ($($ty:ty => $prim:ident),+ $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                const TYPE: PrimitiveType = PrimitiveType::$prim;

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                fn from_value(value: Value) -> Self {
                    value.as_i64() as Self
                }
            }
        )+
    };
}

int_scalar!(u8 => U8, u16 => U16, u32 => U32, i8 => S8, i16 => S16, i32 => S32);

impl sealed::Sealed for f32 {}
impl sealed::Sealed for f64 {}

impl Scalar for f32 {
    const TYPE: PrimitiveType = PrimitiveType::Float;

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Self {
        value.as_f64() as Self
    }
}

impl Scalar for f64 {
    const TYPE: PrimitiveType = PrimitiveType::Double;

    fn from_value(value: Value) -> Self {
        value.as_f64()
    }
}

impl FloatScalar for f32 {}
impl FloatScalar for f64 {}
