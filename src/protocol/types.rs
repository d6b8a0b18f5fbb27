//! Message roles, wire types, and the tagged value variant.

use std::fmt;

/// Absolute tolerance for floating-point ack comparison.
pub const FLOAT_TOLERANCE: f32 = 1e-6;

/// Message role carried in the first byte of every DATA payload.
///
/// Unknown role bytes are preserved as [`Msg::Other`] rather than
/// rejected, so an old host keeps decoding traffic from newer firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Msg {
    /// Command from the supervisory computer to the microcontroller.
    PcToMcu,
    /// Telemetry or acknowledgement from the microcontroller.
    McuToPc,
    /// Role byte unknown to this build, passed through untouched.
    Other(u8),
}

impl Msg {
    /// Convert from the wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::PcToMcu,
            0x02 => Self::McuToPc,
            other => Self::Other(other),
        }
    }

    /// Convert to the wire byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::PcToMcu => 0x01,
            Self::McuToPc => 0x02,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PcToMcu => write!(f, "PcToMcu"),
            Self::McuToPc => write!(f, "McuToPc"),
            Self::Other(raw) => write!(f, "Other({raw:#04x})"),
        }
    }
}

/// Endianness of a fixed-width wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// Wire type of a registered variable.
///
/// Fixed types occupy 1, 2, or 4 bytes; variable types have no fixed
/// size and are delimited by the TLV length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Boolean, one byte, zero = false.
    Bool,
    /// Single opaque byte.
    Byte,
    /// Unsigned 16-bit, little-endian.
    U16Le,
    /// Signed 16-bit, little-endian.
    I16Le,
    /// Unsigned 16-bit, big-endian.
    U16Be,
    /// Signed 16-bit, big-endian.
    I16Be,
    /// Unsigned 32-bit, little-endian.
    U32Le,
    /// Signed 32-bit, little-endian.
    I32Le,
    /// Unsigned 32-bit, big-endian.
    U32Be,
    /// Signed 32-bit, big-endian.
    I32Be,
    /// IEEE-754 single float, little-endian.
    F32Le,
    /// IEEE-754 single float, big-endian.
    F32Be,
    /// Raw bytes, length-delimited by the TLV.
    Bytes,
    /// UTF-8 text, length-delimited by the TLV.
    Str,
}

impl VariableType {
    /// Size in bytes for fixed-width types, `None` for length-delimited ones.
    #[must_use]
    pub const fn fixed_size(self) -> Option<u8> {
        match self {
            Self::U8 | Self::I8 | Self::Bool | Self::Byte => Some(1),
            Self::U16Le | Self::I16Le | Self::U16Be | Self::I16Be => Some(2),
            Self::U32Le | Self::I32Le | Self::U32Be | Self::I32Be | Self::F32Le | Self::F32Be => {
                Some(4)
            }
            Self::Bytes | Self::Str => None,
        }
    }

    /// Byte order of multi-byte fixed types; single-byte and
    /// length-delimited types report little-endian by convention.
    #[must_use]
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            Self::U16Be | Self::I16Be | Self::U32Be | Self::I32Be | Self::F32Be => ByteOrder::Big,
            _ => ByteOrder::Little,
        }
    }

    /// Whether this type carries an IEEE-754 float.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32Le | Self::F32Be)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::U16Le => "u16le",
            Self::I16Le => "i16le",
            Self::U16Be => "u16be",
            Self::I16Be => "i16be",
            Self::U32Le => "u32le",
            Self::I32Le => "i32le",
            Self::U32Be => "u32be",
            Self::I32Be => "i32be",
            Self::F32Le => "f32le",
            Self::F32Be => "f32be",
            Self::Bytes => "bytes",
            Self::Str => "str",
        };
        write!(f, "{name}")
    }
}

/// Tagged runtime value for a registered variable.
///
/// The variant is selected by the variable's declared [`VariableType`];
/// conversions to and from wire bytes live in the DATA codec and are
/// explicit, fallible operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableValue {
    /// Integer value for the fixed integer types.
    Int(u32),
    /// Boolean value.
    Bool(bool),
    /// Float value for the f32 types.
    Float(f32),
    /// Raw bytes for length-delimited types.
    Bytes(Vec<u8>),
}

impl VariableValue {
    /// Equality with a `1e-6` absolute tolerance on floats; all other
    /// variants compare exactly. Mismatched variants are never equal.
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => (a - b).abs() <= FLOAT_TOLERANCE,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "{} byte(s)", v.len()),
        }
    }
}

impl From<u32> for VariableValue {
    fn from(value: u32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for VariableValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<u8>> for VariableValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_roundtrip() {
        for byte in [0x01, 0x02, 0x7F, 0xFF] {
            assert_eq!(Msg::from_u8(byte).as_u8(), byte);
        }
        assert_eq!(Msg::from_u8(0x01), Msg::PcToMcu);
        assert_eq!(Msg::from_u8(0x02), Msg::McuToPc);
        assert_eq!(Msg::from_u8(0x99), Msg::Other(0x99));
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(VariableType::U8.fixed_size(), Some(1));
        assert_eq!(VariableType::I16Be.fixed_size(), Some(2));
        assert_eq!(VariableType::F32Le.fixed_size(), Some(4));
        assert_eq!(VariableType::Bytes.fixed_size(), None);
        assert_eq!(VariableType::Str.fixed_size(), None);
    }

    #[test]
    fn test_float_tolerance() {
        let a = VariableValue::Float(1.0);
        let b = VariableValue::Float(1.0 + 5e-7);
        let c = VariableValue::Float(1.01);
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&c));
    }

    #[test]
    fn test_variant_mismatch_never_equal() {
        assert!(!VariableValue::Int(1).approx_eq(&VariableValue::Bool(true)));
        assert!(!VariableValue::Int(0).approx_eq(&VariableValue::Float(0.0)));
    }
}
