//! Codec error types shared by the TLV, DATA, and frame layers.

use thiserror::Error;

/// Wire codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fewer than two bytes remained where a TLV header was expected.
    #[error("truncated TLV header: {remaining} byte(s) left, need 2")]
    TlvTruncatedHeader {
        /// Bytes remaining in the buffer.
        remaining: usize,
    },

    /// A TLV declared more value bytes than the buffer holds.
    #[error("truncated TLV value: declared {declared} bytes, only {remaining} left")]
    TlvTruncatedValue {
        /// Length declared by the TLV header.
        declared: usize,
        /// Bytes remaining after the header.
        remaining: usize,
    },

    /// A TLV value exceeds the 255-byte length field.
    #[error("TLV value too long: {len} bytes (max 255)")]
    TlvValueTooLong {
        /// Length of the offending value.
        len: usize,
    },

    /// A DATA payload is shorter than its two-byte header.
    #[error("DATA payload too short: {len} byte(s), need at least 2")]
    DataTooShort {
        /// Length of the buffer.
        len: usize,
    },

    /// A value's shape does not match the variable's declared wire type.
    #[error("type mismatch for {vtype}: {detail}")]
    TypeMismatch {
        /// Declared wire type of the variable.
        vtype: super::VariableType,
        /// What went wrong.
        detail: &'static str,
    },

    /// Frame LEN byte below the three-byte minimum.
    #[error("frame length out of range: LEN={len}")]
    FrameLengthOutOfRange {
        /// Rejected LEN byte.
        len: u8,
    },

    /// Recomputed frame checksum differs from the CHK byte on the wire.
    #[error("frame checksum mismatch: expected {expected:#04x}, got {found:#04x}")]
    FrameChecksumMismatch {
        /// Checksum recomputed from the candidate frame.
        expected: u8,
        /// Checksum byte carried on the wire.
        found: u8,
    },

    /// Byte in the TAIL position is not `0x55`.
    #[error("frame tail mismatch: got {found:#04x}, expected 0x55")]
    FrameTailMismatch {
        /// Byte found in the TAIL position.
        found: u8,
    },

    /// DATA payload exceeds what a single frame can carry.
    #[error("DATA payload too large for one frame: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
