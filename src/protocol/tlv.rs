//! Type-Length-Value record codec.
//!
//! A TLV is a 1-byte type code, a 1-byte length, and that many value
//! bytes. Type codes are not validated here: a code minted by a newer
//! variable registry must pass through an older decoder untouched, so
//! the decoder surfaces every type byte as a raw `u8` and leaves
//! registry resolution to the caller.

use super::error::{Error, Result};

/// One Type-Length-Value record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tlv {
    /// Wire type code (a variable ID, or an unknown byte).
    pub ty: u8,
    /// Value bytes, at most 255.
    pub value: Vec<u8>,
}

impl Tlv {
    /// Create a record, rejecting values longer than the length field holds.
    pub fn new(ty: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        if value.len() > 255 {
            return Err(Error::TlvValueTooLong { len: value.len() });
        }
        Ok(Self { ty, value })
    }

    /// Encoded size on the wire: header plus value.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        2 + self.value.len()
    }

    /// Append `[type, len] ++ value` to the output buffer.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.ty);
        out.push(self.value.len() as u8);
        out.extend_from_slice(&self.value);
    }
}

/// Encode a single TLV record to bytes.
pub fn encode_tlv(ty: u8, value: &[u8]) -> Result<Vec<u8>> {
    if value.len() > 255 {
        return Err(Error::TlvValueTooLong { len: value.len() });
    }
    let mut out = Vec::with_capacity(2 + value.len());
    out.push(ty);
    out.push(value.len() as u8);
    out.extend_from_slice(value);
    Ok(out)
}

/// Decode a buffer of back-to-back TLV records.
///
/// Scans sequentially; duplicates of the same type are legal and are
/// all delivered, in wire order.
pub fn decode_tlvs(buffer: &[u8]) -> Result<Vec<Tlv>> {
    let mut tlvs = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let remaining = buffer.len() - offset;
        if remaining < 2 {
            return Err(Error::TlvTruncatedHeader { remaining });
        }
        let ty = buffer[offset];
        let declared = buffer[offset + 1] as usize;
        offset += 2;
        if buffer.len() - offset < declared {
            return Err(Error::TlvTruncatedValue {
                declared,
                remaining: buffer.len() - offset,
            });
        }
        tlvs.push(Tlv {
            ty,
            value: buffer[offset..offset + declared].to_vec(),
        });
        offset += declared;
    }
    Ok(tlvs)
}
