//! DATA payload codec: message role, protocol version, TLV sequence.
//!
//! The DATA layer is transport-agnostic. Its two-byte header carries
//! the message role and the short registry build stamp; whatever
//! follows is a back-to-back TLV sequence in insertion order.

use super::error::{Error, Result};
use super::tlv::{Tlv, decode_tlvs};
use super::types::{ByteOrder, Msg, VariableType, VariableValue};

/// One decoded DATA payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPacket {
    /// Message role byte.
    pub msg: Msg,
    /// Short protocol version from the sender's registry build.
    pub ver: u8,
    /// Records in wire order; duplicate types are legal.
    pub tlvs: Vec<Tlv>,
}

impl DataPacket {
    /// Create an empty packet with the given role and version.
    #[must_use]
    pub const fn new(msg: Msg, ver: u8) -> Self {
        Self {
            msg,
            ver,
            tlvs: Vec::new(),
        }
    }

    /// Append a record.
    pub fn push(&mut self, tlv: Tlv) {
        self.tlvs.push(tlv);
    }

    /// Append a typed variable value, packing it per its wire type.
    pub fn push_value(&mut self, id: u8, vtype: VariableType, value: &VariableValue) -> Result<()> {
        let bytes = pack_value(vtype, value)?;
        self.tlvs.push(Tlv::new(id, bytes)?);
        Ok(())
    }

    /// First record matching the given type code, if any.
    #[must_use]
    pub fn find(&self, ty: u8) -> Option<&Tlv> {
        self.tlvs.iter().find(|tlv| tlv.ty == ty)
    }

    /// Encode to bytes: `[msg, ver]` followed by the TLV sequence.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let body: usize = self.tlvs.iter().map(Tlv::encoded_len).sum();
        let mut out = Vec::with_capacity(2 + body);
        out.push(self.msg.as_u8());
        out.push(self.ver);
        for tlv in &self.tlvs {
            tlv.encode_into(&mut out);
        }
        out
    }

    /// Decode from bytes.
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 2 {
            return Err(Error::DataTooShort { len: buffer.len() });
        }
        Ok(Self {
            msg: Msg::from_u8(buffer[0]),
            ver: buffer[1],
            tlvs: decode_tlvs(&buffer[2..])?,
        })
    }
}

/// Pack a typed value into the wire bytes for its declared type.
///
/// Fixed-width integers accept [`VariableValue::Int`] (which must fit
/// the declared width) or raw bytes of exactly that width; floats
/// accept [`VariableValue::Float`] or four raw bytes; length-delimited
/// types accept raw bytes only. Anything else is a `TypeMismatch`.
pub fn pack_value(vtype: VariableType, value: &VariableValue) -> Result<Vec<u8>> {
    let mismatch = |detail| Error::TypeMismatch { vtype, detail };

    match vtype.fixed_size() {
        None => match value {
            VariableValue::Bytes(bytes) => {
                if bytes.len() > 255 {
                    return Err(Error::TlvValueTooLong { len: bytes.len() });
                }
                Ok(bytes.clone())
            }
            _ => Err(mismatch("length-delimited type requires raw bytes")),
        },
        Some(size) => {
            let size = size as usize;
            if let VariableValue::Bytes(bytes) = value {
                if bytes.len() != size {
                    return Err(mismatch("raw bytes do not match declared width"));
                }
                return Ok(bytes.clone());
            }
            if vtype.is_float() {
                let VariableValue::Float(v) = value else {
                    return Err(mismatch("float type requires a float value"));
                };
                return Ok(match vtype.byte_order() {
                    ByteOrder::Little => v.to_le_bytes().to_vec(),
                    ByteOrder::Big => v.to_be_bytes().to_vec(),
                });
            }
            let raw = match (vtype, value) {
                (VariableType::Bool, VariableValue::Bool(b)) => u32::from(*b),
                (VariableType::Bool, _) => {
                    return Err(mismatch("bool type requires a bool value"));
                }
                (_, VariableValue::Int(v)) => *v,
                _ => return Err(mismatch("integer type requires an integer value")),
            };
            if size < 4 && raw >= 1u32 << (8 * size) {
                return Err(mismatch("integer does not fit declared width"));
            }
            let le = raw.to_le_bytes();
            Ok(match vtype.byte_order() {
                ByteOrder::Little => le[..size].to_vec(),
                ByteOrder::Big => {
                    let mut out = le[..size].to_vec();
                    out.reverse();
                    out
                }
            })
        }
    }
}

/// Interpret wire bytes as a typed value for the declared type.
///
/// Fixed-width types must match their declared size exactly; integers
/// come back as unsigned values of that width, floats as `f32`, and
/// length-delimited types as raw bytes.
pub fn unpack_value(vtype: VariableType, bytes: &[u8]) -> Result<VariableValue> {
    let mismatch = |detail| Error::TypeMismatch { vtype, detail };

    let Some(size) = vtype.fixed_size() else {
        return Ok(VariableValue::Bytes(bytes.to_vec()));
    };
    let size = size as usize;
    if bytes.len() != size {
        return Err(mismatch("wire bytes do not match declared width"));
    }
    if vtype.is_float() {
        let raw: [u8; 4] = bytes.try_into().map_err(|_| mismatch("bad float width"))?;
        let v = match vtype.byte_order() {
            ByteOrder::Little => f32::from_le_bytes(raw),
            ByteOrder::Big => f32::from_be_bytes(raw),
        };
        return Ok(VariableValue::Float(v));
    }
    if vtype == VariableType::Bool {
        return Ok(VariableValue::Bool(bytes[0] != 0));
    }
    let mut le = [0u8; 4];
    match vtype.byte_order() {
        ByteOrder::Little => le[..size].copy_from_slice(bytes),
        ByteOrder::Big => {
            for (i, b) in bytes.iter().rev().enumerate() {
                le[i] = *b;
            }
        }
    }
    Ok(VariableValue::Int(u32::from_le_bytes(le)))
}
