//! Wire protocol core: TLV records, DATA payloads, and frames.
//!
//! Data flows bottom-up on receive (bytes, frames, DATA, TLVs, typed
//! values) and top-down on send. Every layer here is pure; the serial
//! plumbing lives in [`crate::transport`].

mod data;
mod error;
mod frame;
mod metrics;
mod tlv;
mod types;

pub use data::{DataPacket, pack_value, unpack_value};
pub use error::{Error, Result};
pub use frame::{
    FRAME_HEAD, FRAME_OVERHEAD, FRAME_TAIL, FRAME_VER, FrameParser, MAX_DATA_LEN, RawFrame,
    checksum, encode_frame,
};
pub use metrics::LinkStats;
pub use tlv::{Tlv, decode_tlvs, encode_tlv};
pub use types::{ByteOrder, FLOAT_TOLERANCE, Msg, VariableType, VariableValue};

pub(crate) use metrics::Metrics;
