//! Length/checksum-delimited frame codec with stream resynchronization.
//!
//! # Wire Format
//!
//! ```text
//! [HEAD 0xAA] [LEN] [VER] [SEQ] [DATA (LEN-3)] [CHK] [TAIL 0x55]
//! ```
//!
//! `LEN = 3 + N` where `N` is the embedded DATA payload length, and
//! `CHK = (LEN + VER + SEQ + sum(DATA)) mod 256`. Total frame length is
//! `6 + N`, bounded `[6, 258]`.
//!
//! The streaming parser is fed arbitrary chunks and yields whole
//! validated frames. A failed candidate never discards the buffer:
//! scanning resumes one byte past the HEAD that started it, so one
//! corrupted byte cannot take out subsequent valid frames.

use bytes::{Buf, BytesMut};
use tracing::warn;

use super::error::{Error, Result};
use super::metrics::Metrics;

/// Frame sync byte.
pub const FRAME_HEAD: u8 = 0xAA;

/// Frame tail byte.
pub const FRAME_TAIL: u8 = 0x55;

/// Per-frame transport version, distinct from the DATA-header registry
/// stamp. Constant for now.
pub const FRAME_VER: u8 = 0x00;

/// Maximum DATA payload bytes a single frame can carry.
pub const MAX_DATA_LEN: usize = 252;

/// Bytes of framing around the DATA payload (HEAD, LEN, VER, SEQ, CHK, TAIL).
pub const FRAME_OVERHEAD: usize = 6;

/// Additive checksum over LEN, VER, SEQ, and the DATA bytes.
#[must_use]
pub fn checksum(len: u8, ver: u8, seq: u8, data: &[u8]) -> u8 {
    data.iter().fold(
        len.wrapping_add(ver).wrapping_add(seq),
        |acc, b| acc.wrapping_add(*b),
    )
}

/// Wrap a DATA payload in a frame with the given sequence number.
pub fn encode_frame(data: &[u8], seq: u8) -> Result<Vec<u8>> {
    if data.len() > MAX_DATA_LEN {
        return Err(Error::PayloadTooLarge {
            len: data.len(),
            max: MAX_DATA_LEN,
        });
    }
    let len = (3 + data.len()) as u8;
    let mut out = Vec::with_capacity(FRAME_OVERHEAD + data.len());
    out.push(FRAME_HEAD);
    out.push(len);
    out.push(FRAME_VER);
    out.push(seq);
    out.extend_from_slice(data);
    out.push(checksum(len, FRAME_VER, seq, data));
    out.push(FRAME_TAIL);
    Ok(out)
}

/// One validated frame lifted off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The complete frame as it appeared on the wire.
    pub bytes: Vec<u8>,
    /// Per-frame transport version byte.
    pub ver: u8,
    /// Sender-assigned rolling sequence number. Diagnostics only; the
    /// receiver does not enforce ordering from it.
    pub seq: u8,
    /// Embedded DATA payload.
    pub data: Vec<u8>,
}

/// Incremental frame parser over an append-only byte buffer.
///
/// Feed chunks with [`push`](Self::push) and drain validated frames
/// with [`next_frame`](Self::next_frame). Partial frames survive
/// between calls, so arbitrarily small reads converge to the same
/// output as one large read.
#[derive(Debug, Default)]
pub struct FrameParser {
    buf: BytesMut,
}

impl FrameParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(1024),
        }
    }

    /// Append received bytes to the reassembly buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        Metrics::record_bytes_in(chunk.len());
    }

    /// Bytes currently buffered (garbage, partial, or unconsumed frames).
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next validated frame, if one is complete.
    ///
    /// Corrupt candidates are dropped here, counted, and logged; they
    /// never surface as errors.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        loop {
            // Seeking: discard everything before the next HEAD byte.
            match self.buf.iter().position(|b| *b == FRAME_HEAD) {
                Some(0) => {}
                Some(pos) => self.buf.advance(pos),
                None => {
                    self.buf.clear();
                    return None;
                }
            }

            // HaveHead: need LEN to know the candidate extent.
            if self.buf.len() < 2 {
                return None;
            }
            let len = self.buf[1];
            if len < 3 {
                warn!(len, "rejecting frame candidate: {}", Error::FrameLengthOutOfRange { len });
                Metrics::record_length_reject();
                self.resync();
                continue;
            }

            // Buffering: VER + SEQ + DATA + CHK + TAIL, extent known.
            let total = len as usize + 3;
            if self.buf.len() < total {
                return None;
            }

            match validate(&self.buf[..total]) {
                Ok(()) => {
                    let bytes = self.buf.split_to(total).to_vec();
                    let data = bytes[4..total - 2].to_vec();
                    Metrics::record_frame_decoded();
                    return Some(RawFrame {
                        ver: bytes[2],
                        seq: bytes[3],
                        bytes,
                        data,
                    });
                }
                Err(err) => {
                    warn!("dropping corrupt frame candidate: {err}");
                    match err {
                        Error::FrameTailMismatch { .. } => Metrics::record_tail_failure(),
                        _ => Metrics::record_checksum_failure(),
                    }
                    self.resync();
                }
            }
        }
    }

    /// Resume the HEAD search one byte past the failed candidate's HEAD.
    fn resync(&mut self) {
        self.buf.advance(1);
        Metrics::record_resync();
    }
}

/// Validate a complete candidate slice starting at HEAD.
fn validate(candidate: &[u8]) -> Result<()> {
    let total = candidate.len();
    let tail = candidate[total - 1];
    if tail != FRAME_TAIL {
        return Err(Error::FrameTailMismatch { found: tail });
    }
    let expected = checksum(
        candidate[1],
        candidate[2],
        candidate[3],
        &candidate[4..total - 2],
    );
    let found = candidate[total - 2];
    if expected != found {
        return Err(Error::FrameChecksumMismatch { expected, found });
    }
    Ok(())
}
