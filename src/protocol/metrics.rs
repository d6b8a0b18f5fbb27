//! Link diagnostic counters.
//!
//! A corrupted frame is silent at the protocol layer; these counters
//! are the only place it shows up, alongside the operator log.

use std::sync::atomic::{AtomicU64, Ordering};

static BYTES_IN: AtomicU64 = AtomicU64::new(0);
static FRAMES_DECODED: AtomicU64 = AtomicU64::new(0);
static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static CHECKSUM_FAILURES: AtomicU64 = AtomicU64::new(0);
static TAIL_FAILURES: AtomicU64 = AtomicU64::new(0);
static LENGTH_REJECTS: AtomicU64 = AtomicU64::new(0);
static RESYNCS: AtomicU64 = AtomicU64::new(0);
static TRANSIENT_READ_ERRORS: AtomicU64 = AtomicU64::new(0);
static VERSION_MISMATCHES: AtomicU64 = AtomicU64::new(0);

/// Track link health without external dependencies.
pub(crate) struct Metrics;

impl Metrics {
    #[inline]
    pub(crate) fn record_bytes_in(count: usize) {
        BYTES_IN.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_frame_decoded() {
        FRAMES_DECODED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_frame_sent() {
        FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_checksum_failure() {
        CHECKSUM_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_tail_failure() {
        TAIL_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_length_reject() {
        LENGTH_REJECTS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_resync() {
        RESYNCS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transient_read_error() {
        TRANSIENT_READ_ERRORS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_version_mismatch() {
        VERSION_MISMATCHES.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the link counters.
#[derive(Default, Debug, Clone, Copy)]
pub struct LinkStats {
    /// Raw bytes fed into the frame parser.
    pub bytes_in: u64,
    /// Frames that validated and were emitted.
    pub frames_decoded: u64,
    /// Frames written to the wire.
    pub frames_sent: u64,
    /// Candidates dropped for a bad checksum.
    pub checksum_failures: u64,
    /// Candidates dropped for a bad tail byte.
    pub tail_failures: u64,
    /// HEAD bytes rejected for an out-of-range LEN.
    pub length_rejects: u64,
    /// Times the parser restarted its HEAD search after a failure.
    pub resyncs: u64,
    /// Read errors absorbed by the receive loop.
    pub transient_read_errors: u64,
    /// Received DATA headers whose version differed from ours.
    pub version_mismatches: u64,
}

impl LinkStats {
    /// Snapshot the current counters.
    #[must_use]
    pub fn snapshot() -> Self {
        Self {
            bytes_in: BYTES_IN.load(Ordering::Relaxed),
            frames_decoded: FRAMES_DECODED.load(Ordering::Relaxed),
            frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
            checksum_failures: CHECKSUM_FAILURES.load(Ordering::Relaxed),
            tail_failures: TAIL_FAILURES.load(Ordering::Relaxed),
            length_rejects: LENGTH_REJECTS.load(Ordering::Relaxed),
            resyncs: RESYNCS.load(Ordering::Relaxed),
            transient_read_errors: TRANSIENT_READ_ERRORS.load(Ordering::Relaxed),
            version_mismatches: VERSION_MISMATCHES.load(Ordering::Relaxed),
        }
    }
}
