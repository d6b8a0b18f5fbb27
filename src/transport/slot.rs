//! Shared most-recent-message slot.
//!
//! The receive loop is the only writer; any number of waiters and UI
//! readers take cloned snapshots through the lock. Last-value
//! semantics: a fast producer can overwrite a value before a slow
//! consumer sees it, so callers that need every update tap the raw
//! chunk callback instead.

use std::sync::RwLock;

use crate::protocol::{DataPacket, VariableValue, unpack_value};
use crate::registry::Variable;

/// Snapshot of the most recently received frame.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    /// The complete frame as received, for diagnostics.
    pub raw_frame: Vec<u8>,
    /// The embedded DATA payload bytes.
    pub raw_data: Vec<u8>,
    /// The decoded payload, if the DATA layer parsed.
    pub decoded: Option<DataPacket>,
}

/// Single-slot mailbox holding the latest decoded message.
#[derive(Debug, Default)]
pub struct LatestMessageSlot {
    inner: RwLock<Option<LatestFrame>>,
}

impl LatestMessageSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot. Called only from the receive loop.
    pub fn publish(&self, frame: LatestFrame) {
        let mut guard = self.inner.write().expect("latest-message lock poisoned");
        *guard = Some(frame);
    }

    /// Snapshot of the latest frame, raw buffers included.
    #[must_use]
    pub fn latest(&self) -> Option<LatestFrame> {
        self.inner
            .read()
            .expect("latest-message lock poisoned")
            .clone()
    }

    /// The latest decoded packet, if any.
    #[must_use]
    pub fn latest_decoded(&self) -> Option<DataPacket> {
        self.inner
            .read()
            .expect("latest-message lock poisoned")
            .as_ref()
            .and_then(|frame| frame.decoded.clone())
    }

    /// Typed value of `var` in the latest packet, if present and well
    /// formed.
    #[must_use]
    pub fn value_of(&self, var: &Variable) -> Option<VariableValue> {
        let guard = self.inner.read().expect("latest-message lock poisoned");
        let packet = guard.as_ref()?.decoded.as_ref()?;
        let tlv = packet.find(var.id)?;
        unpack_value(var.vtype, &tlv.value).ok()
    }
}
