//! The serial link: connection lifecycle, receive loop, send path.
//!
//! One `SerialLink` owns the port for the process lifetime between
//! `open` and `close`. The receive loop is the sole writer of the
//! latest-message slot; sends are serialized by a writer mutex so
//! concurrent callers cannot interleave frame bytes on the wire.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace, warn};

use crate::protocol::{
    DataPacket, FrameParser, LinkStats, Metrics, Msg, VariableValue, encode_frame,
};
use crate::registry::VariableRegistry;

use super::error::{Result, TransportError};
use super::io::{LinkIo, is_read_timeout, open_serial};
use super::slot::{LatestFrame, LatestMessageSlot};

/// Raw-chunk diagnostic callback, invoked with every read chunk
/// independent of framing.
pub type ChunkTap = dyn Fn(&[u8]) + Send + Sync;

/// Link tuning knobs.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Maximum bytes per receive-loop read.
    pub chunk_size: usize,
    /// Serial read timeout; bounds each loop iteration and therefore
    /// how long stopping can take.
    pub read_timeout: Duration,
    /// Pause after a transient read error before retrying.
    pub transient_backoff: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            read_timeout: Duration::from_millis(50),
            transient_backoff: Duration::from_millis(100),
        }
    }
}

/// Host-side end of the duplex control link.
///
/// Lifecycle is explicit: `open` (or [`attach`](Self::attach)),
/// `start_receiving`, `stop_receiving`, `close`. The handle is meant
/// to be owned by whoever manages process I/O and shared by reference
/// with collaborators; there is no global instance.
pub struct SerialLink {
    registry: Arc<VariableRegistry>,
    config: LinkConfig,
    reader: Option<Box<dyn LinkIo>>,
    writer: Option<Mutex<Box<dyn LinkIo>>>,
    slot: Arc<LatestMessageSlot>,
    seq: AtomicU8,
    running: Arc<AtomicBool>,
    rx_thread: Option<JoinHandle<()>>,
    tap: Option<Arc<ChunkTap>>,
}

impl SerialLink {
    /// Create an unconnected link over the given registry.
    #[must_use]
    pub fn new(registry: Arc<VariableRegistry>, config: LinkConfig) -> Self {
        Self {
            registry,
            config,
            reader: None,
            writer: None,
            slot: Arc::new(LatestMessageSlot::new()),
            seq: AtomicU8::new(0),
            running: Arc::new(AtomicBool::new(false)),
            rx_thread: None,
            tap: None,
        }
    }

    /// Open the named serial port. A failure is returned to the
    /// caller and not retried here.
    #[instrument(level = "debug", skip(self))]
    pub fn open(&mut self, port: &str, baud: u32) -> Result<()> {
        let io = open_serial(port, baud, self.config.read_timeout)?;
        self.attach(io)
    }

    /// Attach an already-open duplex byte stream.
    pub fn attach(&mut self, io: Box<dyn LinkIo>) -> Result<()> {
        let writer = io.try_clone_io()?;
        self.reader = Some(io);
        self.writer = Some(Mutex::new(writer));
        Ok(())
    }

    /// Install the raw-chunk diagnostic tap. Takes effect at the next
    /// `start_receiving`.
    pub fn set_chunk_tap(&mut self, tap: impl Fn(&[u8]) + Send + Sync + 'static) {
        self.tap = Some(Arc::new(tap));
    }

    /// The shared latest-message slot.
    #[must_use]
    pub fn slot(&self) -> Arc<LatestMessageSlot> {
        Arc::clone(&self.slot)
    }

    /// The registry this link was built over.
    #[must_use]
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Snapshot of the link diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> LinkStats {
        LinkStats::snapshot()
    }

    /// Whether the receive loop is running.
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the continuous receive loop.
    pub fn start_receiving(&mut self) -> Result<()> {
        if self.rx_thread.is_some() {
            return Err(TransportError::ReceiverAlreadyRunning);
        }
        let io = self.reader.take().ok_or(TransportError::NotConnected)?;
        self.running.store(true, Ordering::Release);

        let slot = Arc::clone(&self.slot);
        let running = Arc::clone(&self.running);
        let tap = self.tap.clone();
        let config = self.config.clone();
        let local_short = self.registry.version().short();
        let handle = thread::Builder::new()
            .name("roverlink-rx".into())
            .spawn(move || receive_loop(io, &slot, &running, tap.as_deref(), &config, local_short))
            .map_err(TransportError::Io)?;
        self.rx_thread = Some(handle);
        debug!("receive loop started");
        Ok(())
    }

    /// Stop the receive loop, joining it within a bounded time.
    pub fn stop_receiving(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.rx_thread.take() else {
            return;
        };
        // Each loop iteration is bounded by the read timeout, so the
        // thread observes the flag within a few iterations.
        let deadline = Instant::now() + self.config.read_timeout * 4 + Duration::from_millis(250);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if handle.is_finished() {
            let _ = handle.join();
            debug!("receive loop stopped");
        } else {
            warn!("receive loop did not stop in time; detaching");
        }
    }

    /// Stop receiving and release the serial handle.
    pub fn close(&mut self) {
        self.stop_receiving();
        self.reader = None;
        self.writer = None;
        debug!("link closed");
    }

    /// Write raw bytes to the wire and flush them.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        let writer = self.writer.as_ref().ok_or(TransportError::NotConnected)?;
        let mut guard = writer.lock().expect("writer mutex poisoned");
        guard.write_all(bytes)?;
        guard.flush()?;
        trace!(len = bytes.len(), "sent raw bytes");
        Ok(())
    }

    /// Frame a DATA payload and send it. Returns the sequence number
    /// used.
    pub fn send_data(&self, data: &[u8]) -> Result<u8> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let frame = encode_frame(data, seq)?;
        self.send_raw(&frame)?;
        Metrics::record_frame_sent();
        Ok(seq)
    }

    /// Encode and send one packet.
    pub fn send_packet(&self, packet: &DataPacket) -> Result<u8> {
        self.send_data(&packet.encode())
    }

    /// Encode and transmit one DATA frame containing one TLV per
    /// entry, in the given order.
    #[instrument(level = "debug", skip(self, entries))]
    pub fn send_kv<'a, I>(&self, entries: I) -> Result<u8>
    where
        I: IntoIterator<Item = (&'a str, VariableValue)>,
    {
        let mut packet = DataPacket::new(Msg::PcToMcu, self.registry.version().short());
        for (name, value) in entries {
            let var = self
                .registry
                .get(name)
                .ok_or_else(|| TransportError::UnknownVariable {
                    name: name.to_owned(),
                })?;
            packet.push_value(var.id, var.vtype, &value)?;
        }
        self.send_packet(&packet)
    }

    /// The latest decoded packet, if any message has arrived.
    #[must_use]
    pub fn latest_decoded(&self) -> Option<DataPacket> {
        self.slot.latest_decoded()
    }

    /// The latest frame with its raw diagnostic buffers.
    #[must_use]
    pub fn latest_frame(&self) -> Option<LatestFrame> {
        self.slot.latest()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(
    mut io: Box<dyn LinkIo>,
    slot: &LatestMessageSlot,
    running: &AtomicBool,
    tap: Option<&ChunkTap>,
    config: &LinkConfig,
    local_short: u8,
) {
    let mut parser = FrameParser::new();
    let mut chunk = vec![0u8; config.chunk_size.max(1)];
    while running.load(Ordering::Acquire) {
        match io.read(&mut chunk) {
            Ok(0) => thread::sleep(Duration::from_millis(1)),
            Ok(n) => {
                trace!(n, "read chunk");
                if let Some(tap) = tap {
                    tap(&chunk[..n]);
                }
                parser.push(&chunk[..n]);
                while let Some(frame) = parser.next_frame() {
                    let decoded = match DataPacket::decode(&frame.data) {
                        Ok(packet) => {
                            if packet.ver != local_short {
                                Metrics::record_version_mismatch();
                                warn!(
                                    theirs = packet.ver,
                                    ours = local_short,
                                    "DATA version differs from local registry build"
                                );
                            }
                            Some(packet)
                        }
                        Err(err) => {
                            warn!("frame carried undecodable DATA payload: {err}");
                            None
                        }
                    };
                    slot.publish(LatestFrame {
                        raw_frame: frame.bytes,
                        raw_data: frame.data,
                        decoded,
                    });
                }
            }
            Err(err) if is_read_timeout(&err) => {}
            Err(err) => {
                // A momentary OS-level hiccup must not kill the link.
                Metrics::record_transient_read_error();
                warn!("transient read error, backing off: {err}");
                thread::sleep(config.transient_backoff);
            }
        }
    }
    debug!("receive loop exited");
}
