//! Byte-stream seam between the link and the serial hardware.
//!
//! The receive loop and the send path hold independent handles onto
//! the same port, so a blocking read never stalls a send. Tests
//! substitute an in-memory implementation.

use std::io::{self, Read as _, Write as _};
use std::time::Duration;

use tracing::debug;

use super::error::{Result, TransportError};

/// Duplex byte stream with independently clonable handles.
///
/// `read` is expected to block until data arrives or a timeout
/// configured at open time expires; a timeout surfaces as
/// [`io::ErrorKind::TimedOut`] and means "no data yet", not a fault.
pub trait LinkIo: Send {
    /// Read up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Push buffered bytes out to the wire.
    fn flush(&mut self) -> io::Result<()>;

    /// Second handle onto the same stream.
    fn try_clone_io(&self) -> io::Result<Box<dyn LinkIo>>;
}

/// `LinkIo` over a real serial port.
struct SerialIo {
    port: Box<dyn serialport::SerialPort>,
}

impl LinkIo for SerialIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn try_clone_io(&self) -> io::Result<Box<dyn LinkIo>> {
        let port = self
            .port
            .try_clone()
            .map_err(|err| io::Error::other(err.to_string()))?;
        Ok(Box::new(SerialIo { port }))
    }
}

/// Open a serial port at the given baud rate.
///
/// The read timeout bounds each receive-loop iteration, which is what
/// makes stopping the loop deterministic.
pub fn open_serial(port: &str, baud: u32, read_timeout: Duration) -> Result<Box<dyn LinkIo>> {
    let handle = serialport::new(port, baud)
        .timeout(read_timeout)
        .open()
        .map_err(|source| TransportError::ConnectionOpenFailed {
            port: port.to_owned(),
            source,
        })?;
    debug!(port, baud, "serial port opened");
    Ok(Box::new(SerialIo { port: handle }))
}

/// Whether a read error means "no data yet" rather than a fault.
pub(crate) fn is_read_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
