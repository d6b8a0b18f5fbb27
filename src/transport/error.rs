//! Transport-level error types covering connection, I/O, and waiting
//! failures.

use std::io;

use thiserror::Error;

/// Unified error type for transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The serial port could not be opened. Not retried internally;
    /// retry and backoff policy belongs to the caller.
    #[error("failed to open {port}: {source}")]
    ConnectionOpenFailed {
        /// Port name as given by the caller.
        port: String,
        /// Underlying serial error.
        #[source]
        source: serialport::Error,
    },

    /// I/O failure on an open connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Codec failure while building an outbound frame.
    #[error("codec error: {0}")]
    Codec(#[from] crate::protocol::Error),

    /// A waiting operation expired.
    #[error("timed out")]
    Timeout,

    /// Operation requires an open connection.
    #[error("link is not connected")]
    NotConnected,

    /// `start_receiving` called while the receive loop is running.
    #[error("receiver already running")]
    ReceiverAlreadyRunning,

    /// Named variable is not in the registry.
    #[error("unknown variable: {name}")]
    UnknownVariable {
        /// The name that failed to resolve.
        name: String,
    },
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
