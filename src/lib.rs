//! Host-side duplex control link between a supervisory computer and a
//! microcontroller aboard a mobile robot.
//!
//! Every control/telemetry quantity gets a stable 1-byte wire ID
//! generated from its name, travels as a compact TLV inside a DATA
//! payload, and crosses the serial link inside a length-prefixed,
//! checksummed frame that recovers from corruption by
//! resynchronizing on the next sync byte.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use roverlink::{
//!     LinkConfig, ProtocolVersion, SerialLink, VariableRegistry, VariableType, VariableValue,
//! };
//!
//! let registry = Arc::new(VariableRegistry::build(
//!     &[
//!         ("motor_left", VariableType::I16Le),
//!         ("motor_right", VariableType::I16Le),
//!         ("arm_position", VariableType::U8),
//!     ],
//!     ProtocolVersion::now(),
//! )?);
//!
//! let mut link = SerialLink::new(Arc::clone(&registry), LinkConfig::default());
//! link.open("/dev/ttyUSB0", 115_200)?;
//! link.start_receiving()?;
//!
//! link.send_kv([("arm_position", VariableValue::Int(5))])?;
//! link.wait_for_ack(
//!     "arm_position",
//!     &VariableValue::Int(5),
//!     Some(Duration::from_secs(1)),
//! )?;
//!
//! link.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Layers
//!
//! - [`registry`] - build-time name-to-ID assignment and the generated
//!   host/firmware tables
//! - [`protocol`] - TLV, DATA, and frame codecs plus the streaming
//!   frame parser
//! - [`transport`] - the serial receive loop, latest-message slot, and
//!   ack/value waiters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod registry;
pub mod transport;

pub use protocol::{
    DataPacket, Error, FrameParser, LinkStats, Msg, RawFrame, Tlv, VariableType, VariableValue,
};
pub use registry::{ProtocolVersion, RegistryError, Variable, VariableRegistry};
pub use transport::{LatestFrame, LinkConfig, LinkIo, SerialLink, TransportError};
