//! Asynchronous serial transport and the correlation layer on top of
//! it.

mod error;
mod io;
mod link;
mod slot;
mod waiter;

pub use error::{Result, TransportError};
pub use io::{LinkIo, open_serial};
pub use link::{ChunkTap, LinkConfig, SerialLink};
pub use slot::{LatestFrame, LatestMessageSlot};
pub use waiter::{wait_for_ack, wait_for_value};
