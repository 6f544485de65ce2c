//! TCP transport for the fleetmq message queue.
//!
//! Binds, accepts, and dials the connections agents use to reach a
//! queue server. This is the lowest layer; everything else builds on
//! top of the [`NetStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::TcpSocket;
