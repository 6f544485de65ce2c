//! Channel bridges and the listening message-queue server.
//!
//! This is the "just works" layer. Start a [`Server`], let agents dial
//! its address, and pop their decoded messages from one shared queue
//! with timeout-bounded retrieval. The [`bridge`] module provides the
//! underlying adapters between byte streams and message channels.

pub mod bridge;
pub mod error;
pub mod server;

pub use bridge::{channel_from_reader, channel_from_writer, StreamStatus};
pub use error::{QueueError, Result};
pub use server::{Server, DEFAULT_QUEUE_CAPACITY};
