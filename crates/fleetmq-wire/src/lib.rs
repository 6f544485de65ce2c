//! Self-delimiting message framing for fleetmq.
//!
//! Agents exchange discrete control messages: an action name plus
//! ordered string arguments. Every message is framed with:
//! - A 2-byte magic number ("MQ") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A JSON payload carrying the action and its arguments
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{decode_message, encode_message, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC};
pub use error::{Result, WireError};
pub use message::Message;
pub use reader::MessageReader;
pub use writer::MessageWriter;
