/// Errors that can occur while encoding, decoding, or moving messages
/// over a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4D51 \"MQ\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is not a valid message encoding.
    #[error("malformed message payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing messages.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed at a message boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// The connection was closed in the middle of a message.
    #[error("connection closed mid-message ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
}

impl WireError {
    /// True when the stream ended cleanly between messages, as opposed
    /// to a decode failure or a mid-message disconnect.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, WireError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
