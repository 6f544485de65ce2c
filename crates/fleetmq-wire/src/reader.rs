use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_message, DEFAULT_MAX_PAYLOAD};
use crate::error::{Result, WireError};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete
/// messages. End of stream at a message boundary is reported as
/// [`WireError::ConnectionClosed`]; end of stream in the middle of a
/// message is [`WireError::Truncated`].
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    max_payload: usize,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with the default payload limit.
    pub fn new(inner: T) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a new message reader with an explicit payload limit.
    pub fn with_max_payload(inner: T, max_payload: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
        }
    }

    /// Read the next complete message (blocking).
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = decode_message(&mut self.buf, self.max_payload)? {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Err(WireError::ConnectionClosed);
                }
                return Err(WireError::Truncated {
                    buffered: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
