use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::message::Message;

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "MQ" (0x4D 0x51).
pub const MAGIC: [u8; 2] = [0x4D, 0x51];

/// Default maximum payload size: 1 MiB. Control messages are small;
/// anything larger on the stream is treated as corruption.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────────────┐
/// │ Magic (2B)   │ Length    │ Payload           │
/// │ 0x4D 0x51    │ (4B LE)   │ (Length bytes,    │
/// │ "MQ"         │           │  JSON message)    │
/// └──────────────┴───────────┴──────────────────┘
/// ```
pub fn encode_message(message: &Message, dst: &mut BytesMut, max_payload: usize) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    if payload.len() > max_payload {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(&payload);
    Ok(())
}

/// Decode a message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message
/// yet. On success, consumes exactly one message's bytes from the
/// buffer.
pub fn decode_message(src: &mut BytesMut, max_payload: usize) -> Result<Option<Message>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    // Check magic
    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes(src[2..6].try_into().unwrap()) as usize;

    if payload_len > max_payload {
        return Err(WireError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len);
    let message = serde_json::from_slice(&payload)?;

    Ok(Some(message))
}
