use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_message, DEFAULT_MAX_PAYLOAD};
use crate::error::{Result, WireError};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    max_payload: usize,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with the default payload limit.
    pub fn new(inner: T) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a new message writer with an explicit payload limit.
    pub fn with_max_payload(inner: T, max_payload: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
        }
    }

    /// Encode and write one message (blocking), then flush.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        encode_message(message, &mut self.buf, self.max_payload)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::decode_message;
    use crate::reader::MessageReader;

    #[test]
    fn write_single_message() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = MessageWriter::new(cursor);

        writer
            .write_message(&Message::new("delete", ["everything"]))
            .unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let decoded = decode_message(&mut wire, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, Message::new("delete", ["everything"]));
    }

    #[test]
    fn write_multiple_messages_in_order() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = MessageWriter::new(cursor);

        let messages = [
            Message::new("delete", ["everything"]),
            Message::new("rename", ["old", "new"]),
            Message::new("destroy", ["anything"]),
        ];
        for message in &messages {
            writer.write_message(message).unwrap();
        }

        let wire = writer.into_inner().into_inner();
        let mut reader = MessageReader::new(Cursor::new(wire));
        for expected in &messages {
            assert_eq!(&reader.read_message().unwrap(), expected);
        }
    }

    #[test]
    fn payload_too_large_rejected() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = MessageWriter::with_max_payload(cursor, 8);

        let err = writer
            .write_message(&Message::new("bulk", ["oversized-argument"]))
            .unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = MessageWriter::new(sink);

        writer.write_message(&Message::new("ping", ["x"])).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = MessageWriter::new(ZeroWriter);
        let err = writer
            .write_message(&Message::new("ping", ["x"]))
            .unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn write_error_propagates() {
        let mut writer = MessageWriter::new(BrokenWriter);
        let err = writer
            .write_message(&Message::new("ping", ["x"]))
            .unwrap_err();
        assert!(matches!(err, WireError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let sink = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = MessageWriter::new(sink);
        writer.write_message(&Message::new("retry", ["ok"])).unwrap();

        let inner = writer.into_inner();
        assert!(!inner.data.is_empty());
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = MessageWriter::new(cursor);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "closed connection",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }
}
