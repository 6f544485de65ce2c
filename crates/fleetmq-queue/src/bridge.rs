//! Channel bridges between byte streams and message channels.
//!
//! Each bridge pairs one background thread with a message channel and an
//! error channel: typed messages on one side, serialized bytes on the
//! other. A bridge runs until its stream or its channel terminates; a
//! fresh stream needs a fresh bridge.

use std::io::{Read, Write};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use fleetmq_wire::{Message, MessageReader, MessageWriter, WireError};

/// Terminal status of a reader bridge: `Ok(())` after a clean end of
/// stream, otherwise the read or decode error that stopped it.
pub type StreamStatus = std::result::Result<(), WireError>;

/// Capacity of bridge error channels. A bridge reports at most one
/// terminal value; the slot lets its thread exit without waiting for a
/// consumer to poll.
const ERROR_CAPACITY: usize = 1;

/// Adapt a byte sink into a message channel.
///
/// Messages sent on the returned channel are encoded and written to the
/// sink one at a time, in submission order. On a write failure the error
/// is reported once on the error channel and the bridge stops servicing
/// input; later sends fail with a send error. Dropping the sender with
/// no prior failure shuts the bridge down cleanly: the error channel
/// disconnects without ever carrying a value.
pub fn channel_from_writer<W>(sink: W) -> (Sender<Message>, Receiver<WireError>)
where
    W: Write + Send + 'static,
{
    let (message_tx, message_rx) = bounded::<Message>(0);
    let (error_tx, error_rx) = bounded::<WireError>(ERROR_CAPACITY);
    thread::spawn(move || write_loop(sink, message_rx, error_tx));
    (message_tx, error_rx)
}

fn write_loop<W: Write>(sink: W, messages: Receiver<Message>, errors: Sender<WireError>) {
    let mut writer = MessageWriter::new(sink);
    for message in messages.iter() {
        if let Err(err) = writer.write_message(&message) {
            let _ = errors.send(err);
            return;
        }
    }
    debug!("message channel closed, writer bridge exiting");
}

/// Adapt a byte source into a message channel.
///
/// Decoded messages are published in stream order on a rendezvous
/// channel; each publish blocks until the consumer accepts it, so a slow
/// consumer slows the reads. When the bridge terminates, exactly one
/// [`StreamStatus`] is sent on the error channel and both channels
/// disconnect; no messages are produced after that.
pub fn channel_from_reader<R>(source: R) -> (Receiver<Message>, Receiver<StreamStatus>)
where
    R: Read + Send + 'static,
{
    let (message_tx, message_rx) = bounded::<Message>(0);
    let (status_tx, status_rx) = bounded::<StreamStatus>(ERROR_CAPACITY);
    thread::spawn(move || read_loop(source, message_tx, status_tx));
    (message_rx, status_rx)
}

fn read_loop<R: Read>(source: R, messages: Sender<Message>, status: Sender<StreamStatus>) {
    let mut reader = MessageReader::new(source);
    loop {
        match reader.read_message() {
            Ok(message) => {
                if messages.send(message).is_err() {
                    debug!("message consumer gone, reader bridge exiting");
                    return;
                }
            }
            Err(err) if err.is_clean_close() => {
                let _ = status.send(Ok(()));
                return;
            }
            Err(err) => {
                let _ = status.send(Err(err));
                return;
            }
        }
    }
}
