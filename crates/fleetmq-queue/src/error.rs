use std::time::Duration;

/// Errors surfaced by the queue server and channel bridges.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Transport-level error (bind, accept, connect).
    #[error("transport error: {0}")]
    Transport(#[from] fleetmq_transport::TransportError),

    /// A connection failed while decoding messages. Informational:
    /// other connections and the accept loop keep running.
    #[error("connection error: {0}")]
    Connection(#[from] fleetmq_wire::WireError),

    /// No message arrived within the requested bound. The caller may
    /// retry; nothing was consumed.
    #[error("no message arrived within {0:?}")]
    Timeout(Duration),

    /// The queue has shut down and no more messages will arrive.
    #[error("message queue closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, QueueError>;
