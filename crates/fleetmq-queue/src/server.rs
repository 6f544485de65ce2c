//! The listening server that fans many connections into one queue.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use tracing::{debug, warn};

use fleetmq_transport::{NetStream, TcpSocket};
use fleetmq_wire::{Message, WireError};

use crate::bridge::channel_from_reader;
use crate::error::{QueueError, Result};

/// Capacity of the shared message queue. Connection tasks block when it
/// fills; messages are never dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Capacity of the shared connection-error queue. Errors are
/// informational; overflow is logged rather than blocking a connection.
const ERROR_QUEUE_CAPACITY: usize = 64;

/// A TCP message-queue server.
///
/// Accepts connections indefinitely, decodes the messages each peer
/// sends, and funnels all of them into one shared queue consumed via
/// [`Server::message`]. Per-connection order is preserved; interleaving
/// across connections is unspecified.
pub struct Server {
    local_addr: SocketAddr,
    messages: Receiver<Message>,
    errors: Receiver<WireError>,
    shutdown: Arc<AtomicBool>,
    conns: Arc<Mutex<Vec<NetStream>>>,
    accept_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `addr` and start accepting connections.
    ///
    /// Binding to port 0 requests an ephemeral port; the actual address
    /// is available via [`Server::local_addr`]. Fails synchronously with
    /// a transport bind error if the address is unavailable, leaving no
    /// background state behind.
    pub fn start(addr: &str) -> Result<Server> {
        let socket = TcpSocket::bind(addr)?;
        let local_addr = socket.local_addr();

        let (message_tx, message_rx) = bounded(DEFAULT_QUEUE_CAPACITY);
        let (error_tx, error_rx) = bounded(ERROR_QUEUE_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let conns: Arc<Mutex<Vec<NetStream>>> = Arc::new(Mutex::new(Vec::new()));

        let accept_handle = thread::spawn({
            let shutdown = Arc::clone(&shutdown);
            let conns = Arc::clone(&conns);
            move || accept_loop(socket, message_tx, error_tx, shutdown, conns)
        });

        Ok(Server {
            local_addr,
            messages: message_rx,
            errors: error_rx,
            shutdown,
            conns,
            accept_handle: Some(accept_handle),
        })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Pop the next message from the shared queue.
    ///
    /// `None` blocks until a message arrives or the queue shuts down.
    /// `Some(bound)` limits the wait: if nothing arrives within `bound`
    /// the call fails with [`QueueError::Timeout`] and no message is
    /// consumed; a message arriving later is returned by a later call.
    /// `Some(Duration::ZERO)` polls without waiting.
    ///
    /// A per-connection failure surfaces once as
    /// [`QueueError::Connection`]; the queue keeps running and the
    /// caller may keep popping.
    pub fn message(&self, timeout: Option<Duration>) -> Result<Message> {
        let (deadline, bound) = match timeout {
            Some(bound) => (after(bound), bound),
            None => (never(), Duration::ZERO),
        };

        let mut errors_open = true;
        loop {
            if errors_open {
                select! {
                    recv(self.messages) -> message => {
                        return message.map_err(|_| QueueError::Closed);
                    }
                    recv(self.errors) -> err => {
                        match err {
                            Ok(err) => return Err(QueueError::Connection(err)),
                            // All error producers are gone; keep draining
                            // whatever messages remain.
                            Err(_) => errors_open = false,
                        }
                    }
                    recv(deadline) -> _ => {
                        return Err(QueueError::Timeout(bound));
                    }
                }
            } else {
                select! {
                    recv(self.messages) -> message => {
                        return message.map_err(|_| QueueError::Closed);
                    }
                    recv(deadline) -> _ => {
                        return Err(QueueError::Timeout(bound));
                    }
                }
            }
        }
    }

    /// Stop accepting connections and cancel live connection tasks.
    ///
    /// The listening socket is released before this returns; live
    /// connections are shut down so their reader bridges terminate.
    /// Messages already decoded remain retrievable via
    /// [`Server::message`]. Idempotent: repeated calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Wake the accept loop so it observes the shutdown flag, then
        // wait for it to release the listening socket.
        let _ = TcpSocket::connect(&wake_addr(self.local_addr).to_string());
        if let Some(handle) = self.accept_handle.take() {
            let _ = handle.join();
        }

        let mut registry = match self.conns.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for conn in registry.drain(..) {
            let _ = conn.shutdown();
        }

        debug!(local_addr = %self.local_addr, "server closed");
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn accept_loop(
    socket: TcpSocket,
    messages: Sender<Message>,
    errors: Sender<WireError>,
    shutdown: Arc<AtomicBool>,
    conns: Arc<Mutex<Vec<NetStream>>>,
) {
    loop {
        let stream = match socket.accept() {
            Ok(stream) => stream,
            Err(err) => {
                if !shutdown.load(Ordering::SeqCst) {
                    warn!(error = %err, "accept failed, accept loop exiting");
                }
                break;
            }
        };

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match stream.try_clone() {
            Ok(handle) => {
                let mut registry = match conns.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                registry.push(handle);
            }
            Err(err) => warn!(error = %err, "could not register connection for shutdown"),
        }

        let messages = messages.clone();
        let errors = errors.clone();
        thread::spawn(move || serve_connection(stream, messages, errors));
    }
    debug!("accept loop exited");
}

/// Per-connection task: funnels one reader bridge into the shared queue.
fn serve_connection(stream: NetStream, messages: Sender<Message>, errors: Sender<WireError>) {
    let peer = stream.peer_addr().ok();
    let (incoming, status) = channel_from_reader(stream);

    for message in incoming.iter() {
        if messages.send(message).is_err() {
            debug!(?peer, "queue consumer gone, dropping connection task");
            return;
        }
    }

    match status.recv() {
        Ok(Ok(())) => debug!(?peer, "connection closed"),
        Ok(Err(err)) => {
            warn!(?peer, error = %err, "connection failed");
            if errors.try_send(err).is_err() {
                debug!(?peer, "error queue unavailable, discarding connection error");
            }
        }
        Err(_) => {}
    }
}

/// Dialable form of the bound address, for the shutdown wake-up
/// connection. An unspecified bind IP (0.0.0.0 / ::) is not dialable;
/// substitute the loopback of the same family.
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}
