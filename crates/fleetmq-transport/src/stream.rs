use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::error::Result;

/// A connected TCP stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Cloned handles share the underlying socket, so one side of a
/// connection can be read while another holds a handle for shutdown.
pub struct NetStream {
    inner: TcpStream,
}

impl Read for NetStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for NetStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl NetStream {
    /// Create a NetStream from a connected TCP stream.
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.peer_addr()?)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Shut down both directions of the connection.
    ///
    /// Any thread blocked reading this stream observes end of stream.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStream")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}
