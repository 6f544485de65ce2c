use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// TCP listening socket.
///
/// Provides bind/accept/connect over host:port addresses. Binding to
/// port 0 requests an ephemeral port; the actual bound address is
/// reported by [`TcpSocket::local_addr`].
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on a host:port address.
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NetStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(addr: &str) -> Result<NetStream> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(%addr, "connected to tcp socket");
        Ok(NetStream::from_tcp(stream))
    }

    /// The local address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpSocket::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        // Connect from another thread
        let handle = std::thread::spawn(move || {
            let mut client = TcpSocket::connect(&addr.to_string()).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_bind_address_in_use() {
        let first = TcpSocket::bind("127.0.0.1:0").unwrap();
        let taken = first.local_addr().to_string();

        let result = TcpSocket::bind(&taken);
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_bind_invalid_address() {
        let result = TcpSocket::bind("not-an-address");
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to find a port with nothing listening.
        let addr = {
            let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
            socket.local_addr().to_string()
        };

        let result = TcpSocket::connect(&addr);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_shutdown_unblocks_reader() {
        let listener = TcpSocket::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let client = TcpSocket::connect(&addr).unwrap();
        let mut server = listener.accept().unwrap();

        let handle = {
            let client = client.try_clone().unwrap();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                client.shutdown().unwrap();
            })
        };

        // Blocks until the other handle shuts the socket down.
        let mut reader = client;
        let mut buf = [0u8; 8];
        let read = reader.read(&mut buf).unwrap();
        assert_eq!(read, 0);

        handle.join().unwrap();
        let _ = server.flush();
    }
}
