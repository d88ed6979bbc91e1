//! One-shot UDP request/response exchange with a deadline
//!
//! Each exchange binds its own ephemeral socket, sends the request once,
//! and waits for the first datagram. It gives up when the timeout elapses.
//! The socket is owned by the exchange and dropped when it returns, so it is
//! released exactly once whichever way the race ends.
//!
//! The socket is left unconnected: whatever datagram arrives first is taken
//! as the reply, whichever address it came from. Trust in the reply comes
//! from the Response Authenticator, not from the sender's address.

use async_trait::async_trait;
use radius_proto::Packet;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,
    #[error("communication error: {0}")]
    Communication(#[from] io::Error),
}

/// A datagram socket used for a single exchange with one server
#[async_trait]
pub trait DatagramSocket: Send {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize>;
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens a fresh socket toward a server for every exchange
#[async_trait]
pub trait SocketBinder: Send + Sync {
    type Socket: DatagramSocket;

    async fn open(&self, host: &str, port: u16) -> io::Result<Self::Socket>;
}

/// Binds real tokio UDP sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpBinder;

/// An unconnected UDP socket paired with the server it sends to
#[derive(Debug)]
pub struct ServerSocket {
    socket: UdpSocket,
    server: SocketAddr,
}

#[async_trait]
impl SocketBinder for UdpBinder {
    type Socket = ServerSocket;

    async fn open(&self, host: &str, port: u16) -> io::Result<ServerSocket> {
        let server = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{} did not resolve", host))
            })?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        Ok(ServerSocket { socket, server })
    }
}

#[async_trait]
impl DatagramSocket for ServerSocket {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send_to(buf, self.server).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, peer) = self.socket.recv_from(buf).await?;
        if peer != self.server {
            debug!(server = %self.server, peer = %peer, "Reply came from another address");
        }
        Ok(len)
    }
}

/// Request/response transport toward one RADIUS server
#[derive(Debug, Clone)]
pub struct UdpTransport<B = UdpBinder> {
    binder: B,
    host: String,
    port: u16,
    timeout: Duration,
}

impl UdpTransport<UdpBinder> {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self::with_binder(UdpBinder, host, port, timeout)
    }
}

impl<B: SocketBinder> UdpTransport<B> {
    pub fn with_binder(binder: B, host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        UdpTransport {
            binder,
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Send `request` once and return the first datagram received
    ///
    /// The timeout covers opening the socket, sending and waiting.
    pub async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let attempt = async {
            let mut socket = self.binder.open(&self.host, self.port).await?;
            let result = round_trip(&mut socket, request).await;
            drop(socket);
            result
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(response)) => {
                debug!(
                    server = %self.host,
                    port = self.port,
                    bytes = response.len(),
                    "Datagram received"
                );
                Ok(response)
            }
            Ok(Err(e)) => Err(TransportError::Communication(e)),
            // The attempt future, and the socket it owns, is dropped here
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

async fn round_trip<S: DatagramSocket>(socket: &mut S, request: &[u8]) -> io::Result<Vec<u8>> {
    socket.send(request).await?;

    let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE];
    let len = socket.recv(&mut buf).await?;
    buf.truncate(len);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    async fn silent_server() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[tokio::test]
    async fn test_exchange_returns_first_datagram() {
        let (server, port) = silent_server().await;
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let mut reply = buf[..len].to_vec();
            reply.reverse();
            server.send_to(&reply, peer).await.unwrap();
        });

        let transport = UdpTransport::new("127.0.0.1", port, Duration::from_secs(2));
        let response = transport.exchange(b"abc").await.unwrap();
        assert_eq!(response, b"cba");
    }

    #[tokio::test]
    async fn test_exchange_times_out() {
        let (_server, port) = silent_server().await;
        let transport = UdpTransport::new("127.0.0.1", port, Duration::from_millis(150));

        let started = Instant::now();
        let result = transport.exchange(b"ping").await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_reply_from_another_port_is_accepted() {
        let (server, port) = silent_server().await;
        let (other, _) = silent_server().await;
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            other.send_to(&buf[..len], peer).await.unwrap();
        });

        let transport = UdpTransport::new("127.0.0.1", port, Duration::from_secs(2));
        let response = transport.exchange(b"echo").await.unwrap();
        assert_eq!(response, b"echo");
    }

    /// Fails every open the way a failed name lookup does
    struct UnresolvableBinder;

    #[async_trait]
    impl SocketBinder for UnresolvableBinder {
        type Socket = ServerSocket;

        async fn open(&self, host: &str, _port: u16) -> io::Result<ServerSocket> {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not resolve", host),
            ))
        }
    }

    #[tokio::test]
    async fn test_open_failure_is_communication_error() {
        let transport =
            UdpTransport::with_binder(UnresolvableBinder, "host.invalid", 1812, Duration::from_secs(5));

        let started = Instant::now();
        let result = transport.exchange(b"ping").await;

        match result {
            Err(TransportError::Communication(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("Expected communication error, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
