//! Transport abstraction and plaintext TCP implementation
//!
//! The session core opens and closes transport connections through the
//! [`Transport`] trait so the connection retrier can be tested against
//! scripted failures. [`TcpTransport`] is the plaintext implementation used
//! by the demo binary; it supports independent send and receive timeouts.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("TCP connect to {endpoint}:{port} failed")]
    ConnectFailed {
        endpoint: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("transport operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport I/O error")]
    Io(#[from] std::io::Error),

    #[error("transport is not connected")]
    NotConnected,
}

/// Independent send and receive timeouts for one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub send: Duration,
    pub recv: Duration,
}

impl TransportTimeouts {
    /// Same timeout in both directions
    pub fn symmetric(timeout: Duration) -> Self {
        Self {
            send: timeout,
            recv: timeout,
        }
    }
}

/// Raw byte transport under the protocol engine
#[async_trait]
pub trait Transport: Send {
    /// Establish a connection to `endpoint:port`
    async fn connect(
        &mut self,
        endpoint: &str,
        port: u16,
        timeouts: TransportTimeouts,
    ) -> Result<(), TransportError>;

    /// Send bytes, returning the number transferred
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Receive bytes into `buf`, returning the number transferred
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Close the connection without any protocol-level goodbye
    async fn close(&mut self);

    fn is_connected(&self) -> bool;

    /// Whether the underlying network link is up. The demo task polls this
    /// before the first connection attempt.
    fn is_network_up(&self) -> bool {
        true
    }
}

/// Plaintext TCP transport backed by [`tokio::net::TcpStream`]
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    timeouts: Option<TransportTimeouts>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeouts(&self) -> Result<TransportTimeouts, TransportError> {
        self.timeouts.ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(
        &mut self,
        endpoint: &str,
        port: u16,
        timeouts: TransportTimeouts,
    ) -> Result<(), TransportError> {
        // A stale stream from a previous session must not leak into this one
        self.stream = None;

        let connect_timeout = timeouts.send.max(timeouts.recv);
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect((endpoint, port)))
            .await
            .map_err(|_| TransportError::Timeout(connect_timeout))?
            .map_err(|source| TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                port,
                source,
            })?;

        stream.set_nodelay(true)?;
        debug!(endpoint, port, "TCP connection established");
        self.stream = Some(stream);
        self.timeouts = Some(timeouts);
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let timeouts = self.timeouts()?;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let written = tokio::time::timeout(timeouts.send, stream.write(data))
            .await
            .map_err(|_| TransportError::Timeout(timeouts.send))??;
        Ok(written)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let timeouts = self.timeouts()?;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let read = tokio::time::timeout(timeouts.recv, stream.read(buf))
            .await
            .map_err(|_| TransportError::Timeout(timeouts.recv))??;
        Ok(read)
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // Best effort; the socket is dropped either way
            let _ = stream.shutdown().await;
            debug!("TCP connection closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn test_timeouts() -> TransportTimeouts {
        TransportTimeouts::symmetric(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_connect_and_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let echo = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 16];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(&buf[..n]).await.unwrap();
        });

        let mut transport = TcpTransport::new();
        assert!(!transport.is_connected());
        transport
            .connect(&addr.ip().to_string(), addr.port(), test_timeouts())
            .await
            .unwrap();
        assert!(transport.is_connected());

        let sent = transport.send(b"ping").await.unwrap();
        assert_eq!(sent, 4);

        let mut buf = [0u8; 16];
        let received = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..received], b"ping");

        transport.close().await;
        assert!(!transport.is_connected());
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_reports_endpoint() {
        // Bind then drop so the port is very likely closed
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = TcpTransport::new();
        let result = transport
            .connect(&addr.ip().to_string(), addr.port(), test_timeouts())
            .await;
        match result {
            Err(TransportError::ConnectFailed { endpoint, port, .. }) => {
                assert_eq!(endpoint, addr.ip().to_string());
                assert_eq!(port, addr.port());
            }
            Err(TransportError::Timeout(_)) => {} // some platforms surface refusal as a timeout
            other => panic!("expected a connect failure, got {other:?}"),
        }
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_connection_fails() {
        let mut transport = TcpTransport::new();
        assert!(matches!(
            transport.send(b"x").await,
            Err(TransportError::NotConnected)
        ));
        let mut buf = [0u8; 4];
        assert!(matches!(
            transport.recv(&mut buf).await,
            Err(TransportError::NotConnected)
        ));
    }
}
