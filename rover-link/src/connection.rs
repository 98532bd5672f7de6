//! TCP connection management.
//!
//! [`Connection`] owns the socket to the robot. Splitting yields the
//! receive/send halves the frame loops drive; every blocking call races
//! the shared `CancellationToken`, so [`ShutdownHandle::close`] unblocks
//! an in-flight receive or send instead of waiting for the next loop
//! iteration. The token doubles as the liveness flag.

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::LinkError;

/// Bytes requested from the socket per receive call.
pub const RECV_CHUNK: usize = 16 * 1024;

// ── ConnectionInfo ───────────────────────────────────────────────

/// IP address and port of the robot.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Connection ───────────────────────────────────────────────────

/// An established duplex connection to the robot.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    shutdown: CancellationToken,
}

impl Connection {
    /// Connect to the robot. Blocks until the TCP handshake completes;
    /// no automatic retry.
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, LinkError> {
        info!("connecting to robot at {info}");
        let stream = TcpStream::connect((info.host(), info.port()))
            .await
            .map_err(|source| LinkError::Connect {
                addr: info.to_string(),
                source,
            })?;
        stream.set_nodelay(true).map_err(|source| LinkError::Connect {
            addr: info.to_string(),
            source,
        })?;
        info!("connected to robot");

        Ok(Self {
            stream,
            shutdown: CancellationToken::new(),
        })
    }

    /// Connect with a deadline.
    pub async fn connect_timeout(
        info: &ConnectionInfo,
        timeout: Duration,
    ) -> Result<Self, LinkError> {
        match tokio::time::timeout(timeout, Self::connect(info)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::Timeout(timeout)),
        }
    }

    /// A cloneable handle that closes the connection from anywhere.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.shutdown.clone(),
        }
    }

    /// Split into the halves driven by the read and write loops.
    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        let (read, write) = self.stream.into_split();
        (
            ConnectionReader {
                half: read,
                shutdown: self.shutdown.clone(),
            },
            ConnectionWriter {
                half: write,
                shutdown: self.shutdown,
            },
        )
    }
}

// ── ShutdownHandle ───────────────────────────────────────────────

/// Closes the link: flips liveness *and* unblocks every in-flight
/// receive/send. A flag-only close would leave a loop stuck on a
/// stalled peer.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the link is closed.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }
}

// ── ConnectionReader ─────────────────────────────────────────────

/// Receive half of the connection.
#[derive(Debug)]
pub struct ConnectionReader {
    half: OwnedReadHalf,
    shutdown: CancellationToken,
}

impl ConnectionReader {
    /// Receive up to [`RECV_CHUNK`] bytes, appending them to `buf`.
    ///
    /// May append fewer bytes than requested. A zero-byte read is the
    /// peer's orderly close and surfaces as [`LinkError::PeerClosed`],
    /// never a silent no-op. Local close surfaces as
    /// [`LinkError::Closed`].
    pub async fn receive(&mut self, buf: &mut BytesMut) -> Result<usize, LinkError> {
        buf.reserve(RECV_CHUNK);
        let mut chunk = buf.limit(RECV_CHUNK);

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(LinkError::Closed),
            result = self.half.read_buf(&mut chunk) => result,
        };

        let n = result?;
        if n == 0 {
            return Err(LinkError::PeerClosed);
        }
        Ok(n)
    }
}

// ── ConnectionWriter ─────────────────────────────────────────────

/// Send half of the connection.
#[derive(Debug)]
pub struct ConnectionWriter {
    half: OwnedWriteHalf,
    shutdown: CancellationToken,
}

impl ConnectionWriter {
    /// Transmit the whole of `data`, retrying partial writes until the
    /// socket has accepted every byte.
    ///
    /// Cancellation mid-write may leave a truncated frame on the wire;
    /// the link is being torn down at that point, so no peer loop will
    /// parse past it.
    pub async fn send_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(LinkError::Closed),
            result = self.half.write_all(data) => result.map_err(LinkError::Send),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_info_display() {
        let info = ConnectionInfo::new("192.168.43.161", 5050);
        assert_eq!(info.to_string(), "192.168.43.161:5050");
        assert_eq!(info.host(), "192.168.43.161");
        assert_eq!(info.port(), 5050);
    }

    #[tokio::test]
    async fn connect_refused_is_typed() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let info = ConnectionInfo::new("127.0.0.1", port);
        let err = Connection::connect(&info).await.unwrap_err();
        assert!(matches!(err, LinkError::Connect { .. }));
    }
}
