//! Module `socket`
//!
//! Provides `FtpSocket`, a thin wrapper over a tokio `TcpStream` in which
//! every connect, read and write is bounded by an explicit timeout. Timeouts
//! and socket errors surface as `TransportError` values, never panics.

use log::{debug, trace, warn};
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::error::TransportError;
use crate::transport::TextEncoding;

/// Size of a single receive submission.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// Size of a single send submission.
pub const SEND_BUFFER_SIZE: usize = 8192;

/// Independent per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub receive: Duration,
    pub send: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            receive: Duration::from_secs(10),
            send: Duration::from_secs(10),
        }
    }
}

/// What a zero-time look at a connection found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Open with nothing waiting to be read.
    Idle,
    /// Open, but the peer sent bytes nobody asked for.
    Pending,
    /// Closed by the peer or failed.
    Closed,
}

/// One network socket, either the control connection or a data connection.
#[derive(Debug)]
pub struct FtpSocket {
    host: String,
    port: u16,
    encoding: TextEncoding,
    stream: Option<TcpStream>,
    closed: bool,
}

impl FtpSocket {
    /// Creates a socket for `host:port`. Nothing is opened until `connect`.
    pub fn new(host: impl Into<String>, port: u16, encoding: TextEncoding) -> Self {
        Self {
            host: host.into(),
            port,
            encoding,
            stream: None,
            closed: false,
        }
    }

    // --- Accessors ---

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Returns `host:port` for log messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True once connected and until the peer closed or an I/O error occurred.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some() && !self.closed
    }

    /// Address of the remote peer, if connected.
    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.stream
            .as_ref()
            .and_then(|s| s.peer_addr().ok())
            .map(|addr| addr.ip())
    }

    // --- Operations ---

    /// Opens the connection, waiting at most `timeout`.
    pub async fn connect(&mut self, timeout: Duration) -> Result<(), TransportError> {
        debug!("Connecting to {}", self.endpoint());
        let result = time::timeout(timeout, TcpStream::connect((self.host.as_str(), self.port))).await;

        match result {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to disable Nagle on {}: {}", self.endpoint(), e);
                }
                self.stream = Some(stream);
                self.closed = false;
                Ok(())
            }
            Ok(Err(e)) => Err(TransportError::Io(e)),
            Err(_) => Err(TransportError::Timeout { operation: "connect" }),
        }
    }

    /// Writes the whole payload in `SEND_BUFFER_SIZE` chunks. Each chunk gets
    /// the full `timeout`; a timed out or failed chunk aborts the send.
    pub async fn send(&mut self, data: &[u8], timeout: Duration) -> Result<(), TransportError> {
        for chunk in data.chunks(SEND_BUFFER_SIZE) {
            self.send_chunk(chunk, timeout).await?;
        }
        Ok(())
    }

    /// Streams `source` until it is exhausted. Returns the number of bytes sent.
    pub async fn send_from<R>(
        &mut self,
        source: &mut R,
        timeout: Duration,
    ) -> Result<u64, TransportError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buffer = vec![0u8; SEND_BUFFER_SIZE];
        let mut total = 0u64;

        loop {
            // Stop on an empty read, not a short one: sources of exactly
            // N * SEND_BUFFER_SIZE bytes must still terminate.
            let read = source.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            self.send_chunk(&buffer[..read], timeout).await?;
            total += read as u64;
        }

        Ok(total)
    }

    async fn send_chunk(&mut self, chunk: &[u8], timeout: Duration) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;
        let result = time::timeout(timeout, stream.write_all(chunk)).await;

        match result {
            Ok(Ok(())) => {
                trace!("Sent {} bytes to {}", chunk.len(), self.endpoint());
                Ok(())
            }
            Ok(Err(e)) => {
                self.closed = true;
                Err(TransportError::Io(e))
            }
            Err(_) => Err(TransportError::Timeout { operation: "send" }),
        }
    }

    /// Performs a single read of at most `RECEIVE_BUFFER_SIZE` bytes and
    /// returns the raw bytes. The caller decides when a message is complete;
    /// a timeout or a closed connection with nothing read is an error.
    pub async fn receive_chunk(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream_mut()?;
        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];

        match time::timeout(timeout, stream.read(&mut buffer)).await {
            Err(_) => Err(TransportError::Timeout { operation: "receive" }),
            Ok(Err(e)) => {
                self.closed = true;
                Err(TransportError::Io(e))
            }
            Ok(Ok(0)) => {
                self.closed = true;
                Err(TransportError::ConnectionClosed)
            }
            Ok(Ok(read)) => {
                trace!("Received {} bytes from {}", read, self.endpoint());
                Ok(buffer[..read].to_vec())
            }
        }
    }

    /// Reads until the peer closes the connection; each read is bounded by
    /// `timeout`. Used for data-channel payloads.
    pub async fn read_to_end(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream_mut()?;
        let mut accumulated = Vec::new();
        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];

        loop {
            let result = time::timeout(timeout, stream.read(&mut buffer)).await;
            match result {
                Ok(Ok(0)) => break,
                Ok(Ok(read)) => accumulated.extend_from_slice(&buffer[..read]),
                Ok(Err(e)) => return Err(TransportError::Io(e)),
                Err(_) => return Err(TransportError::Timeout { operation: "receive" }),
            }
        }

        self.closed = true;
        Ok(accumulated)
    }

    /// Looks at the connection without any network round trip: a zero-time
    /// peek tells an idle socket from one holding unread bytes or one the
    /// peer closed.
    pub async fn liveness(&mut self) -> Liveness {
        if self.closed {
            return Liveness::Closed;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Liveness::Closed;
        };

        let mut peeked = [0u8; 1];
        let liveness = match time::timeout(Duration::ZERO, stream.peek(&mut peeked)).await {
            Err(_) => Liveness::Idle,
            Ok(Ok(0)) | Ok(Err(_)) => Liveness::Closed,
            Ok(Ok(_)) => Liveness::Pending,
        };

        if liveness == Liveness::Closed {
            self.closed = true;
        }
        liveness
    }

    /// True unless the peer closed the connection or it failed.
    pub async fn is_alive(&mut self) -> bool {
        self.liveness().await != Liveness::Closed
    }

    /// Flushes and shuts the connection down. Safe to call more than once.
    pub async fn shutdown(&mut self, timeout: Duration) {
        if let Some(mut stream) = self.stream.take() {
            match time::timeout(timeout, stream.shutdown()).await {
                Ok(Ok(())) => debug!("Closed connection to {}", self.endpoint()),
                Ok(Err(e)) => debug!("Shutdown of {} reported: {}", self.endpoint(), e),
                Err(_) => warn!("Timed out closing connection to {}", self.endpoint()),
            }
        }
        self.closed = true;
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}
