//! Error types
//!
//! Defines domain-specific error types for each layer of the FTP client.

use std::fmt;
use std::io;

use crate::protocol::Reply;

/// Socket-level failures: timeouts, resets, closed peers.
#[derive(Debug)]
pub enum TransportError {
    NotConnected,
    Timeout { operation: &'static str },
    ConnectionClosed,
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "Socket is not connected"),
            TransportError::Timeout { operation } => write!(f, "Timed out during {}", operation),
            TransportError::ConnectionClosed => write!(f, "Connection closed by peer"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error)
    }
}

/// Replies or requests that do not have the shape the protocol requires.
#[derive(Debug)]
pub enum ProtocolError {
    MalformedPassiveReply(String),
    InvalidArgument(String),
    NoReply,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedPassiveReply(text) => {
                write!(f, "Malformed PASV reply: {}", text)
            }
            ProtocolError::InvalidArgument(arg) => write!(f, "Invalid command argument: {:?}", arg),
            ProtocolError::NoReply => write!(f, "No status reply received"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// General client error that encompasses all error types
#[derive(Debug)]
pub enum FtpClientError {
    Transport(TransportError),
    Protocol(ProtocolError),
    Rejected(Reply),
    Authentication(String),
}

impl fmt::Display for FtpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpClientError::Transport(e) => write!(f, "Transport error: {}", e),
            FtpClientError::Protocol(e) => write!(f, "Protocol error: {}", e),
            FtpClientError::Rejected(reply) => write!(f, "Server rejected command: {}", reply),
            FtpClientError::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
        }
    }
}

impl std::error::Error for FtpClientError {}

impl From<TransportError> for FtpClientError {
    fn from(error: TransportError) -> Self {
        FtpClientError::Transport(error)
    }
}

impl From<ProtocolError> for FtpClientError {
    fn from(error: ProtocolError) -> Self {
        FtpClientError::Protocol(error)
    }
}

impl From<io::Error> for FtpClientError {
    fn from(error: io::Error) -> Self {
        FtpClientError::Transport(TransportError::Io(error))
    }
}

impl FtpClientError {
    /// Turns a reply into `Ok` when positive, otherwise into a rejection
    /// (or a transport failure for the sentinel reply).
    pub fn check(reply: Reply) -> Result<Reply, FtpClientError> {
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(FtpClientError::from_reply(reply))
        }
    }

    /// Classifies a non-positive reply.
    pub fn from_reply(reply: Reply) -> FtpClientError {
        if reply.is_transport_failure() {
            FtpClientError::Protocol(ProtocolError::NoReply)
        } else {
            FtpClientError::Rejected(reply)
        }
    }
}
