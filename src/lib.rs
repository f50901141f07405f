//! RAX FTP Client
//!
//! A passive-mode FTP client speaking the protocol over raw tokio sockets:
//! control session, reply parsing, PASV negotiation, listing, directory
//! creation and upload.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod transport;

pub use client::{FtpClient, ListKind, RemotePath};
pub use config::ClientConfig;
pub use error::FtpClientError;
pub use protocol::{Feature, FeatureSet, Reply, StatusClass};
pub use session::ClientEvent;
pub use transport::TextEncoding;
