//! Transport layer
//!
//! Wraps a single TCP socket (control or data) with timeout-bounded
//! connect, send and receive, and owns byte-to-text decoding.

pub mod encoding;
pub mod socket;

pub use encoding::TextEncoding;
pub use socket::{FtpSocket, Liveness, RECEIVE_BUFFER_SIZE, SEND_BUFFER_SIZE, Timeouts};
