//! Transfer module for the FTP client
//!
//! Negotiates passive-mode data connections. Each data connection serves a
//! single command and is closed by its owner when that command completes.

pub mod passive;
pub mod results;

pub use passive::{open_data_connection, parse_pasv_reply};
pub use results::DataEndpoint;
