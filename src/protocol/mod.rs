//! FTP protocol implementation
//!
//! Command formatting, reply parsing and feature detection. Nothing in here
//! touches a socket.

pub mod commands;
pub mod features;
pub mod reply;

pub use commands::{Command, parse_command};
pub use features::{Feature, FeatureSet};
pub use reply::{Reply, ReplyParser, StatusClass};
