//! Error handling
//!
//! Defines error types for each layer of the FTP client and the helpers used
//! to report them at the public operation boundary.

pub mod handlers;
pub mod types;

pub use handlers::report;
pub use types::*;
