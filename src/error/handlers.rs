//! Error handlers
//!
//! Logs failures at the public operation boundary, where they are converted
//! into plain success indicators.

use crate::error::types::{FtpClientError, TransportError};
use log::{error, warn};

/// Log an operation failure at a level matching its kind.
pub fn report(operation: &str, err: &FtpClientError) {
    match err {
        FtpClientError::Rejected(_) => warn!("{} refused: {}", operation, err),
        FtpClientError::Transport(TransportError::Timeout { .. }) => {
            warn!("{} failed: {}", operation, err)
        }
        _ => error!("{} failed: {}", operation, err),
    }
}
