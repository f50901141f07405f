//! FTP client operations
//!
//! Composes the control session and passive negotiation into listing,
//! directory creation and upload.

pub mod listing;
pub mod operations;
pub mod path;

pub use listing::ListKind;
pub use operations::FtpClient;
pub use path::RemotePath;
