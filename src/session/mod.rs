//! Control session management
//!
//! Owns the control connection's lifecycle: connect, banner, login, feature
//! detection and the command/reply primitive every operation is built on.

pub mod control;
pub mod events;
pub mod state;

pub use control::{ControlSession, SessionGuard};
pub use events::ClientEvent;
pub use state::{ControlChannel, SessionState};
