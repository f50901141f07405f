//! Notifications published by a session.

use tokio::sync::broadcast;

/// Number of undelivered events kept per subscriber.
pub const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Login was refused or could not be completed.
    AuthenticationFailed { message: String },
}

/// Publishes without waiting; having no subscribers is fine.
pub(crate) fn publish(sender: &broadcast::Sender<ClientEvent>, event: ClientEvent) {
    if sender.send(event).is_err() {
        log::trace!("No subscribers for client event");
    }
}
