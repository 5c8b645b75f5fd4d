//! Notification sinks
//!
//! The dispatch loop never waits on a consumer: a full channel drops the
//! notification and logs it, so delivery is at-most-once.

use crate::events::Notification;
use tokio::sync::mpsc;
use tracing::{error, trace};

/// Receiver of registry notifications (typically a UI event bus)
pub trait NotificationSink: Send + Sync + 'static {
    fn emit(&self, notification: Notification);
}

impl NotificationSink for mpsc::Sender<Notification> {
    fn emit(&self, notification: Notification) {
        trace!("Emitting notification: {}", notification);
        if let Err(e) = self.try_send(notification) {
            error!("Failed to deliver notification: {}", e);
        }
    }
}

impl NotificationSink for mpsc::UnboundedSender<Notification> {
    fn emit(&self, notification: Notification) {
        trace!("Emitting notification: {}", notification);
        if let Err(e) = self.send(notification) {
            error!("Failed to deliver notification: {}", e);
        }
    }
}
