//! Notification delivery

use async_trait::async_trait;
use tracing::info;

use crate::templates::Notification;

/// Delivery seam for rendered notifications.
///
/// Returns `true` when the message was handed off successfully. Callers
/// treat delivery as best effort and never fail a booking operation on it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> bool;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> bool {
        info!(
            event = notification.event.as_str(),
            booking_id = %notification.booking_id,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            subject = %notification.subject,
            "notification: {}",
            notification.body
        );
        true
    }
}
