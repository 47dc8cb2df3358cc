//! Booking workflow entry point

use std::sync::Arc;

use staydesk_core::BookingStore;
use staydesk_notify::{Notification, NotificationConfig, Notifier};
use tracing::warn;

use crate::conflict::ConflictDetector;

/// Request-scoped booking operations over a shared store.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct BookingService {
    pub(crate) store: Arc<dyn BookingStore>,
    notifier: Option<Arc<dyn Notifier>>,
    pub(crate) notifications: NotificationConfig,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            notifier: None,
            notifications: NotificationConfig::default(),
        }
    }

    /// Attach a notifier; messages are only sent when `config.enabled`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, config: NotificationConfig) -> Self {
        self.notifier = Some(notifier);
        self.notifications = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    pub fn conflict_detector(&self) -> ConflictDetector {
        ConflictDetector::new(self.store.clone())
    }

    /// Best-effort delivery; failures are logged, never returned
    pub(crate) async fn notify(&self, notification: Notification) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if !self.notifications.enabled {
            return;
        }
        if !notifier.deliver(&notification).await {
            warn!(
                event = notification.event.as_str(),
                booking_id = %notification.booking_id,
                "Notification delivery failed"
            );
        }
    }
}
