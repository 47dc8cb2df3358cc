//! StayDesk notifications
//!
//! Message generators for booking events and the delivery seam:
//! - Pure template rendering per event (`templates`)
//! - The `Notifier` trait plus a tracing-backed `LogNotifier` (`notifier`)
//!
//! Actual email/SMS transport lives outside this workspace; a deployment
//! plugs one in by implementing `Notifier`.

pub mod notifier;
pub mod templates;

pub use notifier::{LogNotifier, Notifier};
pub use templates::{
    Notification, NotificationConfig, NotificationEvent, substitute_template_variables,
};
