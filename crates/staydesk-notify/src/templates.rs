//! Notification message generators
//!
//! Each business event has a subject and body template. Templates use
//! `${name}` placeholders, filled from the booking or payment the event is
//! about.

use serde::{Deserialize, Serialize};
use staydesk_core::{Booking, Payment};

/// Business events that produce a guest-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    BookingConfirmed,
    BookingCancelled,
    PaymentReceived,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::BookingConfirmed => "booking_confirmed",
            NotificationEvent::BookingCancelled => "booking_cancelled",
            NotificationEvent::PaymentReceived => "payment_received",
        }
    }
}

/// A rendered message, ready for a `Notifier`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub event: NotificationEvent,
    /// Guest the message is addressed to, when the booking names one
    pub recipient: Option<String>,
    pub booking_id: String,
    pub subject: String,
    pub body: String,
}

/// Configuration for guest notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Enable/disable notifications globally
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Name the messages are signed with
    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default = "default_confirmed_template")]
    pub booking_confirmed: String,

    #[serde(default = "default_cancelled_template")]
    pub booking_cancelled: String,

    #[serde(default = "default_payment_template")]
    pub payment_received: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sender: default_sender(),
            booking_confirmed: default_confirmed_template(),
            booking_cancelled: default_cancelled_template(),
            payment_received: default_payment_template(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sender() -> String {
    "The Front Desk".to_string()
}

fn default_confirmed_template() -> String {
    "Your stay in room ${room_id} from ${check_in} to ${check_out} (${nights} nights) \
     is confirmed. Reference: ${booking_id}. - ${sender}"
        .to_string()
}

fn default_cancelled_template() -> String {
    "Your booking ${booking_id} for room ${room_id} from ${check_in} to ${check_out} \
     has been cancelled. - ${sender}"
        .to_string()
}

fn default_payment_template() -> String {
    "We received your payment of ${amount} ${currency} for booking ${booking_id}. \
     Thank you. - ${sender}"
        .to_string()
}

/// Substitute `${name}` placeholders; unknown placeholders are left as-is
///
/// The template is scanned once, so substituted values are never expanded
/// again.
pub fn substitute_template_variables(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        let name = &after[..end];
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn booking_vars(booking: &Booking, sender: &str) -> Vec<(&'static str, String)> {
    let nights = (booking.check_out - booking.check_in).num_days();
    vec![
        ("booking_id", booking.id.clone()),
        ("room_id", booking.room_id.clone()),
        ("check_in", booking.check_in.to_string()),
        ("check_out", booking.check_out.to_string()),
        ("nights", nights.to_string()),
        ("sender", sender.to_string()),
    ]
}

impl NotificationConfig {
    pub fn booking_confirmed(&self, booking: &Booking) -> Notification {
        Notification {
            event: NotificationEvent::BookingConfirmed,
            recipient: booking.guest_id.clone(),
            booking_id: booking.id.clone(),
            subject: format!("Booking {} confirmed", booking.id),
            body: substitute_template_variables(
                &self.booking_confirmed,
                &booking_vars(booking, &self.sender),
            ),
        }
    }

    pub fn booking_cancelled(&self, booking: &Booking) -> Notification {
        Notification {
            event: NotificationEvent::BookingCancelled,
            recipient: booking.guest_id.clone(),
            booking_id: booking.id.clone(),
            subject: format!("Booking {} cancelled", booking.id),
            body: substitute_template_variables(
                &self.booking_cancelled,
                &booking_vars(booking, &self.sender),
            ),
        }
    }

    pub fn payment_received(&self, payment: &Payment, booking: &Booking) -> Notification {
        let mut vars = booking_vars(booking, &self.sender);
        vars.push(("amount", format!("{:.2}", payment.amount)));
        vars.push(("currency", payment.currency.clone()));
        vars.push(("payment_id", payment.id.clone()));
        Notification {
            event: NotificationEvent::PaymentReceived,
            recipient: booking.guest_id.clone(),
            booking_id: booking.id.clone(),
            subject: format!("Payment received for booking {}", booking.id),
            body: substitute_template_variables(&self.payment_received, &vars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use staydesk_core::{BookingStatus, PaymentStatus};

    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: "bk-1".to_string(),
            room_id: "12".to_string(),
            guest_id: Some("guest-9".to_string()),
            check_in: "2025-12-01".parse().unwrap(),
            check_out: "2025-12-05".parse().unwrap(),
            total_price: Some(480.0),
            status: BookingStatus::Confirmed,
            source: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_substitute_all_variables() {
        let result = substitute_template_variables(
            "Room ${room} on ${day}",
            &[("room", "101".to_string()), ("day", "Monday".to_string())],
        );
        assert_eq!(result, "Room 101 on Monday");
    }

    #[test]
    fn test_unknown_placeholder_left_intact() {
        let result = substitute_template_variables("Hi ${guest}", &[("room", "1".to_string())]);
        assert_eq!(result, "Hi ${guest}");
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let result = substitute_template_variables(
            "Booking ${booking_id} from ${sender} ${oops",
            &[
                ("booking_id", "${sender}".to_string()),
                ("sender", "Front Desk".to_string()),
            ],
        );
        assert_eq!(result, "Booking ${sender} from Front Desk ${oops");
    }

    #[test]
    fn test_booking_id_with_placeholder_text() {
        let mut b = booking();
        b.id = "bk-${room_id}".to_string();
        let notification = NotificationConfig::default().booking_confirmed(&b);
        assert!(notification.body.contains("bk-${room_id}"));
    }

    #[test]
    fn test_booking_confirmed_message() {
        let config = NotificationConfig::default();
        let n = config.booking_confirmed(&booking());
        assert_eq!(n.event, NotificationEvent::BookingConfirmed);
        assert_eq!(n.recipient.as_deref(), Some("guest-9"));
        assert!(n.body.contains("room 12"));
        assert!(n.body.contains("2025-12-01"));
        assert!(n.body.contains("(4 nights)"));
        assert!(n.body.contains("The Front Desk"));
        assert!(!n.body.contains("${"));
    }

    #[test]
    fn test_payment_received_message() {
        let config = NotificationConfig {
            sender: "Hotel Aurora".to_string(),
            ..Default::default()
        };
        let payment = Payment {
            id: "pay-1".to_string(),
            booking_id: "bk-1".to_string(),
            amount: 120.5,
            currency: "EUR".to_string(),
            status: PaymentStatus::Completed,
            method: Some("card".to_string()),
            transaction_id: None,
            created_at: Utc::now(),
        };
        let n = config.payment_received(&payment, &booking());
        assert!(n.body.contains("120.50 EUR"));
        assert!(n.body.contains("Hotel Aurora"));
    }

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config: NotificationConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.enabled);
        assert!(config.booking_cancelled.contains("${booking_id}"));
    }
}
