//! Booking confirmation and front-desk transitions
//!
//! Re-applying a booking's current status is a successful no-op: confirming
//! an already confirmed booking returns it unchanged without a write. Every
//! other move must be a legal single step of the lifecycle.

use chrono::Utc;
use serde::Serialize;
use staydesk_core::{Booking, BookingStatus, Error, Result, TenantId};
use tracing::info;

use crate::service::BookingService;

/// Result of a status transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub booking: Booking,
    /// False when the booking was already in the target status
    pub changed: bool,
}

impl TransitionOutcome {
    /// Human-readable summary for API responses
    pub fn message(&self) -> String {
        if self.changed {
            format!("Booking {} is now {}", self.booking.id, self.booking.status)
        } else {
            format!("Booking {} was already {}", self.booking.id, self.booking.status)
        }
    }
}

impl BookingService {
    /// Move a queued booking to `confirmed`.
    ///
    /// # Errors
    /// - `Error::NotFound` if no booking has this id
    /// - `Error::Domain` if the booking is checked in, checked out or cancelled
    pub async fn confirm_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
    ) -> Result<TransitionOutcome> {
        let outcome = self
            .transition(tenant_id, booking_id, BookingStatus::Confirmed)
            .await?;
        if outcome.changed {
            self.notify(self.notifications.booking_confirmed(&outcome.booking))
                .await;
        }
        Ok(outcome)
    }

    pub async fn check_in(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
    ) -> Result<TransitionOutcome> {
        self.transition(tenant_id, booking_id, BookingStatus::CheckedIn)
            .await
    }

    pub async fn check_out(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
    ) -> Result<TransitionOutcome> {
        self.transition(tenant_id, booking_id, BookingStatus::CheckedOut)
            .await
    }

    /// Cancel a booking, releasing its room for the stay
    pub async fn cancel_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
    ) -> Result<TransitionOutcome> {
        let outcome = self
            .transition(tenant_id, booking_id, BookingStatus::Cancelled)
            .await?;
        if outcome.changed {
            self.notify(self.notifications.booking_cancelled(&outcome.booking))
                .await;
        }
        Ok(outcome)
    }

    /// Apply one lifecycle step with a compare-and-set on the prior status
    pub async fn transition(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
        target: BookingStatus,
    ) -> Result<TransitionOutcome> {
        let current = self
            .store
            .get_booking(tenant_id, booking_id)
            .await?
            .ok_or_else(|| Error::not_found("Booking", booking_id))?;

        if current.status == target {
            return Ok(TransitionOutcome {
                booking: current,
                changed: false,
            });
        }
        if !current.status.can_transition_to(target) {
            return Err(Error::Domain(format!(
                "Cannot move booking {} from {} to {}",
                booking_id, current.status, target
            )));
        }

        let from = current.status;
        let mut next = current;
        next.status = target;
        next.updated_at = Utc::now();
        let booking = self.store.update_booking(tenant_id, next, from).await?;

        info!(booking_id, from = %from, to = %target, "Booking status changed");
        Ok(TransitionOutcome {
            booking,
            changed: true,
        })
    }
}
