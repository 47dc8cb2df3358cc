//! Booking amendments from the generic update surface

use chrono::Utc;
use staydesk_core::{Booking, BookingStatus, Error, Result, StayRange, TenantId};
use tracing::info;

use crate::request::{BookingRequest, parse_date, present};
use crate::service::BookingService;

impl BookingService {
    /// Merge `changes` over the stored booking and write it back.
    ///
    /// Fields absent from `changes` keep their stored value. The merged stay
    /// is re-checked against every other booking of the (possibly new) room,
    /// and a status change must be a legal lifecycle step.
    ///
    /// # Errors
    /// - `Error::NotFound` if the booking does not exist
    /// - `Error::Validation` for bad dates or an empty/inverted stay
    /// - `Error::UnknownReference` if the booking moves to an unknown room
    /// - `Error::Domain` for an illegal status change
    /// - `Error::Conflict` if the new stay overlaps another booking
    pub async fn amend_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
        changes: BookingRequest,
    ) -> Result<Booking> {
        let current = self
            .store
            .get_booking(tenant_id, booking_id)
            .await?
            .ok_or_else(|| Error::not_found("Booking", booking_id))?;

        if let Some(id) = present(&changes.id)
            && id != booking_id
        {
            return Err(Error::Validation(format!(
                "Body id '{}' does not match booking {}",
                id, booking_id
            )));
        }

        let mut next = current.clone();
        if let Some(room_id) = present(&changes.room_id) {
            next.room_id = room_id.to_string();
        }
        if let Some(raw) = present(&changes.check_in) {
            next.check_in = parse_date("check_in", raw)?;
        }
        if let Some(raw) = present(&changes.check_out) {
            next.check_out = parse_date("check_out", raw)?;
        }
        StayRange::new(next.check_in, next.check_out).map_err(|_| {
            Error::Validation(format!(
                "check_in ({}) must be before check_out ({})",
                next.check_in, next.check_out
            ))
        })?;

        if let Some(raw) = present(&changes.status) {
            let target: BookingStatus = raw.parse()?;
            if target != current.status && !current.status.can_transition_to(target) {
                return Err(Error::Domain(format!(
                    "Cannot move booking {} from {} to {}",
                    booking_id, current.status, target
                )));
            }
            next.status = target;
        }

        if let Some(price) = changes.total_price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::Validation(
                    "total_price must be a non-negative number".to_string(),
                ));
            }
            next.total_price = Some(price);
        }
        if let Some(guest_id) = present(&changes.guest_id) {
            next.guest_id = Some(guest_id.to_string());
        }
        if let Some(source) = present(&changes.source) {
            next.source = Some(source.to_string());
        }
        if changes.notes.is_some() {
            next.notes = changes.notes.filter(|n| !n.trim().is_empty());
        }

        if next.room_id != current.room_id
            && self.store.get_room(tenant_id, &next.room_id).await?.is_none()
        {
            return Err(Error::UnknownReference {
                kind: "room",
                id: next.room_id,
            });
        }

        next.updated_at = Utc::now();
        let booking = self
            .store
            .update_booking(tenant_id, next, current.status)
            .await?;
        info!(booking_id, room_id = %booking.room_id, status = %booking.status, "Booking amended");
        Ok(booking)
    }
}
