//! Queued booking intake

use chrono::Utc;
use staydesk_core::{
    Booking, BookingStatus, Error, Result, StayRange, TenantId, types::new_record_id,
};
use tracing::{info, warn};

use crate::request::{BookingRequest, parse_date, present};
use crate::service::BookingService;

/// A booking request that passed field validation
#[derive(Debug, Clone)]
pub(crate) struct ValidatedBooking {
    pub room_id: String,
    pub stay: StayRange,
    pub status: BookingStatus,
}

/// Required fields, date range, status and price checks. No store access.
pub(crate) fn validate(request: &BookingRequest) -> Result<ValidatedBooking> {
    let room_id = present(&request.room_id);
    let check_in = present(&request.check_in);
    let check_out = present(&request.check_out);

    let missing: Vec<&str> = [
        ("room_id", room_id.is_none()),
        ("check_in", check_in.is_none()),
        ("check_out", check_out.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(room_id), Some(check_in), Some(check_out)) = (room_id, check_in, check_out) else {
        return Err(Error::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let check_in = parse_date("check_in", check_in)?;
    let check_out = parse_date("check_out", check_out)?;
    let stay = StayRange::new(check_in, check_out).map_err(|_| {
        Error::Validation(format!(
            "check_in ({}) must be before check_out ({})",
            check_in, check_out
        ))
    })?;

    let status = match present(&request.status) {
        Some(raw) => raw.parse::<BookingStatus>()?,
        None => BookingStatus::Queued,
    };

    if let Some(price) = request.total_price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(Error::Validation(
            "total_price must be a non-negative number".to_string(),
        ));
    }

    Ok(ValidatedBooking {
        room_id: room_id.to_string(),
        stay,
        status,
    })
}

impl BookingService {
    /// Validate a booking request, check the room is free and persist it.
    ///
    /// The booking is stored with status `queued` unless the request names
    /// one. The conflict check and the write are a single atomic store call.
    ///
    /// # Errors
    /// - `Error::Validation` for missing fields, bad dates or `check_in >= check_out`
    /// - `Error::UnknownReference` if the room does not exist
    /// - `Error::Conflict` if an overlapping booking holds the room
    pub async fn create_booking(
        &self,
        tenant_id: Option<&TenantId>,
        request: BookingRequest,
    ) -> Result<Booking> {
        let valid = validate(&request)?;

        if self.store.get_room(tenant_id, &valid.room_id).await?.is_none() {
            return Err(Error::UnknownReference {
                kind: "room",
                id: valid.room_id,
            });
        }

        let now = Utc::now();
        let booking = Booking {
            id: present(&request.id)
                .map(str::to_string)
                .unwrap_or_else(new_record_id),
            room_id: valid.room_id,
            guest_id: present(&request.guest_id).map(str::to_string),
            check_in: valid.stay.check_in(),
            check_out: valid.stay.check_out(),
            total_price: request.total_price,
            status: valid.status,
            source: present(&request.source).map(str::to_string),
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_booking(tenant_id, booking).await {
            Ok(booking) => {
                info!(
                    booking_id = %booking.id,
                    room_id = %booking.room_id,
                    stay = %valid.stay,
                    status = %booking.status,
                    "Booking accepted"
                );
                Ok(booking)
            }
            Err(e @ Error::Conflict { .. }) => {
                warn!(stay = %valid.stay, "Booking rejected: {}", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
