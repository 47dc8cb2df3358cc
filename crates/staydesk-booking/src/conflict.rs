//! Booking conflict detection
//!
//! A candidate stay conflicts with an existing booking of the same room when
//! the existing booking holds the room (any status but `cancelled`) and the
//! two half-open ranges overlap.

use std::sync::Arc;

use chrono::NaiveDate;
use staydesk_core::{Booking, BookingStore, Error, Result, StayRange, TenantId};
use tracing::debug;

/// Bookings in `bookings` that hold their room over part of `stay`
pub fn overlapping<'a>(
    bookings: &'a [Booking],
    stay: &'a StayRange,
) -> impl Iterator<Item = &'a Booking> + 'a {
    bookings.iter().filter(move |b| {
        b.status.holds_room() && b.stay().map(|s| s.overlaps(stay)).unwrap_or(false)
    })
}

/// Read-only availability checks against the store
#[derive(Clone)]
pub struct ConflictDetector {
    store: Arc<dyn BookingStore>,
}

impl ConflictDetector {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Whether any booking holding `room_id` overlaps `[check_in, check_out)`
    ///
    /// # Errors
    /// - `Error::InvalidRange` if `check_in >= check_out`
    /// - `Error::NotFound` if the room does not exist
    pub async fn has_conflict(
        &self,
        tenant_id: Option<&TenantId>,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool> {
        Ok(!self
            .conflicts(tenant_id, room_id, check_in, check_out)
            .await?
            .is_empty())
    }

    /// The bookings that block `[check_in, check_out)` for `room_id`
    pub async fn conflicts(
        &self,
        tenant_id: Option<&TenantId>,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let stay = StayRange::new(check_in, check_out)?;
        if self.store.get_room(tenant_id, room_id).await?.is_none() {
            return Err(Error::not_found("Room", room_id));
        }

        let bookings = self.store.room_bookings(tenant_id, room_id).await?;
        let blocking: Vec<Booking> = overlapping(&bookings, &stay).cloned().collect();
        debug!(
            room_id,
            stay = %stay,
            existing = bookings.len(),
            blocking = blocking.len(),
            "Checked room availability"
        );
        Ok(blocking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use staydesk_core::{BookingStatus, MemoryBookingStore, ResourceKind};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn booking(id: &str, a: &str, b: &str, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            room_id: "1".to_string(),
            guest_id: None,
            check_in: date(a),
            check_out: date(b),
            total_price: None,
            status,
            source: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn detector_with(bookings: Vec<Booking>) -> ConflictDetector {
        let store = Arc::new(MemoryBookingStore::new());
        store
            .insert_record(None, ResourceKind::Rooms, json!({"id": "1", "number": "101"}))
            .await
            .unwrap();
        for b in bookings {
            store.insert_booking(None, b).await.unwrap();
        }
        ConflictDetector::new(store)
    }

    #[tokio::test]
    async fn test_overlap_with_confirmed_booking() {
        let detector = detector_with(vec![booking(
            "a",
            "2025-12-01",
            "2025-12-05",
            BookingStatus::Confirmed,
        )])
        .await;

        assert!(detector
            .has_conflict(None, "1", date("2025-12-04"), date("2025-12-08"))
            .await
            .unwrap());
        assert!(!detector
            .has_conflict(None, "1", date("2025-12-05"), date("2025-12-08"))
            .await
            .unwrap());
        assert!(!detector
            .has_conflict(None, "1", date("2025-11-28"), date("2025-12-01"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_checked_in_and_queued_block_cancelled_does_not() {
        let detector = detector_with(vec![
            booking("in", "2025-12-01", "2025-12-03", BookingStatus::CheckedIn),
            booking("q", "2025-12-10", "2025-12-12", BookingStatus::Queued),
            booking("x", "2025-12-20", "2025-12-25", BookingStatus::Cancelled),
        ])
        .await;

        for (a, b, expected) in [
            ("2025-12-02", "2025-12-04", true),
            ("2025-12-11", "2025-12-13", true),
            ("2025-12-21", "2025-12-22", false),
        ] {
            assert_eq!(
                detector.has_conflict(None, "1", date(a), date(b)).await.unwrap(),
                expected,
                "{} -> {}",
                a,
                b
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_range() {
        let detector = detector_with(vec![]).await;
        let result = detector
            .has_conflict(None, "1", date("2025-12-05"), date("2025-12-05"))
            .await;
        assert!(matches!(result, Err(Error::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let detector = detector_with(vec![]).await;
        let result = detector
            .has_conflict(None, "404", date("2025-12-01"), date("2025-12-02"))
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_conflicts_lists_blocking_bookings() {
        let detector = detector_with(vec![
            booking("a", "2025-12-01", "2025-12-03", BookingStatus::Confirmed),
            booking("b", "2025-12-03", "2025-12-06", BookingStatus::Queued),
        ])
        .await;
        let blocking = detector
            .conflicts(None, "1", date("2025-12-02"), date("2025-12-04"))
            .await
            .unwrap();
        let ids: Vec<&str> = blocking.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
