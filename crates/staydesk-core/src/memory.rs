//! In-memory `BookingStore`
//!
//! All tables live behind one mutex, so every conflict check and the write
//! that follows it observe the same snapshot.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::{
    Error, Result,
    booking_store::{BookingStore, Record, decode, payable_booking, record_id},
    resource::ResourceKind,
    tenant::{TenantId, partition_key},
    types::{Booking, BookingStatus, Payment},
};

type Table = BTreeMap<String, Record>;
type Tables = HashMap<(String, ResourceKind), Table>;

#[derive(Default)]
pub struct MemoryBookingStore {
    tables: Mutex<Tables>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn key(tenant_id: Option<&TenantId>, kind: ResourceKind) -> (String, ResourceKind) {
    (partition_key(tenant_id).to_string(), kind)
}

fn bookings_of_room(table: Option<&Table>, room_id: &str) -> Result<Vec<Booking>> {
    let Some(table) = table else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for record in table.values() {
        if record.get("room_id").and_then(|v| v.as_str()) == Some(room_id) {
            out.push(decode(record.clone())?);
        }
    }
    Ok(out)
}

fn stored_booking(
    tables: &Tables,
    tenant_id: Option<&TenantId>,
    booking_id: &str,
) -> Result<Option<Booking>> {
    tables
        .get(&key(tenant_id, ResourceKind::Bookings))
        .and_then(|t| t.get(booking_id))
        .cloned()
        .map(decode)
        .transpose()
}

fn conflict_error(booking: &Booking) -> Error {
    Error::Conflict {
        room_id: booking.room_id.clone(),
        check_in: booking.check_in,
        check_out: booking.check_out,
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn list_records(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
    ) -> Result<Vec<Record>> {
        let tables = self.lock()?;
        Ok(tables
            .get(&key(tenant_id, kind))
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Record>> {
        let tables = self.lock()?;
        Ok(tables
            .get(&key(tenant_id, kind))
            .and_then(|t| t.get(id))
            .cloned())
    }

    async fn insert_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        record: Record,
    ) -> Result<Record> {
        let id = record_id(&record)?.to_string();
        let mut tables = self.lock()?;
        let table = tables.entry(key(tenant_id, kind)).or_default();
        if table.contains_key(&id) {
            return Err(Error::Domain(format!(
                "{} {} already exists",
                kind.label(),
                id
            )));
        }
        table.insert(id, record.clone());
        Ok(record)
    }

    async fn replace_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
        record: Record,
    ) -> Result<Record> {
        let mut tables = self.lock()?;
        let slot = tables
            .get_mut(&key(tenant_id, kind))
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| Error::not_found(kind.label(), id))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<()> {
        let mut tables = self.lock()?;
        tables
            .get_mut(&key(tenant_id, kind))
            .and_then(|t| t.remove(id))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(kind.label(), id))
    }

    async fn room_bookings(
        &self,
        tenant_id: Option<&TenantId>,
        room_id: &str,
    ) -> Result<Vec<Booking>> {
        let tables = self.lock()?;
        bookings_of_room(tables.get(&key(tenant_id, ResourceKind::Bookings)), room_id)
    }

    async fn insert_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
    ) -> Result<Booking> {
        let record = serde_json::to_value(&booking)?;
        let mut tables = self.lock()?;
        let table = tables
            .entry(key(tenant_id, ResourceKind::Bookings))
            .or_default();

        if table.contains_key(&booking.id) {
            return Err(Error::Domain(format!("Booking {} already exists", booking.id)));
        }
        let existing = bookings_of_room(Some(&*table), &booking.room_id)?;
        if existing.iter().any(|other| other.conflicts_with(&booking)) {
            return Err(conflict_error(&booking));
        }

        table.insert(booking.id.clone(), record);
        Ok(booking)
    }

    async fn update_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
        expected_status: BookingStatus,
    ) -> Result<Booking> {
        let record = serde_json::to_value(&booking)?;
        let mut tables = self.lock()?;
        let table = tables
            .get_mut(&key(tenant_id, ResourceKind::Bookings))
            .ok_or_else(|| Error::not_found("Booking", &booking.id))?;

        let current: Booking = match table.get(&booking.id) {
            Some(record) => decode(record.clone())?,
            None => return Err(Error::not_found("Booking", &booking.id)),
        };
        if current.status != expected_status {
            return Err(Error::Domain(format!(
                "Booking {} is {}, expected {}",
                booking.id, current.status, expected_status
            )));
        }
        let existing = bookings_of_room(Some(&*table), &booking.room_id)?;
        if existing.iter().any(|other| other.conflicts_with(&booking)) {
            return Err(conflict_error(&booking));
        }

        table.insert(booking.id.clone(), record);
        Ok(booking)
    }

    async fn insert_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)> {
        let record = serde_json::to_value(&payment)?;
        let mut tables = self.lock()?;
        let booking = payable_booking(
            stored_booking(&tables, tenant_id, &payment.booking_id)?,
            &payment.booking_id,
        )?;

        let table = tables
            .entry(key(tenant_id, ResourceKind::Payments))
            .or_default();
        if table.contains_key(&payment.id) {
            return Err(Error::Domain(format!("Payment {} already exists", payment.id)));
        }
        table.insert(payment.id.clone(), record);
        Ok((payment, booking))
    }

    async fn replace_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)> {
        let record = serde_json::to_value(&payment)?;
        let mut tables = self.lock()?;
        let exists = tables
            .get(&key(tenant_id, ResourceKind::Payments))
            .is_some_and(|t| t.contains_key(&payment.id));
        if !exists {
            return Err(Error::not_found("Payment", &payment.id));
        }
        let booking = payable_booking(
            stored_booking(&tables, tenant_id, &payment.booking_id)?,
            &payment.booking_id,
        )?;

        tables
            .entry(key(tenant_id, ResourceKind::Payments))
            .or_default()
            .insert(payment.id.clone(), record);
        Ok((payment, booking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn booking(id: &str, room: &str, check_in: &str, check_out: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            room_id: room.to_string(),
            guest_id: None,
            check_in: check_in.parse::<NaiveDate>().unwrap(),
            check_out: check_out.parse::<NaiveDate>().unwrap(),
            total_price: Some(400.0),
            status: BookingStatus::Queued,
            source: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_record_crud() {
        let store = MemoryBookingStore::new();
        store
            .insert_record(None, ResourceKind::Guests, json!({"id": "g1", "name": "Ada"}))
            .await
            .unwrap();

        let fetched = store.get_record(None, ResourceKind::Guests, "g1").await.unwrap();
        assert_eq!(fetched.unwrap()["name"], "Ada");

        store
            .replace_record(None, ResourceKind::Guests, "g1", json!({"id": "g1", "name": "Grace"}))
            .await
            .unwrap();
        let all = store.list_records(None, ResourceKind::Guests).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["name"], "Grace");

        store.delete_record(None, ResourceKind::Guests, "g1").await.unwrap();
        assert!(matches!(
            store.delete_record(None, ResourceKind::Guests, "g1").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_record_rejected() {
        let store = MemoryBookingStore::new();
        store
            .insert_record(None, ResourceKind::Staff, json!({"id": "s1"}))
            .await
            .unwrap();
        let result = store
            .insert_record(None, ResourceKind::Staff, json!({"id": "s1"}))
            .await;
        assert!(matches!(result, Err(Error::Domain(_))));
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let store = MemoryBookingStore::new();
        let acme = TenantId::from_string("acme").unwrap();
        store
            .insert_record(Some(&acme), ResourceKind::Rooms, json!({"id": "1", "number": "101"}))
            .await
            .unwrap();

        assert!(store.get_room(None, "1").await.unwrap().is_none());
        assert!(store.get_room(Some(&acme), "1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_booking_detects_overlap() {
        let store = MemoryBookingStore::new();
        store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();

        let clash = store
            .insert_booking(None, booking("b", "1", "2025-12-04", "2025-12-08"))
            .await;
        assert!(matches!(clash, Err(Error::Conflict { .. })));

        store
            .insert_booking(None, booking("c", "1", "2025-12-05", "2025-12-08"))
            .await
            .unwrap();
        assert_eq!(store.room_bookings(None, "1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_booking_compare_and_set() {
        let store = MemoryBookingStore::new();
        let original = store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();

        let mut confirmed = original.clone();
        confirmed.status = BookingStatus::Confirmed;
        store
            .update_booking(None, confirmed.clone(), BookingStatus::Queued)
            .await
            .unwrap();

        // Stale expectation loses
        let result = store
            .update_booking(None, confirmed, BookingStatus::Queued)
            .await;
        assert!(matches!(result, Err(Error::Domain(_))));

        let stored = store.get_booking(None, "a").await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_update_booking_cannot_move_onto_taken_range() {
        let store = MemoryBookingStore::new();
        store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();
        let b = store
            .insert_booking(None, booking("b", "1", "2025-12-10", "2025-12-12"))
            .await
            .unwrap();

        let mut moved = b.clone();
        moved.check_in = "2025-12-03".parse().unwrap();
        let result = store.update_booking(None, moved, BookingStatus::Queued).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
    }

    fn payment(id: &str, booking_id: &str) -> Payment {
        Payment {
            id: id.to_string(),
            booking_id: booking_id.to_string(),
            amount: 120.0,
            currency: "USD".to_string(),
            status: Default::default(),
            method: None,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_payment_checks_booking() {
        let store = MemoryBookingStore::new();
        let missing = store.insert_payment(None, payment("p0", "ghost")).await;
        assert!(matches!(missing, Err(Error::UnknownReference { kind: "booking", .. })));

        store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();
        let (stored, attached) = store.insert_payment(None, payment("p1", "a")).await.unwrap();
        assert_eq!(stored.id, "p1");
        assert_eq!(attached.id, "a");

        let dup = store.insert_payment(None, payment("p1", "a")).await;
        assert!(matches!(dup, Err(Error::Domain(_))));
        assert_eq!(store.list_records(None, ResourceKind::Payments).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_booking_takes_no_payment() {
        let store = MemoryBookingStore::new();
        let mut b = store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();
        store.insert_payment(None, payment("p1", "a")).await.unwrap();

        b.status = BookingStatus::Cancelled;
        store.update_booking(None, b, BookingStatus::Queued).await.unwrap();

        let late = store.insert_payment(None, payment("p2", "a")).await;
        assert!(matches!(late, Err(Error::Domain(msg)) if msg.contains("cancelled")));
        let amended = store.replace_payment(None, payment("p1", "a")).await;
        assert!(matches!(amended, Err(Error::Domain(_))));
    }

    #[tokio::test]
    async fn test_replace_payment() {
        let store = MemoryBookingStore::new();
        store
            .insert_booking(None, booking("a", "1", "2025-12-01", "2025-12-05"))
            .await
            .unwrap();
        let missing = store.replace_payment(None, payment("p1", "a")).await;
        assert!(matches!(missing, Err(Error::NotFound { kind: "Payment", .. })));

        store.insert_payment(None, payment("p1", "a")).await.unwrap();
        let ghost = store.replace_payment(None, payment("p1", "ghost")).await;
        assert!(matches!(ghost, Err(Error::UnknownReference { .. })));

        let mut refunded = payment("p1", "a");
        refunded.amount = 80.0;
        store.replace_payment(None, refunded).await.unwrap();
        let stored = store
            .get_record(None, ResourceKind::Payments, "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["amount"], 80.0);
    }

    #[tokio::test]
    async fn test_update_missing_booking_is_not_found() {
        let store = MemoryBookingStore::new();
        let result = store
            .update_booking(None, booking("ghost", "1", "2025-12-01", "2025-12-02"), BookingStatus::Queued)
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
