//! Persistence accessor trait
//!
//! The `BookingStore` trait abstracts the relational store behind the
//! workflow: generic record access keyed by resource kind and tenant, plus
//! the booking writes that must be atomic with their conflict check.

use async_trait::async_trait;

use crate::{
    Error, Result,
    resource::ResourceKind,
    tenant::TenantId,
    types::{Booking, BookingStatus, Payment, Room},
};

/// A stored record: a JSON object with a string `id` field
pub type Record = serde_json::Value;

/// Store trait
///
/// Implementations:
/// - `MemoryBookingStore`: in-process maps (tests, ephemeral deployments)
/// - `SqliteBookingStore`: SQLite database
///
/// # Example
/// ```no_run
/// # use staydesk_core::booking_store::BookingStore;
/// # use staydesk_core::resource::ResourceKind;
/// # use staydesk_core::tenant::TenantId;
/// # async fn example(store: &dyn BookingStore) -> staydesk_core::Result<()> {
/// // Single-tenant mode
/// let rooms = store.list_records(None, ResourceKind::Rooms).await?;
///
/// // Multi-tenant mode
/// let tenant_id = TenantId::from_string("acme")?;
/// let rooms = store.list_records(Some(&tenant_id), ResourceKind::Rooms).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// List all records of a kind, ordered by id
    async fn list_records(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
    ) -> Result<Vec<Record>>;

    /// Fetch a single record, `None` if absent
    async fn get_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Record>>;

    /// Insert a new record. The record's `id` must be set.
    ///
    /// # Errors
    /// - `Error::Domain` if a record with that id already exists
    async fn insert_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        record: Record,
    ) -> Result<Record>;

    /// Replace an existing record
    ///
    /// # Errors
    /// - `Error::NotFound` if the record does not exist
    async fn replace_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
        record: Record,
    ) -> Result<Record>;

    /// Delete a record
    ///
    /// # Errors
    /// - `Error::NotFound` if the record does not exist
    async fn delete_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<()>;

    /// All bookings for a room, any status
    async fn room_bookings(
        &self,
        tenant_id: Option<&TenantId>,
        room_id: &str,
    ) -> Result<Vec<Booking>>;

    /// Insert a booking unless it conflicts with a booking already holding
    /// the room. Check and insert happen as one atomic step.
    ///
    /// # Errors
    /// - `Error::Conflict` if an overlapping booking holds the room
    /// - `Error::Domain` if the id is already taken
    async fn insert_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
    ) -> Result<Booking>;

    /// Replace a booking whose stored status is still `expected_status`,
    /// re-checking conflicts against every other booking of its room.
    ///
    /// # Errors
    /// - `Error::NotFound` if the booking does not exist
    /// - `Error::Domain` if the stored status is no longer `expected_status`
    /// - `Error::Conflict` if the new stay overlaps another booking
    async fn update_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
        expected_status: BookingStatus,
    ) -> Result<Booking>;

    /// Cheap liveness probe of the backing store
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_room(&self, tenant_id: Option<&TenantId>, room_id: &str) -> Result<Option<Room>> {
        self.get_record(tenant_id, ResourceKind::Rooms, room_id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn get_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking_id: &str,
    ) -> Result<Option<Booking>> {
        self.get_record(tenant_id, ResourceKind::Bookings, booking_id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Insert a payment against a booking that exists and is not cancelled.
    /// The booking check and the insert happen as one atomic step. Returns
    /// the payment together with the booking it was checked against.
    ///
    /// # Errors
    /// - `Error::UnknownReference` if the booking does not exist
    /// - `Error::Domain` if the booking is cancelled or the payment id is taken
    async fn insert_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)>;

    /// Replace a stored payment, re-checking its booking the same way
    /// `insert_payment` does, in one atomic step.
    ///
    /// # Errors
    /// - `Error::NotFound` if the payment does not exist
    /// - `Error::UnknownReference` if the booking does not exist
    /// - `Error::Domain` if the booking is cancelled
    async fn replace_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)>;
}

/// Decode a stored record into a typed value
pub fn decode<T: serde::de::DeserializeOwned>(record: Record) -> Result<T> {
    serde_json::from_value(record)
        .map_err(|e| Error::Internal(format!("Stored record has unexpected shape: {}", e)))
}

/// The booking a payment points at, if it can still take payments
pub fn payable_booking(booking: Option<Booking>, booking_id: &str) -> Result<Booking> {
    let booking = booking.ok_or_else(|| Error::UnknownReference {
        kind: "booking",
        id: booking_id.to_string(),
    })?;
    if booking.status == BookingStatus::Cancelled {
        return Err(Error::Domain(format!(
            "Booking {} is cancelled and cannot take payments",
            booking.id
        )));
    }
    Ok(booking)
}

/// The `id` field of a record
pub fn record_id(record: &Record) -> Result<&str> {
    record
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::validation("record must have a non-empty string 'id'"))
}
