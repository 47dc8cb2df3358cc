//! SQLite booking storage for StayDesk
//!
//! This crate implements the `BookingStore` trait on a single SQLite
//! database. Every resource is kept as a JSON document in one `records`
//! table keyed by tenant partition, resource kind and id.
//!
//! # Features
//! - WAL journal with `synchronous = NORMAL`
//! - Booking writes run under `BEGIN IMMEDIATE`, so the conflict check and
//!   the write see the same committed state
//! - Versioned schema, created on first open
//!
//! # Example
//! ```no_run
//! # use staydesk_store_sqlite::SqliteBookingStore;
//! # async fn example() -> staydesk_core::Result<()> {
//! let store = SqliteBookingStore::new("~/.staydesk/staydesk.db", 5).await?;
//! # Ok(())
//! # }
//! ```

mod sqlite_booking_store;

pub use sqlite_booking_store::{SCHEMA_VERSION, SqliteBookingStore};
