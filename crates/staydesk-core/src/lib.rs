//! StayDesk Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout StayDesk:
//! - Room, booking and payment records with the booking status lifecycle
//! - Tenant (company) scoping
//! - The `BookingStore` persistence trait and an in-memory implementation
//! - Core error types

pub mod booking_store;
pub mod error;
pub mod memory;
pub mod resource;
pub mod tenant;
pub mod types;

pub use booking_store::{BookingStore, Record};
pub use error::{Error, Result};
pub use memory::MemoryBookingStore;
pub use resource::ResourceKind;
pub use tenant::TenantId;
pub use types::{
    Booking, BookingStatus, Payment, PaymentStatus, Room, RoomStatus, StayRange,
};
