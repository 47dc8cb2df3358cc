//! StayDesk booking workflow
//!
//! This crate owns the one correctness property of the system: for a given
//! room, no two bookings that hold the room may have overlapping stays.
//!
//! - `conflict`: half-open overlap detection against existing reservations
//! - `intake`: validate and stage new bookings as `queued`
//! - `lifecycle`: confirmation and the front-desk status transitions
//! - `payment`: bind payments to existing bookings
//! - `amend`: merge updates into stored bookings under the same conflict check
//!
//! All operations go through [`BookingService`], which holds the store and
//! an optional notifier.

pub mod amend;
pub mod conflict;
pub mod intake;
pub mod lifecycle;
pub mod payment;
pub mod request;
pub mod service;

pub use conflict::ConflictDetector;
pub use lifecycle::TransitionOutcome;
pub use request::{BookingRequest, PaymentRequest};
pub use service::BookingService;
