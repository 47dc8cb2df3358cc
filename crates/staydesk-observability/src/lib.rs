//! StayDesk Observability
//!
//! This crate provides observability features:
//! - Metrics collection (Prometheus) for the booking workflow
//! - Health endpoints (`/healthz`, `/readyz`, `/metrics`)

pub mod health;
pub mod metrics;

pub use health::{ComponentStatus, HealthState, ReadinessChecker, health_router};
pub use metrics::Metrics;
