//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for StayDesk:
//! - Booking intake outcomes (accepted, rejected for conflict)
//! - Status transitions by target status
//! - Payments recorded
//! - Failed requests by error kind
//! - Store operation latency

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for StayDesk
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Requests handled, by operation
    pub requests_total: CounterVec,
    /// Failed requests, by operation and error kind
    pub requests_failure: CounterVec,

    /// Bookings accepted at intake
    pub bookings_created: Counter,
    /// Intakes and amendments rejected because the room was taken
    pub booking_conflicts: Counter,
    /// Status transitions that changed a booking, by target status
    pub booking_transitions: CounterVec,
    /// Payments recorded
    pub payments_created: Counter,

    /// Latency of workflow calls into the store
    pub store_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("staydesk_requests_total", "Total number of API requests"),
            &["operation"],
        )?;

        let requests_failure = CounterVec::new(
            Opts::new(
                "staydesk_requests_failure_total",
                "Total number of failed API requests",
            ),
            &["operation", "error_type"],
        )?;

        let bookings_created = Counter::with_opts(Opts::new(
            "staydesk_bookings_created_total",
            "Bookings accepted at intake",
        ))?;

        let booking_conflicts = Counter::with_opts(Opts::new(
            "staydesk_booking_conflicts_total",
            "Booking writes rejected because of an overlapping reservation",
        ))?;

        let booking_transitions = CounterVec::new(
            Opts::new(
                "staydesk_booking_transitions_total",
                "Booking status transitions",
            ),
            &["to"],
        )?;

        let payments_created = Counter::with_opts(Opts::new(
            "staydesk_payments_created_total",
            "Payments recorded against bookings",
        ))?;

        let store_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "staydesk_store_duration_seconds",
                "Workflow operation duration in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(requests_failure.clone()))?;
        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(booking_conflicts.clone()))?;
        registry.register(Box::new(booking_transitions.clone()))?;
        registry.register(Box::new(payments_created.clone()))?;
        registry.register(Box::new(store_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            requests_failure,
            bookings_created,
            booking_conflicts,
            booking_transitions,
            payments_created,
            store_duration_seconds,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed request and how long its workflow call took
    pub fn record_request(&self, operation: &str, duration_secs: f64) {
        self.requests_total.with_label_values(&[operation]).inc();
        self.store_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Record a failed request
    pub fn record_failure(&self, operation: &str, error_type: &str) {
        self.requests_failure
            .with_label_values(&[operation, error_type])
            .inc();
    }

    pub fn record_booking_created(&self) {
        self.bookings_created.inc();
    }

    pub fn record_conflict(&self) {
        self.booking_conflicts.inc();
    }

    /// Record a status change; `to` is the kebab-case target status
    pub fn record_transition(&self, to: &str) {
        self.booking_transitions.with_label_values(&[to]).inc();
    }

    pub fn record_payment(&self) {
        self.payments_created.inc();
    }
}
