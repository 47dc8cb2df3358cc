//! Application assembly
//!
//! Wires a `BookingStore` into the booking service, the HTTP API and the
//! health/metrics endpoints.

use async_trait::async_trait;
use axum::Router;
use staydesk_api::AppState;
use staydesk_booking::BookingService;
use staydesk_core::BookingStore;
use staydesk_notify::LogNotifier;
use staydesk_observability::{ComponentStatus, HealthState, Metrics, ReadinessChecker, health_router};
use std::sync::Arc;
use tracing::warn;

use crate::config::ServerConfig;

/// Reports the booking store as ready when it answers a ping
pub struct StoreReadiness {
    store: Arc<dyn BookingStore>,
}

impl StoreReadiness {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessChecker for StoreReadiness {
    async fn check(&self) -> Vec<ComponentStatus> {
        match self.store.ping().await {
            Ok(()) => vec![ComponentStatus::healthy("booking_store")],
            Err(e) => {
                warn!(error = %e, "Booking store readiness check failed");
                vec![ComponentStatus::unhealthy("booking_store", "store unavailable")]
            }
        }
    }
}

/// Build the full router: API routes plus `/healthz`, `/readyz` and `/metrics`
pub fn build_app(
    config: &ServerConfig,
    store: Arc<dyn BookingStore>,
    metrics: Arc<Metrics>,
) -> Router {
    let service = BookingService::new(store.clone())
        .with_notifier(Arc::new(LogNotifier), config.notifications.clone());
    let state = AppState::new(service, metrics.clone())
        .with_require_tenant(config.tenancy.require_tenant);

    let health_state =
        HealthState::with_readiness_checker(metrics, Arc::new(StoreReadiness::new(store)));

    staydesk_api::router(state).merge(health_router(health_state))
}
