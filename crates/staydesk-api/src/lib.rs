//! StayDesk HTTP API
//!
//! This crate exposes the booking workflow over HTTP:
//! - `/sync/*` workflow endpoints (intake, confirmation, front-desk
//!   transitions, payments, availability)
//! - Generic `/{resource}` CRUD over the closed set of resource kinds
//!
//! Every route is served both unversioned and under `/v1`. Tenant scope
//! comes from the `?company_id=` query parameter.

pub mod error;
pub mod resources;
pub mod state;
pub mod sync;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Tenant};

fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/bookings", post(sync::create_booking))
        .route("/sync/bookings/{id}/confirm", post(sync::confirm_booking))
        .route("/sync/bookings/{id}/check-in", post(sync::check_in))
        .route("/sync/bookings/{id}/check-out", post(sync::check_out))
        .route("/sync/bookings/{id}/cancel", post(sync::cancel_booking))
        .route("/sync/payments", post(sync::create_payment))
        .route("/sync/rooms/{id}/availability", get(sync::room_availability))
        .route(
            "/{resource}",
            get(resources::list_records).post(resources::create_record),
        )
        .route(
            "/{resource}/{id}",
            get(resources::get_record)
                .put(resources::update_record)
                .delete(resources::delete_record),
        )
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/v1", routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
