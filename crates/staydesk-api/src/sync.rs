//! Booking workflow endpoints under `/sync`

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use staydesk_booking::{BookingRequest, PaymentRequest, TransitionOutcome};
use staydesk_core::{Booking, BookingStatus, Payment};
use std::time::Instant;

use crate::error::ApiResult;
use crate::state::{ApiJson, AppState, Tenant};

/// Front-desk action named in the path
#[derive(Debug, Clone, Copy)]
enum Action {
    Confirm,
    CheckIn,
    CheckOut,
    Cancel,
}

impl Action {
    fn target(self) -> BookingStatus {
        match self {
            Action::Confirm => BookingStatus::Confirmed,
            Action::CheckIn => BookingStatus::CheckedIn,
            Action::CheckOut => BookingStatus::CheckedOut,
            Action::Cancel => BookingStatus::Cancelled,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Action::Confirm => "confirm_booking",
            Action::CheckIn => "check_in",
            Action::CheckOut => "check_out",
            Action::Cancel => "cancel_booking",
        }
    }
}

fn transition_body(outcome: &TransitionOutcome) -> Value {
    json!({
        "success": true,
        "message": outcome.message(),
        "booking": outcome.booking,
    })
}

/// `POST /sync/bookings`
pub async fn create_booking(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(request): ApiJson<BookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let started = Instant::now();
    let result: ApiResult<Booking> = state
        .service
        .create_booking(tenant.id(), request)
        .await
        .map_err(Into::into);
    state.observe("create_booking", started, &result);

    let booking = result?;
    state.metrics.record_booking_created();
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn run_action(
    state: &AppState,
    tenant: &Tenant,
    id: &str,
    action: Action,
) -> ApiResult<Json<Value>> {
    let started = Instant::now();
    let service = &state.service;
    let result: ApiResult<TransitionOutcome> = match action {
        Action::Confirm => service.confirm_booking(tenant.id(), id).await,
        Action::CheckIn => service.check_in(tenant.id(), id).await,
        Action::CheckOut => service.check_out(tenant.id(), id).await,
        Action::Cancel => service.cancel_booking(tenant.id(), id).await,
    }
    .map_err(Into::into);
    state.observe(action.operation(), started, &result);

    let outcome = result?;
    if outcome.changed {
        state.metrics.record_transition(action.target().as_str());
    }
    Ok(Json(transition_body(&outcome)))
}

/// `POST /sync/bookings/{id}/confirm`
pub async fn confirm_booking(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    run_action(&state, &tenant, &id, Action::Confirm).await
}

/// `POST /sync/bookings/{id}/check-in`
pub async fn check_in(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    run_action(&state, &tenant, &id, Action::CheckIn).await
}

/// `POST /sync/bookings/{id}/check-out`
pub async fn check_out(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    run_action(&state, &tenant, &id, Action::CheckOut).await
}

/// `POST /sync/bookings/{id}/cancel`
pub async fn cancel_booking(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    run_action(&state, &tenant, &id, Action::Cancel).await
}

/// `POST /sync/payments`
pub async fn create_payment(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(request): ApiJson<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let started = Instant::now();
    let result: ApiResult<Payment> = state
        .service
        .record_payment(tenant.id(), request)
        .await
        .map_err(Into::into);
    state.observe("record_payment", started, &result);

    let payment = result?;
    state.metrics.record_payment();
    Ok((StatusCode::CREATED, Json(payment)))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(alias = "checkIn")]
    check_in: NaiveDate,
    #[serde(alias = "checkOut")]
    check_out: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Availability {
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub available: bool,
}

/// `GET /sync/rooms/{id}/availability?check_in=..&check_out=..`
pub async fn room_availability(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(room_id): Path<String>,
    query: Result<Query<AvailabilityQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Availability>> {
    let Query(query) = query?;
    let started = Instant::now();
    let result: ApiResult<bool> = state
        .service
        .conflict_detector()
        .has_conflict(tenant.id(), &room_id, query.check_in, query.check_out)
        .await
        .map_err(Into::into);
    state.observe("room_availability", started, &result);

    let taken = result?;
    Ok(Json(Availability {
        room_id,
        check_in: query.check_in,
        check_out: query.check_out,
        available: !taken,
    }))
}
