//! Generic CRUD over `/{resource}`
//!
//! Bookings and payments are routed through the workflow on create and
//! update so every write keeps the conflict and reference rules. The other
//! kinds are stored as given.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Map, Value};
use staydesk_booking::{BookingRequest, PaymentRequest};
use staydesk_core::{Error, Record, ResourceKind, Room, types::new_record_id};
use std::time::Instant;

use crate::error::{ApiError, ApiResult};
use crate::state::{ApiJson, AppState, Tenant};

fn parse_kind(segment: &str) -> ApiResult<ResourceKind> {
    Ok(segment.parse::<ResourceKind>()?)
}

fn into_object(kind: ResourceKind, body: Value) -> ApiResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Validation(format!("{} body must be a JSON object", kind.label())).into()),
    }
}

/// Identifiers are stored as strings whatever the client sent
fn normalize_id(map: &mut Map<String, Value>) {
    let id = match map.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => new_record_id(),
    };
    map.insert("id".to_string(), Value::String(id));
}

/// Shape checks for kinds that have a typed form outside the workflow
fn check_shape(kind: ResourceKind, record: &Record) -> ApiResult<()> {
    let result = match kind {
        ResourceKind::Rooms => serde_json::from_value::<Room>(record.clone()).map(|_| ()),
        _ => Ok(()),
    };
    result.map_err(|e| Error::Validation(format!("Invalid {}: {}", kind.label(), e)).into())
}

fn decode_body<T: serde::de::DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// `GET /{resource}`
pub async fn list_records(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(resource): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
    let kind = parse_kind(&resource)?;
    let records = state.service.store().list_records(tenant.id(), kind).await?;
    Ok(Json(records))
}

/// `GET /{resource}/{id}`
pub async fn get_record(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Json<Record>> {
    let kind = parse_kind(&resource)?;
    let record = state
        .service
        .store()
        .get_record(tenant.id(), kind, &id)
        .await?
        .ok_or_else(|| Error::not_found(kind.label(), &id))?;
    Ok(Json(record))
}

/// `POST /{resource}`
pub async fn create_record(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(resource): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = parse_kind(&resource)?;
    let started = Instant::now();

    let result = create_value(&state, &tenant, kind, body).await;
    state.observe("create_record", started, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn create_value(
    state: &AppState,
    tenant: &Tenant,
    kind: ResourceKind,
    body: Value,
) -> ApiResult<Value> {
    match kind {
        ResourceKind::Bookings => {
            let request: BookingRequest = decode_body(body)?;
            let booking = state.service.create_booking(tenant.id(), request).await?;
            state.metrics.record_booking_created();
            Ok(serde_json::to_value(booking).map_err(Error::from)?)
        }
        ResourceKind::Payments => {
            let request: PaymentRequest = decode_body(body)?;
            let payment = state.service.record_payment(tenant.id(), request).await?;
            state.metrics.record_payment();
            Ok(serde_json::to_value(payment).map_err(Error::from)?)
        }
        _ => {
            let mut map = into_object(kind, body)?;
            normalize_id(&mut map);
            let record = Value::Object(map);
            check_shape(kind, &record)?;
            Ok(state
                .service
                .store()
                .insert_record(tenant.id(), kind, record)
                .await?)
        }
    }
}

/// `PUT /{resource}/{id}`: fields in the body replace stored fields
pub async fn update_record(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((resource, id)): Path<(String, String)>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    let kind = parse_kind(&resource)?;
    let started = Instant::now();

    let result = update_value(&state, &tenant, kind, &id, body).await;
    state.observe("update_record", started, &result);
    Ok(Json(result?))
}

async fn update_value(
    state: &AppState,
    tenant: &Tenant,
    kind: ResourceKind,
    id: &str,
    body: Value,
) -> ApiResult<Value> {
    match kind {
        ResourceKind::Bookings => {
            let changes: BookingRequest = decode_body(body)?;
            let booking = state.service.amend_booking(tenant.id(), id, changes).await?;
            Ok(serde_json::to_value(booking).map_err(Error::from)?)
        }
        ResourceKind::Payments => {
            let changes: PaymentRequest = decode_body(body)?;
            let payment = state.service.amend_payment(tenant.id(), id, changes).await?;
            Ok(serde_json::to_value(payment).map_err(Error::from)?)
        }
        _ => merge_record(state, tenant, kind, id, body).await,
    }
}

async fn merge_record(
    state: &AppState,
    tenant: &Tenant,
    kind: ResourceKind,
    id: &str,
    body: Value,
) -> ApiResult<Value> {
    let store = state.service.store();
    let existing = store
        .get_record(tenant.id(), kind, id)
        .await?
        .ok_or_else(|| Error::not_found(kind.label(), id))?;

    let mut merged = into_object(kind, existing)?;
    for (field, value) in into_object(kind, body)? {
        if field != "id" {
            merged.insert(field, value);
        }
    }
    let record = Value::Object(merged);
    check_shape(kind, &record)?;
    Ok(store.replace_record(tenant.id(), kind, id, record).await?)
}

/// `DELETE /{resource}/{id}`
pub async fn delete_record(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&resource)?;
    if kind == ResourceKind::Bookings {
        return Err(Error::Domain(
            "Bookings are cancelled, not deleted; use /sync/bookings/{id}/cancel".to_string(),
        )
        .into());
    }
    state
        .service
        .store()
        .delete_record(tenant.id(), kind, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
