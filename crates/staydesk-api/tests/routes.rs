//! Router tests for the StayDesk API
//!
//! These tests drive the full router with an in-memory store.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use staydesk_api::{AppState, router};
use staydesk_booking::BookingService;
use staydesk_core::{BookingStore, MemoryBookingStore, ResourceKind};
use staydesk_observability::Metrics;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

async fn app() -> (Router, Arc<Metrics>) {
    let store = Arc::new(MemoryBookingStore::new());
    store
        .insert_record(None, ResourceKind::Rooms, json!({"id": "1", "number": "101"}))
        .await
        .unwrap();
    let metrics = Arc::new(Metrics::new().unwrap());
    let state = AppState::new(BookingService::new(store), metrics.clone());
    (router(state), metrics)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_create_booking_returns_201() {
    let (app, metrics) = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/sync/bookings",
        Some(json!({"roomId": 1, "checkIn": "2025-12-01", "checkOut": "2025-12-05"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["room_id"], "1");
    assert!(body["id"].as_str().is_some());
    assert_eq!(metrics.bookings_created.get(), 1.0);
}

#[tokio::test]
async fn test_missing_fields_is_400_without_conflict_marker() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "POST", "/sync/bookings", Some(json!({"room_id": "1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("check_in"));
    assert!(body.get("conflict").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = app().await.0;
    let request = Request::builder()
        .method("POST")
        .uri("/sync/bookings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_conflict_is_409_with_marker() {
    let (app, metrics) = app().await;
    let booking = json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"});
    send(&app, "POST", "/sync/bookings", Some(booking.clone())).await;
    let (status, body) = send(&app, "POST", "/sync/bookings", Some(booking)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict"], true);
    assert!(body["message"].is_string());
    assert_eq!(metrics.booking_conflicts.get(), 1.0);
}

#[tokio::test]
async fn test_confirm_flow_and_unknown_id() {
    let (app, _) = app().await;
    let (_, created) = send(
        &app,
        "POST",
        "/sync/bookings",
        Some(json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "POST", &format!("/sync/bookings/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["booking"]["status"], "confirmed");

    let (status, _) = send(&app, "POST", "/sync/bookings/nope/confirm", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_front_desk_transitions() {
    let (app, _) = app().await;
    let (_, created) = send(
        &app,
        "POST",
        "/sync/bookings",
        Some(json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, "POST", &format!("/sync/bookings/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, "POST", &format!("/sync/bookings/{}/confirm", id), None).await;
    let (status, body) = send(&app, "POST", &format!("/sync/bookings/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "checked-in");
}

#[tokio::test]
async fn test_availability() {
    let (app, _) = app().await;
    send(
        &app,
        "POST",
        "/sync/bookings",
        Some(json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/sync/rooms/1/availability?check_in=2025-12-03&check_out=2025-12-04",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);

    let (_, body) = send(
        &app,
        "GET",
        "/sync/rooms/1/availability?check_in=2025-12-05&check_out=2025-12-06",
        None,
    )
    .await;
    assert_eq!(body["available"], true);

    let (status, _) = send(
        &app,
        "GET",
        "/sync/rooms/1/availability?check_in=2025-12-06&check_out=2025-12-06",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/sync/rooms/99/availability?check_in=2025-12-01&check_out=2025-12-02",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generic_crud() {
    let (app, _) = app().await;
    let (status, guest) = send(&app, "POST", "/guests", Some(json!({"name": "Ada"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = guest["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/guests/{}", id),
        Some(json!({"email": "ada@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada");
    assert_eq!(updated["email"], "ada@example.com");

    let (_, list) = send(&app, "GET", "/guests", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/guests/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/guests/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_resource_is_404() {
    let (app, _) = app().await;
    let (status, _) = send(&app, "GET", "/invoices", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bookings_cannot_be_deleted() {
    let (app, _) = app().await;
    let (_, created) = send(
        &app,
        "POST",
        "/bookings",
        Some(json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let (status, _) = send(&app, "DELETE", &format!("/bookings/{}", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_room_shape_is_validated() {
    let (app, _) = app().await;
    let (status, _) = send(&app, "POST", "/rooms", Some(json!({"id": "2", "status": "haunted"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/room-categories",
        Some(json!({"id": "suite", "name": "Suite"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_v1_prefix() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/v1/rooms/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], "101");
}

#[tokio::test]
async fn test_generic_write_failures_are_counted() {
    let (app, metrics) = app().await;
    let (status, _) = send(&app, "POST", "/rooms", Some(json!({"id": "2", "status": "haunted"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/guests", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        metrics
            .requests_failure
            .with_label_values(&["create_record", "validation"])
            .get(),
        2.0
    );

    let (status, _) = send(&app, "POST", "/bookings", Some(json!({"room_id": ["1"]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        metrics
            .requests_failure
            .with_label_values(&["create_record", "invalid_body"])
            .get(),
        1.0
    );

    let (status, _) = send(&app, "PUT", "/rooms/1", Some(json!({"status": "haunted"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        metrics
            .requests_failure
            .with_label_values(&["update_record", "validation"])
            .get(),
        1.0
    );
}

#[tokio::test]
async fn test_payment_update_goes_through_workflow() {
    let (app, _) = app().await;
    let (_, booking) = send(
        &app,
        "POST",
        "/bookings",
        Some(json!({"room_id": "1", "check_in": "2025-12-01", "check_out": "2025-12-05"})),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/payments",
        Some(json!({"id": "pay-1", "booking_id": booking_id, "amount": 120.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "PUT",
        "/payments/pay-1",
        Some(json!({"booking_id": "ghost", "amount": 50.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("ghost"));

    let (status, _) = send(&app, "PUT", "/payments/pay-1", Some(json!({"amount": -5.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stored) = send(&app, "GET", "/payments/pay-1", None).await;
    assert_eq!(stored["booking_id"], booking_id);
    assert_eq!(stored["amount"], 120.0);

    let (status, updated) = send(
        &app,
        "PUT",
        "/payments/pay-1",
        Some(json!({"amount": 100.0, "status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 100.0);
    assert_eq!(updated["status"], "completed");

    let (status, _) = send(&app, "PUT", "/payments/nope", Some(json!({"amount": 1.0}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
