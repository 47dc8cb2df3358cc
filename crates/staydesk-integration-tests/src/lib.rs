//! End-to-end test harness for StayDesk
//!
//! `TestApp` wires a real booking store (in-memory or SQLite in a temp
//! directory) into the API and health routers and drives them with
//! `tower::ServiceExt::oneshot`, so scenarios exercise the same stack the
//! server binary runs.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use staydesk_api::AppState;
use staydesk_booking::BookingService;
use staydesk_core::{BookingStore, MemoryBookingStore, ResourceKind};
use staydesk_notify::{Notification, NotificationConfig, Notifier};
use staydesk_observability::{HealthState, Metrics, health_router};
use staydesk_store_sqlite::SqliteBookingStore;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

/// Notifier that keeps every delivered message
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> bool {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        true
    }
}

/// A fully wired application over one store
pub struct TestApp {
    pub backend: &'static str,
    pub router: Router,
    pub store: Arc<dyn BookingStore>,
    pub metrics: Arc<Metrics>,
    pub notifier: Arc<RecordingNotifier>,
    _dir: Option<TempDir>,
}

impl TestApp {
    /// In-memory store with rooms "1" and "2"
    pub async fn memory() -> Self {
        Self::build("memory", Arc::new(MemoryBookingStore::new()), None).await
    }

    /// SQLite store in a fresh temp directory with rooms "1" and "2"
    pub async fn sqlite() -> Self {
        let dir = TempDir::new().unwrap();
        let store = SqliteBookingStore::new(dir.path().join("staydesk.db"), 4)
            .await
            .unwrap();
        Self::build("sqlite", Arc::new(store), Some(dir)).await
    }

    /// One app per store backend
    pub async fn all_backends() -> Vec<Self> {
        vec![Self::memory().await, Self::sqlite().await]
    }

    async fn build(
        backend: &'static str,
        store: Arc<dyn BookingStore>,
        dir: Option<TempDir>,
    ) -> Self {
        for (id, number) in [("1", "101"), ("2", "102")] {
            store
                .insert_record(None, ResourceKind::Rooms, json!({"id": id, "number": number}))
                .await
                .unwrap();
        }

        let metrics = Arc::new(Metrics::new().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = BookingService::new(store.clone())
            .with_notifier(notifier.clone(), NotificationConfig::default());
        let router = staydesk_api::router(AppState::new(service, metrics.clone()))
            .merge(health_router(HealthState::new(metrics.clone())));

        Self {
            backend,
            router,
            store,
            metrics,
            notifier,
            _dir: dir,
        }
    }

    /// Send a request and decode the JSON response (`Null` for empty bodies)
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, text) = self.send_raw(method, uri, body).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }

    pub async fn send_raw(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    /// Create a booking through intake and return its id
    pub async fn book(&self, room_id: &str, check_in: &str, check_out: &str) -> String {
        let (status, body) = self
            .post(
                "/sync/bookings",
                json!({"room_id": room_id, "check_in": check_in, "check_out": check_out}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "[{}] {}", self.backend, body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn confirm(&self, booking_id: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/sync/bookings/{}/confirm", booking_id),
            None,
        )
        .await
    }
}
