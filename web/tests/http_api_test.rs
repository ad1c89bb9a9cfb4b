//! HTTP API tests against the in-memory store.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use studio_booking_core::{BookingService, Member, Session};
use studio_booking_testing::{InMemoryBookingStore, test_clock};
use studio_booking_web::{AlwaysReady, AppState, ReadinessProbe, build_router};

struct Api {
    server: TestServer,
    store: Arc<InMemoryBookingStore>,
    session: Session,
}

impl Api {
    fn with_capacity(capacity: u32) -> Self {
        let store = Arc::new(InMemoryBookingStore::new());
        let class = store.create_class("Spin", capacity, 45);
        let session = store.schedule_session(&class, Utc::now() + Duration::days(2), Some("Room 2"));
        let service = BookingService::new(Arc::clone(&store)).with_clock(Arc::new(test_clock()));
        let state = AppState::new(service).with_probes(vec![Arc::new(AlwaysReady)]);
        let server = TestServer::new(build_router(state)).unwrap();
        Self {
            server,
            store,
            session,
        }
    }

    fn member(&self, name: &str) -> Member {
        self.store
            .register_member(name, &format!("{}@example.com", name.to_lowercase()))
    }

    async fn book(&self, member: &Member) -> axum_test::TestResponse {
        self.server
            .post("/api/reservations")
            .json(&json!({ "member_id": member.id, "session_id": self.session.id }))
            .await
    }
}

#[tokio::test]
async fn create_reservation_returns_created() {
    let api = Api::with_capacity(3);
    let member = api.member("Ada");

    let response = api.book(&member).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["member_id"], json!(member.id));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn full_session_is_a_conflict() {
    let api = Api::with_capacity(1);
    api.book(&api.member("Ada")).await.assert_status(StatusCode::CREATED);

    let response = api.book(&api.member("Grace")).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "FULL");
}

#[tokio::test]
async fn duplicate_request_is_a_conflict() {
    let api = Api::with_capacity(5);
    let member = api.member("Ada");
    api.book(&member).await.assert_status(StatusCode::CREATED);

    let response = api.book(&member).await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "DUPLICATE");
}

#[tokio::test]
async fn cancel_then_cancel_again_is_unprocessable() {
    let api = Api::with_capacity(2);
    let created: Value = api.book(&api.member("Ada")).await.json();
    let id = created["id"].as_str().unwrap().to_string();

    let cancelled = api.server.post(&format!("/api/reservations/{id}/cancel")).await;
    cancelled.assert_status_ok();
    assert_eq!(cancelled.json::<Value>()["status"], "cancelled");

    let again = api.server.post(&format!("/api/reservations/{id}/cancel")).await;
    again.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(again.json::<Value>()["code"], "ALREADY_TERMINAL");
}

#[tokio::test]
async fn outcome_is_recorded_once() {
    let api = Api::with_capacity(2);
    let created: Value = api.book(&api.member("Ada")).await.json();
    let id = created["id"].as_str().unwrap().to_string();

    let attended = api
        .server
        .post(&format!("/api/reservations/{id}/outcome"))
        .json(&json!({ "outcome": "attended" }))
        .await;
    attended.assert_status_ok();
    assert_eq!(attended.json::<Value>()["status"], "attended");

    let no_show = api
        .server
        .post(&format!("/api/reservations/{id}/outcome"))
        .json(&json!({ "outcome": "no_show" }))
        .await;
    no_show.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(no_show.json::<Value>()["code"], "NOT_CONFIRMED");

    let fetched: Value = api.server.get(&format!("/api/reservations/{id}")).await.json();
    assert_eq!(fetched["status"], "attended");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let api = Api::with_capacity(2);
    let missing = uuid_string();

    let response = api.server.get(&format!("/api/reservations/{missing}")).await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");

    api.server
        .get(&format!("/api/sessions/{missing}/roster"))
        .await
        .assert_status_not_found();

    let response = api
        .server
        .post("/api/reservations")
        .json(&json!({ "member_id": missing, "session_id": api.session.id }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn roster_and_availability_track_bookings() {
    let api = Api::with_capacity(3);
    let ada = api.member("Ada");
    api.book(&ada).await.assert_status(StatusCode::CREATED);
    api.book(&api.member("Grace")).await.assert_status(StatusCode::CREATED);

    let session_id = api.session.id;
    let roster: Value = api
        .server
        .get(&format!("/api/sessions/{session_id}/roster"))
        .await
        .json();
    let roster = roster.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().any(|entry| entry["member_name"] == "Ada"));

    let availability: Value = api
        .server
        .get(&format!("/api/sessions/{session_id}/availability"))
        .await
        .json();
    assert_eq!(availability["capacity"], 3);
    assert_eq!(availability["occupancy"], 2);
    assert_eq!(availability["remaining"], 1);

    let schedule: Value = api
        .server
        .get(&format!("/api/members/{}/reservations", ada.id))
        .await
        .json();
    assert_eq!(schedule.as_array().unwrap().len(), 1);
    assert_eq!(schedule[0]["class_name"], "Spin");
}

#[tokio::test]
async fn cancelled_session_rejects_bookings() {
    let api = Api::with_capacity(3);
    let session_id = api.session.id;

    let cancelled = api.server.post(&format!("/api/sessions/{session_id}/cancel")).await;
    cancelled.assert_status_ok();

    let response = api.book(&api.member("Ada")).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "CANCELLED");

    let availability: Value = api
        .server
        .get(&format!("/api/sessions/{session_id}/availability"))
        .await
        .json();
    assert_eq!(availability["cancelled"], true);
    assert_eq!(availability["remaining"], 0);
}

#[tokio::test]
async fn inverted_window_is_a_bad_request() {
    let api = Api::with_capacity(2);
    let member = api.member("Ada");

    let response = api
        .server
        .get(&format!("/api/members/{}/reservations", member.id))
        .add_query_param("from", "2025-02-01T00:00:00Z")
        .add_query_param("to", "2025-01-01T00:00:00Z")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable() {
    let api = Api::with_capacity(2);
    let member = api.member("Ada");
    api.store.set_unavailable(true);

    let response = api.book(&member).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn health_and_readiness() {
    let api = Api::with_capacity(1);

    api.server.get("/health").await.assert_status_ok();

    let ready = api.server.get("/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["checks"]["store"], true);
}

struct DownProbe;

impl ReadinessProbe for DownProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    fn check(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + '_>> {
        Box::pin(async { false })
    }
}

#[tokio::test]
async fn failing_probe_is_not_ready() {
    let store = Arc::new(InMemoryBookingStore::new());
    let state = AppState::new(BookingService::new(store))
        .with_probes(vec![Arc::new(AlwaysReady), Arc::new(DownProbe)]);
    let server = TestServer::new(build_router(state)).unwrap();

    let response = server.get("/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["ready"], false);
    assert_eq!(body["checks"]["database"], false);
}

fn uuid_string() -> String {
    studio_booking_core::ReservationId::new().to_string()
}
