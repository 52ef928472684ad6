use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::NaiveDateTime;
use tower::ServiceExt;

use washplan::clock::FixedClock;
use washplan::config::AppConfig;
use washplan::db::{self, queries};
use washplan::handlers;
use washplan::models::{Location, OpeningHoursEntry, ServicePrice};
use washplan::services::notify::{BookingSummary, NotificationSender};
use washplan::state::AppState;

// ── Mock collaborators ──

struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl NotificationSender for MockNotifier {
    async fn send_booking_confirmation(
        &self,
        contact: &str,
        summary: &BookingSummary,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((contact.to_string(), summary.booking_code.clone()));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl NotificationSender for FailingNotifier {
    async fn send_booking_confirmation(
        &self,
        _contact: &str,
        _summary: &BookingSummary,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("provider unavailable"))
    }
}

// ── Helpers ──

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
    }
}

/// Location open Monday and Tuesday 08:00-16:00, two parallel bays,
/// 30-minute grid, no notice requirement. 2025-06-16 is a Monday.
fn seed(conn: &rusqlite::Connection) {
    queries::insert_location(
        conn,
        &Location {
            id: "loc1".to_string(),
            tenant_id: "tenant1".to_string(),
            name: "Main Street Wash".to_string(),
            parallel_slots: 2,
            slot_interval_minutes: 30,
            min_booking_notice_hours: 0,
            max_booking_advance_days: 30,
            booking_enabled: true,
        },
    )
    .unwrap();

    for weekday in [1u8, 2u8] {
        queries::upsert_opening_hours(
            conn,
            &OpeningHoursEntry {
                location_id: "loc1".to_string(),
                weekday,
                open_time: "08:00".parse().unwrap(),
                close_time: "16:00".parse().unwrap(),
                is_closed: false,
            },
        )
        .unwrap();
    }

    queries::insert_service_price(
        conn,
        &ServicePrice {
            id: "svc1".to_string(),
            package_name: "exterior".to_string(),
            vehicle_type: "car".to_string(),
            duration_minutes: 60,
            price: 10000,
            currency: "HUF".to_string(),
            is_active: true,
        },
    )
    .unwrap();
}

fn test_state_at(now: &str) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    seed(&conn);
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        clock: Arc::new(FixedClock(dt(now))),
        notifier: Box::new(MockNotifier {
            sent: Arc::new(Mutex::new(vec![])),
        }),
    })
}

fn test_state_with_sent(now: &str) -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let conn = db::init_db(":memory:").unwrap();
    seed(&conn);
    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        clock: Arc::new(FixedClock(dt(now))),
        notifier: Box::new(MockNotifier {
            sent: Arc::clone(&sent),
        }),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/locations/:id/slots",
            get(handlers::slots::list_slots),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::bookings::reschedule_booking),
        )
        .route(
            "/api/bookings/:id/confirm",
            post(handlers::bookings::confirm_booking),
        )
        .route(
            "/api/bookings/:id/start",
            post(handlers::bookings::start_wash),
        )
        .route(
            "/api/bookings/:id/complete",
            post(handlers::bookings::complete_wash),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/no-show",
            post(handlers::bookings::mark_no_show),
        )
        .route(
            "/api/admin/bookings",
            get(handlers::bookings::list_bookings),
        )
        .route("/api/admin/blocked", get(handlers::blocked::list_blocked))
        .route("/api/admin/blocked", post(handlers::blocked::create_blocked))
        .route(
            "/api/admin/blocked/recurring",
            post(handlers::blocked::create_recurring_blocked),
        )
        .route(
            "/api/admin/blocked/:id",
            delete(handlers::blocked::delete_blocked),
        )
        .route(
            "/api/admin/settings/:tenant_id",
            get(handlers::settings::get_settings),
        )
        .route(
            "/api/admin/settings/:tenant_id",
            post(handlers::settings::update_settings),
        )
        .with_state(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_booking_at(app: &Router, start: &str) -> serde_json::Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "location_id": "loc1",
                "service_id": "svc1",
                "scheduled_start": start,
                "customer_name": "Alice",
                "customer_phone": "+36301234567",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Slot listing ──

#[tokio::test]
async fn test_full_slot_grid() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=2025-06-17&service_id=svc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let slots = body_json(res).await;
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 15);
    assert_eq!(slots[0]["start"], "2025-06-17 08:00");
    assert_eq!(slots[14]["start"], "2025-06-17 15:00");
    assert_eq!(slots[14]["end"], "2025-06-17 16:00");
    for slot in slots {
        assert_eq!(slot["available"], true);
        assert_eq!(slot["remaining_capacity"], 2);
    }
}

#[tokio::test]
async fn test_slot_grid_reflects_existing_booking() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    create_booking_at(&app, "2025-06-17 09:00").await;

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=2025-06-17&service_id=svc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let slots = body_json(res).await;
    let find = |start: &str| {
        slots
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["start"] == format!("2025-06-17 {start}"))
            .unwrap()
            .clone()
    };

    assert_eq!(find("08:00")["remaining_capacity"], 2);
    assert_eq!(find("09:00")["remaining_capacity"], 1);
    assert_eq!(find("09:30")["remaining_capacity"], 1);
    assert_eq!(find("10:00")["remaining_capacity"], 2);
}

#[tokio::test]
async fn test_closed_day_returns_no_slots() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    // Wednesday has no opening-hours entry
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=2025-06-18&service_id=svc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_json(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_slots_invalid_date_is_bad_request() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=not-a-date")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_slots_unknown_location_is_not_found() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/ghost/slots?date=2025-06-17")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Booking creation ──

#[tokio::test]
async fn test_create_and_fetch_booking() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let created = create_booking_at(&app, "2025-06-17 09:00").await;

    assert_eq!(created["status"], "pending");
    assert_eq!(created["scheduled_end"], "2025-06-17 10:00");
    assert_eq!(created["service_price"], 10000);
    assert_eq!(created["booking_code"].as_str().unwrap().len(), 8);

    let id = created["id"].as_str().unwrap();
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched = body_json(res).await;
    assert_eq!(fetched["booking_code"], created["booking_code"]);
}

#[tokio::test]
async fn test_create_sends_confirmation() {
    let (state, sent) = test_state_with_sent("2025-06-17 06:00");
    let app = test_app(state);
    let created = create_booking_at(&app, "2025-06-17 09:00").await;

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+36301234567");
    assert_eq!(sent[0].1, created["booking_code"].as_str().unwrap());
}

#[tokio::test]
async fn test_notification_failure_keeps_booking() {
    let conn = db::init_db(":memory:").unwrap();
    seed(&conn);
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        clock: Arc::new(FixedClock(dt("2025-06-17 06:00"))),
        notifier: Box::new(FailingNotifier),
    });
    let app = test_app(state);

    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_conflicts_when_slot_full() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    create_booking_at(&app, "2025-06-17 09:00").await;
    create_booking_at(&app, "2025-06-17 09:00").await;

    // both bays taken; an overlapping third attempt loses
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "location_id": "loc1",
                "service_id": "svc1",
                "scheduled_start": "2025-06-17 09:30",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_rejects_closed_day() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "location_id": "loc1",
                "service_id": "svc1",
                "scheduled_start": "2025-06-18 09:00",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_rejects_malformed_start() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "location_id": "loc1",
                "service_id": "svc1",
                "scheduled_start": "soon",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Lifecycle over HTTP ──

#[tokio::test]
async fn test_lifecycle_happy_path() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request("POST", &format!("/api/bookings/{id}/confirm"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "confirmed");

    let res = app
        .clone()
        .oneshot(json_request("POST", &format!("/api/bookings/{id}/start"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "in_progress");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/complete"),
            serde_json::json!({ "wash_ref": "wash-42" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let completed = body_json(res).await;
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["wash_ref"], "wash-42");
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    // pending booking cannot start
    let res = app
        .clone()
        .oneshot(json_request("POST", &format!("/api/bookings/{id}/start"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // and is still pending afterwards
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(res).await["status"], "pending");
}

#[tokio::test]
async fn test_cancel_inside_deadline_charges_fee() {
    // 3 hours before start, default deadline 24h, fee 50%
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({ "reason": "sick", "actor": "driver" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cancelled = body_json(res).await;
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancellation_fee"], 5000);
    assert_eq!(cancelled["cancellation_reason"], "sick");
    assert_eq!(cancelled["cancelled_by"], "driver");
}

#[tokio::test]
async fn test_cancel_outside_deadline_is_free() {
    // Monday booking cancelled the Monday a week earlier
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let created = create_booking_at(&app, "2025-06-23 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let cancelled = body_json(res).await;
    assert_eq!(cancelled["cancellation_fee"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_no_show_always_charges() {
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let created = create_booking_at(&app, "2025-06-23 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/no-show"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let no_show = body_json(res).await;
    assert_eq!(no_show["status"], "no_show");
    assert_eq!(no_show["cancellation_fee"], 10000);
}

#[tokio::test]
async fn test_reschedule_pending_booking() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/reschedule"),
            serde_json::json!({ "scheduled_start": "2025-06-17 11:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let moved = body_json(res).await;
    assert_eq!(moved["scheduled_start"], "2025-06-17 11:00");
    assert_eq!(moved["scheduled_end"], "2025-06-17 12:00");

    // after confirmation the booking can no longer move
    app.clone()
        .oneshot(json_request("POST", &format!("/api/bookings/{id}/confirm"), serde_json::json!({})))
        .await
        .unwrap();
    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/reschedule"),
            serde_json::json!({ "scheduled_start": "2025-06-17 13:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

// ── Blocked periods ──

#[tokio::test]
async fn test_blocked_requires_auth() {
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/blocked")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_one_off_block_hides_slots() {
    let app = test_app(test_state_at("2025-06-17 06:00"));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/blocked",
            Some(serde_json::json!({
                "location_id": "loc1",
                "start_time": "2025-06-17 10:00",
                "end_time": "2025-06-17 11:00",
                "reason": "maintenance",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let block = body_json(res).await;
    let block_id = block["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=2025-06-17&service_id=svc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let slots = body_json(res).await;
    let ten = slots
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["start"] == "2025-06-17 10:00")
        .unwrap()
        .clone();
    assert_eq!(ten["available"], false);
    assert_eq!(ten["remaining_capacity"], 0);

    // deleting the block restores the grid
    let res = app
        .clone()
        .oneshot(admin_request(
            "DELETE",
            &format!("/api/admin/blocked/{block_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/locations/loc1/slots?date=2025-06-17&service_id=svc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let slots = body_json(res).await;
    let ten = slots
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["start"] == "2025-06-17 10:00")
        .unwrap()
        .clone();
    assert_eq!(ten["available"], true);
}

#[tokio::test]
async fn test_recurring_block_applies_weekly() {
    let app = test_app(test_state_at("2025-06-16 06:00"));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/blocked/recurring",
            Some(serde_json::json!({
                "location_id": "loc1",
                "day_of_week": 1,
                "start": "12:00",
                "end": "13:00",
                "reason": "lunch",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Monday noon unavailable, Tuesday noon untouched
    for (date, expected) in [("2025-06-16", false), ("2025-06-17", true)] {
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/api/locations/loc1/slots?date={date}&service_id=svc1"
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let slots = body_json(res).await;
        let noon = slots
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["start"] == format!("{date} 12:00"))
            .unwrap()
            .clone();
        assert_eq!(noon["available"], expected, "date {date}");
    }
}

#[tokio::test]
async fn test_recurring_block_rejects_bad_input() {
    let app = test_app(test_state_at("2025-06-16 06:00"));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/blocked/recurring",
            Some(serde_json::json!({
                "location_id": "loc1",
                "day_of_week": 9,
                "start": "12:00",
                "end": "13:00",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(admin_request(
            "POST",
            "/api/admin/blocked/recurring",
            Some(serde_json::json!({
                "location_id": "loc1",
                "day_of_week": 1,
                "start": "13:00",
                "end": "12:00",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Settings ──

#[tokio::test]
async fn test_settings_created_lazily_with_defaults() {
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let res = app
        .oneshot(admin_request("GET", "/api/admin/settings/tenant1", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let settings = body_json(res).await;
    assert_eq!(settings["cancellation_deadline_hours"], 24);
    assert_eq!(settings["cancellation_fee_percent"], 50);
    assert_eq!(settings["no_show_fee_percent"], 100);
}

#[tokio::test]
async fn test_settings_partial_update() {
    let app = test_app(test_state_at("2025-06-16 06:00"));
    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/settings/tenant1",
            Some(serde_json::json!({ "cancellation_fee_percent": 30 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let settings = body_json(res).await;
    assert_eq!(settings["cancellation_fee_percent"], 30);
    // untouched fields keep their defaults
    assert_eq!(settings["cancellation_deadline_hours"], 24);
    assert_eq!(settings["no_show_fee_percent"], 100);
}

#[tokio::test]
async fn test_updated_fee_policy_applies_to_cancellations() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    app.clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/settings/tenant1",
            Some(serde_json::json!({ "cancellation_fee_percent": 30 })),
        ))
        .await
        .unwrap();

    let created = create_booking_at(&app, "2025-06-17 09:00").await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let cancelled = body_json(res).await;
    assert_eq!(cancelled["cancellation_fee"], 3000);
}

// ── Admin listing ──

#[tokio::test]
async fn test_admin_booking_listing_filters_by_status() {
    let app = test_app(test_state_at("2025-06-17 06:00"));
    let first = create_booking_at(&app, "2025-06-17 09:00").await;
    create_booking_at(&app, "2025-06-17 11:00").await;

    let id = first["id"].as_str().unwrap();
    app.clone()
        .oneshot(json_request("POST", &format!("/api/bookings/{id}/confirm"), serde_json::json!({})))
        .await
        .unwrap();

    let res = app
        .oneshot(admin_request(
            "GET",
            "/api/admin/bookings?status=confirmed",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bookings = body_json(res).await;
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["status"], "confirmed");
}
