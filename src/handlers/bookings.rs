use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::Booking;
use crate::services::booking::{self, NewBooking};
use crate::services::notify::BookingSummary;
use crate::state::AppState;

fn parse_datetime(s: &str) -> Result<NaiveDateTime, EngineError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| EngineError::BadRequest(format!("invalid datetime: {s}")))
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    booking_code: String,
    location_id: String,
    driver_id: Option<String>,
    scheduled_start: String,
    scheduled_end: String,
    status: String,
    payment_status: String,
    service_duration_minutes: i64,
    service_price: i64,
    currency: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_email: Option<String>,
    cancellation_fee: Option<i64>,
    cancellation_reason: Option<String>,
    cancelled_by: Option<String>,
    wash_ref: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            booking_code: b.booking_code,
            location_id: b.location_id,
            driver_id: b.driver_id,
            scheduled_start: b.scheduled_start.format("%Y-%m-%d %H:%M").to_string(),
            scheduled_end: b.scheduled_end.format("%Y-%m-%d %H:%M").to_string(),
            status: b.status.as_str().to_string(),
            payment_status: b.payment_status.as_str().to_string(),
            service_duration_minutes: b.service_duration_minutes,
            service_price: b.service_price,
            currency: b.currency,
            customer_name: b.customer_name,
            customer_phone: b.customer_phone,
            customer_email: b.customer_email,
            cancellation_fee: b.cancellation_fee,
            cancellation_reason: b.cancellation_reason,
            cancelled_by: b.cancelled_by,
            wash_ref: b.wash_ref,
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub location_id: String,
    pub service_id: String,
    pub scheduled_start: String,
    pub driver_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub actor: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), EngineError> {
    let scheduled_start = parse_datetime(&body.scheduled_start)?;
    let now = state.clock.now();

    let request = NewBooking {
        location_id: body.location_id,
        service_id: body.service_id,
        scheduled_start,
        driver_id: body.driver_id,
        customer_name: body.customer_name,
        customer_phone: body.customer_phone,
        customer_email: body.customer_email,
        created_by: body.actor.unwrap_or_else(|| "public".to_string()),
    };

    // The guard is released before the notification await; delivery failure
    // never rolls the booking back.
    let (created, location_name) = {
        let mut db = state.db.lock().unwrap();
        let created = booking::create_booking(&mut db, &request, now)?;
        let location_name = queries::get_location(&db, &created.location_id)?
            .map(|l| l.name)
            .unwrap_or_default();
        (created, location_name)
    };

    let contact = created
        .customer_email
        .clone()
        .or_else(|| created.customer_phone.clone());
    if let Some(contact) = contact {
        let summary = BookingSummary {
            booking_code: created.booking_code.clone(),
            location_name,
            scheduled_start: created.scheduled_start,
            duration_minutes: created.service_duration_minutes,
        };
        if let Err(e) = state
            .notifier
            .send_booking_confirmation(&contact, &summary)
            .await
        {
            tracing::warn!("booking confirmation failed for {}: {e:#}", created.booking_code);
        }
    }

    Ok((StatusCode::CREATED, Json(created.into())))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, EngineError> {
    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, &id)?
        .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
    Ok(Json(booking.into()))
}

// GET /api/admin/bookings?status=&limit=
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let db = state.db.lock().unwrap();
    let bookings = queries::get_bookings(&db, query.status.as_deref(), limit)?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/bookings/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_start: String,
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<BookingResponse>, EngineError> {
    let new_start = parse_datetime(&body.scheduled_start)?;
    let now = state.clock.now();

    let mut db = state.db.lock().unwrap();
    let updated = booking::reschedule_booking(&mut db, &id, new_start, now)?;
    Ok(Json(updated.into()))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, EngineError> {
    let now = state.clock.now();
    let db = state.db.lock().unwrap();
    Ok(Json(booking::confirm_booking(&db, &id, now)?.into()))
}

// POST /api/bookings/:id/start
pub async fn start_wash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, EngineError> {
    let now = state.clock.now();
    let db = state.db.lock().unwrap();
    Ok(Json(booking::start_wash(&db, &id, now)?.into()))
}

// POST /api/bookings/:id/complete
#[derive(Deserialize, Default)]
pub struct CompleteRequest {
    pub wash_ref: Option<String>,
}

pub async fn complete_wash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<BookingResponse>, EngineError> {
    let now = state.clock.now();
    let db = state.db.lock().unwrap();
    Ok(Json(
        booking::complete_wash(&db, &id, body.wash_ref.as_deref(), now)?.into(),
    ))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
    pub actor: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<BookingResponse>, EngineError> {
    let now = state.clock.now();
    let db = state.db.lock().unwrap();
    Ok(Json(
        booking::cancel_booking(&db, &id, body.reason.as_deref(), body.actor.as_deref(), now)?
            .into(),
    ))
}

// POST /api/bookings/:id/no-show
pub async fn mark_no_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, EngineError> {
    let now = state.clock.now();
    let db = state.db.lock().unwrap();
    Ok(Json(booking::mark_no_show(&db, &id, now)?.into()))
}
