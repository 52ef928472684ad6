use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{Booking, BookingStatus, Location, PaymentStatus};
use crate::services::{codes, fees, scheduling};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub location_id: String,
    pub service_id: String,
    pub scheduled_start: NaiveDateTime,
    pub driver_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    /// Channel that created the booking: driver, operator or public.
    pub created_by: String,
}

fn require_booking(conn: &Connection, id: &str) -> Result<Booking, EngineError> {
    queries::get_booking(conn, id)?
        .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))
}

fn require_location(conn: &Connection, id: &str) -> Result<Location, EngineError> {
    queries::get_location(conn, id)?
        .ok_or_else(|| EngineError::NotFound(format!("location {id}")))
}

fn guard_transition(
    booking: &Booking,
    allowed: &[BookingStatus],
    to: BookingStatus,
) -> Result<(), EngineError> {
    if allowed.contains(&booking.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidStateTransition {
            from: booking.status.as_str(),
            to: to.as_str(),
        })
    }
}

/// Reservation writer. Validation and insert run inside one transaction on
/// the shared connection, so a concurrent create for the same window cannot
/// slip between the capacity count and the write.
pub fn create_booking(
    conn: &mut Connection,
    req: &NewBooking,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let location = require_location(conn, &req.location_id)?;
    let service = queries::get_service_price(conn, &req.service_id)?
        .ok_or_else(|| EngineError::NotFound(format!("service {}", req.service_id)))?;
    if !service.is_active {
        return Err(EngineError::PolicyViolation(
            "the selected service is not active".to_string(),
        ));
    }

    let tx = conn.transaction()?;

    scheduling::validate_booking_time(
        &tx,
        &location,
        req.scheduled_start,
        service.duration_minutes,
        now,
        None,
    )?;

    let booking_code = codes::generate_unique_code(&tx)?;
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        booking_code,
        location_id: location.id.clone(),
        driver_id: req.driver_id.clone(),
        scheduled_start: req.scheduled_start,
        scheduled_end: req.scheduled_start + Duration::minutes(service.duration_minutes),
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        service_duration_minutes: service.duration_minutes,
        service_price: service.price,
        currency: service.currency.clone(),
        customer_name: req.customer_name.clone(),
        customer_phone: req.customer_phone.clone(),
        customer_email: req.customer_email.clone(),
        created_by: req.created_by.clone(),
        cancellation_fee: None,
        cancellation_reason: None,
        cancelled_by: None,
        wash_ref: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        code = %booking.booking_code,
        location = %booking.location_id,
        start = %booking.scheduled_start,
        "booking created"
    );
    Ok(booking)
}

/// Reschedule is only allowed while the booking is still pending; the new
/// time goes through full slot validation with the booking's own row
/// excluded from the capacity count.
pub fn reschedule_booking(
    conn: &mut Connection,
    id: &str,
    new_start: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(&booking, &[BookingStatus::Pending], BookingStatus::Pending)?;

    let location = require_location(conn, &booking.location_id)?;

    let tx = conn.transaction()?;
    scheduling::validate_booking_time(
        &tx,
        &location,
        new_start,
        booking.service_duration_minutes,
        now,
        Some(&booking.id),
    )?;
    let new_end = new_start + Duration::minutes(booking.service_duration_minutes);
    queries::set_booking_schedule(&tx, id, &new_start, &new_end, &now)?;
    tx.commit()?;

    require_booking(conn, id)
}

pub fn confirm_booking(
    conn: &Connection,
    id: &str,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(&booking, &[BookingStatus::Pending], BookingStatus::Confirmed)?;
    queries::set_booking_status(conn, id, BookingStatus::Confirmed, &now)?;
    require_booking(conn, id)
}

pub fn start_wash(
    conn: &Connection,
    id: &str,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(&booking, &[BookingStatus::Confirmed], BookingStatus::InProgress)?;
    queries::set_booking_status(conn, id, BookingStatus::InProgress, &now)?;
    require_booking(conn, id)
}

pub fn complete_wash(
    conn: &Connection,
    id: &str,
    wash_ref: Option<&str>,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(&booking, &[BookingStatus::InProgress], BookingStatus::Completed)?;
    queries::set_booking_completed(conn, id, wash_ref, &now)?;
    require_booking(conn, id)
}

pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    reason: Option<&str>,
    cancelled_by: Option<&str>,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(
        &booking,
        &[BookingStatus::Pending, BookingStatus::Confirmed],
        BookingStatus::Cancelled,
    )?;

    let location = require_location(conn, &booking.location_id)?;
    let settings = queries::get_or_create_settings(conn, &location.tenant_id)?;
    let fee = fees::cancellation_fee(
        &settings,
        booking.service_price,
        booking.scheduled_start,
        now,
    );

    queries::set_booking_cancelled(conn, id, fee, reason, cancelled_by, &now)?;
    require_booking(conn, id)
}

pub fn mark_no_show(
    conn: &Connection,
    id: &str,
    now: NaiveDateTime,
) -> Result<Booking, EngineError> {
    let booking = require_booking(conn, id)?;
    guard_transition(
        &booking,
        &[BookingStatus::Pending, BookingStatus::Confirmed],
        BookingStatus::NoShow,
    )?;

    let location = require_location(conn, &booking.location_id)?;
    let settings = queries::get_or_create_settings(conn, &location.tenant_id)?;
    let fee = fees::no_show_fee(&settings, booking.service_price);

    queries::set_booking_no_show(conn, id, fee, &now)?;
    require_booking(conn, id)
}
