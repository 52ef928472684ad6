use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{weekday_of, Location};

/// A candidate reservation window on the fixed scheduling grid.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
    pub remaining_capacity: i64,
}

/// Opening-hours resolver: the [open, close) window for a calendar date, or
/// None when the weekday entry is missing or flagged closed. A missing entry
/// means closed; there is no implicit default window.
pub fn opening_window(
    conn: &Connection,
    location_id: &str,
    date: NaiveDate,
) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, EngineError> {
    let entry = queries::get_opening_hours(conn, location_id, weekday_of(date))?;
    Ok(match entry {
        Some(e) if !e.is_closed => Some((e.open_time.on(date), e.close_time.on(date))),
        _ => None,
    })
}

/// Walks the opening window at the location's grid interval and annotates
/// each candidate slot. Deterministic for a fixed `now`; the clock is always
/// passed in, never read here.
pub fn generate_slots(
    conn: &Connection,
    location: &Location,
    date: NaiveDate,
    duration_minutes: i64,
    now: NaiveDateTime,
) -> Result<Vec<Slot>, EngineError> {
    let Some((open, close)) = opening_window(conn, &location.id, date)? else {
        return Ok(vec![]);
    };

    let interval = Duration::minutes(location.slot_interval_minutes);
    if interval <= Duration::zero() {
        // a non-positive interval would never advance the cursor
        return Ok(vec![]);
    }

    let blocks = queries::get_blocked_for_location(conn, &location.id)?;
    let duration = Duration::minutes(duration_minutes);
    let earliest = now + Duration::hours(location.min_booking_notice_hours);

    let mut slots = vec![];
    let mut start = open;
    while start + duration <= close {
        let end = start + duration;
        let overlapping =
            queries::count_overlapping_bookings(conn, &location.id, &start, &end, None)?;

        let too_soon = start < earliest;
        let at_capacity = overlapping >= location.parallel_slots;
        let blocked = blocks.iter().any(|b| b.overlaps(date, start, end));
        let available = !too_soon && !at_capacity && !blocked;

        slots.push(Slot {
            start,
            end,
            available,
            remaining_capacity: if available {
                (location.parallel_slots - overlapping).max(0)
            } else {
                0
            },
        });

        start += interval;
    }
    Ok(slots)
}

/// Full slot validation for the reservation writer: booking enabled,
/// notice/advance window, opening hours, blocked periods, capacity. Called
/// inside the same transaction as the insert so the capacity count cannot go
/// stale between check and write.
pub fn validate_booking_time(
    conn: &Connection,
    location: &Location,
    start: NaiveDateTime,
    duration_minutes: i64,
    now: NaiveDateTime,
    exclude_booking_id: Option<&str>,
) -> Result<(), EngineError> {
    if !location.booking_enabled {
        return Err(EngineError::PolicyViolation(
            "online booking is disabled at this location".to_string(),
        ));
    }

    let end = start + Duration::minutes(duration_minutes);

    if start < now + Duration::hours(location.min_booking_notice_hours) {
        return Err(EngineError::PolicyViolation(format!(
            "bookings require at least {} hours notice",
            location.min_booking_notice_hours
        )));
    }
    if start > now + Duration::days(location.max_booking_advance_days) {
        return Err(EngineError::PolicyViolation(format!(
            "bookings can be made at most {} days ahead",
            location.max_booking_advance_days
        )));
    }

    let date = start.date();
    let Some((open, close)) = opening_window(conn, &location.id, date)? else {
        return Err(EngineError::PolicyViolation(
            "the location is closed on the requested day".to_string(),
        ));
    };
    if start < open || end > close {
        return Err(EngineError::PolicyViolation(
            "the requested time is outside opening hours".to_string(),
        ));
    }

    let blocks = queries::get_blocked_for_location(conn, &location.id)?;
    if blocks.iter().any(|b| b.overlaps(date, start, end)) {
        return Err(EngineError::PolicyViolation(
            "the requested time falls inside a blocked period".to_string(),
        ));
    }

    let overlapping = queries::count_overlapping_bookings(
        conn,
        &location.id,
        &start,
        &end,
        exclude_booking_id,
    )?;
    if overlapping >= location.parallel_slots {
        return Err(EngineError::Conflict(
            "no capacity left for the requested time".to_string(),
        ));
    }

    Ok(())
}
