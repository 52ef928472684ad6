use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    BlockedTimeSlot, Booking, BookingSettings, BookingSettingsUpdate, BookingStatus, Location,
    OpeningHoursEntry, PaymentStatus, ServicePrice, TimeOfDay,
};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Locations ──

pub fn insert_location(conn: &Connection, location: &Location) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO locations (id, tenant_id, name, parallel_slots, slot_interval_minutes,
                                min_booking_notice_hours, max_booking_advance_days, booking_enabled)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            location.id,
            location.tenant_id,
            location.name,
            location.parallel_slots,
            location.slot_interval_minutes,
            location.min_booking_notice_hours,
            location.max_booking_advance_days,
            location.booking_enabled as i32,
        ],
    )?;
    Ok(())
}

pub fn get_location(conn: &Connection, id: &str) -> anyhow::Result<Option<Location>> {
    let result = conn.query_row(
        "SELECT id, tenant_id, name, parallel_slots, slot_interval_minutes,
                min_booking_notice_hours, max_booking_advance_days, booking_enabled
         FROM locations WHERE id = ?1",
        params![id],
        |row| {
            Ok(Location {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                name: row.get(2)?,
                parallel_slots: row.get(3)?,
                slot_interval_minutes: row.get(4)?,
                min_booking_notice_hours: row.get(5)?,
                max_booking_advance_days: row.get(6)?,
                booking_enabled: row.get::<_, i32>(7)? != 0,
            })
        },
    );

    match result {
        Ok(location) => Ok(Some(location)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Opening hours ──

pub fn upsert_opening_hours(conn: &Connection, entry: &OpeningHoursEntry) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO opening_hours (location_id, weekday, open_time, close_time, is_closed)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(location_id, weekday) DO UPDATE SET
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           is_closed = excluded.is_closed",
        params![
            entry.location_id,
            entry.weekday,
            entry.open_time.to_string(),
            entry.close_time.to_string(),
            entry.is_closed as i32,
        ],
    )?;
    Ok(())
}

pub fn get_opening_hours(
    conn: &Connection,
    location_id: &str,
    weekday: u8,
) -> anyhow::Result<Option<OpeningHoursEntry>> {
    let result = conn.query_row(
        "SELECT location_id, weekday, open_time, close_time, is_closed
         FROM opening_hours WHERE location_id = ?1 AND weekday = ?2",
        params![location_id, weekday],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)? != 0,
            ))
        },
    );

    match result {
        Ok((location_id, weekday, open_str, close_str, is_closed)) => {
            let open_time: TimeOfDay = open_str.parse()?;
            let close_time: TimeOfDay = close_str.parse()?;
            Ok(Some(OpeningHoursEntry {
                location_id,
                weekday,
                open_time,
                close_time,
                is_closed,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Service prices ──

pub fn insert_service_price(conn: &Connection, service: &ServicePrice) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO service_prices (id, package_name, vehicle_type, duration_minutes, price, currency, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.id,
            service.package_name,
            service.vehicle_type,
            service.duration_minutes,
            service.price,
            service.currency,
            service.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_service_price(conn: &Connection, id: &str) -> anyhow::Result<Option<ServicePrice>> {
    let result = conn.query_row(
        "SELECT id, package_name, vehicle_type, duration_minutes, price, currency, is_active
         FROM service_prices WHERE id = ?1",
        params![id],
        |row| {
            Ok(ServicePrice {
                id: row.get(0)?,
                package_name: row.get(1)?,
                vehicle_type: row.get(2)?,
                duration_minutes: row.get(3)?,
                price: row.get(4)?,
                currency: row.get(5)?,
                is_active: row.get::<_, i32>(6)? != 0,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, booking_code, location_id, driver_id, scheduled_start, scheduled_end, status,
     payment_status, service_duration_minutes, service_price, currency, customer_name,
     customer_phone, customer_email, created_by, cancellation_fee, cancellation_reason,
     cancelled_by, wash_ref, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, booking_code, location_id, driver_id, scheduled_start,
                               scheduled_end, status, payment_status, service_duration_minutes,
                               service_price, currency, customer_name, customer_phone,
                               customer_email, created_by, cancellation_fee, cancellation_reason,
                               cancelled_by, wash_ref, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            booking.id,
            booking.booking_code,
            booking.location_id,
            booking.driver_id,
            fmt_dt(&booking.scheduled_start),
            fmt_dt(&booking.scheduled_end),
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.service_duration_minutes,
            booking.service_price,
            booking.currency,
            booking.customer_name,
            booking.customer_phone,
            booking.customer_email,
            booking.created_by,
            booking.cancellation_fee,
            booking.cancellation_reason,
            booking.cancelled_by,
            booking.wash_ref,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY scheduled_start DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 ORDER BY scheduled_start DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Capacity counter: bookings at a location in a capacity-holding status
/// whose [scheduled_start, scheduled_end) overlaps [start, end). The optional
/// exclusion keeps a rescheduled booking from counting against itself.
pub fn count_overlapping_bookings(
    conn: &Connection,
    location_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    exclude_booking_id: Option<&str>,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE location_id = ?1
           AND status IN ('pending', 'confirmed', 'in_progress')
           AND scheduled_start < ?3 AND scheduled_end > ?2
           AND (?4 IS NULL OR id != ?4)",
        params![location_id, fmt_dt(start), fmt_dt(end), exclude_booking_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn booking_code_exists(conn: &Connection, code: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE booking_code = ?1",
        params![code],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn set_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_completed(
    conn: &Connection,
    id: &str,
    wash_ref: Option<&str>,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'completed', wash_ref = ?1, updated_at = ?2 WHERE id = ?3",
        params![wash_ref, fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_cancelled(
    conn: &Connection,
    id: &str,
    fee: Option<i64>,
    reason: Option<&str>,
    cancelled_by: Option<&str>,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', cancellation_fee = ?1,
                cancellation_reason = ?2, cancelled_by = ?3, updated_at = ?4
         WHERE id = ?5",
        params![fee, reason, cancelled_by, fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_no_show(
    conn: &Connection,
    id: &str,
    fee: Option<i64>,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'no_show', cancellation_fee = ?1, updated_at = ?2
         WHERE id = ?3",
        params![fee, fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_schedule(
    conn: &Connection,
    id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET scheduled_start = ?1, scheduled_end = ?2, updated_at = ?3
         WHERE id = ?4",
        params![fmt_dt(start), fmt_dt(end), fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(6)?;
    let payment_str: String = row.get(7)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let created_str: String = row.get(19)?;
    let updated_str: String = row.get(20)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_code: row.get(1)?,
        location_id: row.get(2)?,
        driver_id: row.get(3)?,
        scheduled_start: parse_dt(&start_str),
        scheduled_end: parse_dt(&end_str),
        status: BookingStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_str),
        service_duration_minutes: row.get(8)?,
        service_price: row.get(9)?,
        currency: row.get(10)?,
        customer_name: row.get(11)?,
        customer_phone: row.get(12)?,
        customer_email: row.get(13)?,
        created_by: row.get(14)?,
        cancellation_fee: row.get(15)?,
        cancellation_reason: row.get(16)?,
        cancelled_by: row.get(17)?,
        wash_ref: row.get(18)?,
        created_at: parse_dt(&created_str),
        updated_at: parse_dt(&updated_str),
    })
}

// ── Blocked periods ──

pub fn insert_blocked_period(conn: &Connection, block: &BlockedTimeSlot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO blocked_time_slots (id, location_id, start_time, end_time, is_recurring,
                                         recurring_day_of_week, recurring_start, recurring_end, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            block.id,
            block.location_id,
            block.start_time.as_ref().map(fmt_dt),
            block.end_time.as_ref().map(fmt_dt),
            block.is_recurring as i32,
            block.recurring_day_of_week,
            block.recurring_start.map(|t| t.to_string()),
            block.recurring_end.map(|t| t.to_string()),
            block.reason,
        ],
    )?;
    Ok(())
}

pub fn delete_blocked_period(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blocked_time_slots WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_blocked_periods(
    conn: &Connection,
    location_id: Option<&str>,
) -> anyhow::Result<Vec<BlockedTimeSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, location_id, start_time, end_time, is_recurring,
                recurring_day_of_week, recurring_start, recurring_end, reason
         FROM blocked_time_slots
         WHERE (?1 IS NULL OR location_id = ?1)
         ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![location_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, i32>(4)? != 0,
            row.get::<_, Option<u8>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;

    let mut blocks = vec![];
    for row in rows {
        let (id, location_id, start, end, is_recurring, day, rec_start, rec_end, reason) = row?;
        blocks.push(BlockedTimeSlot {
            id,
            location_id,
            start_time: start.as_deref().map(parse_dt),
            end_time: end.as_deref().map(parse_dt),
            is_recurring,
            recurring_day_of_week: day,
            recurring_start: rec_start.as_deref().and_then(|s| s.parse().ok()),
            recurring_end: rec_end.as_deref().and_then(|s| s.parse().ok()),
            reason,
        });
    }
    Ok(blocks)
}

/// Blocks consulted by the slot generator and the reservation writer.
pub fn get_blocked_for_location(
    conn: &Connection,
    location_id: &str,
) -> anyhow::Result<Vec<BlockedTimeSlot>> {
    list_blocked_periods(conn, Some(location_id))
}

// ── Booking settings ──

pub fn get_or_create_settings(
    conn: &Connection,
    tenant_id: &str,
) -> anyhow::Result<BookingSettings> {
    let result = conn.query_row(
        "SELECT tenant_id, cancellation_deadline_hours, cancellation_fee_percent,
                no_show_fee_percent, allow_onsite_payment, allow_card_payment
         FROM booking_settings WHERE tenant_id = ?1",
        params![tenant_id],
        |row| {
            Ok(BookingSettings {
                tenant_id: row.get(0)?,
                cancellation_deadline_hours: row.get(1)?,
                cancellation_fee_percent: row.get(2)?,
                no_show_fee_percent: row.get(3)?,
                allow_onsite_payment: row.get::<_, i32>(4)? != 0,
                allow_card_payment: row.get::<_, i32>(5)? != 0,
            })
        },
    );

    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let defaults = BookingSettings::defaults(tenant_id);
            conn.execute(
                "INSERT INTO booking_settings (tenant_id) VALUES (?1)
                 ON CONFLICT(tenant_id) DO NOTHING",
                params![tenant_id],
            )?;
            Ok(defaults)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn update_settings(
    conn: &Connection,
    tenant_id: &str,
    update: &BookingSettingsUpdate,
) -> anyhow::Result<BookingSettings> {
    let mut settings = get_or_create_settings(conn, tenant_id)?;
    settings.apply(update);

    conn.execute(
        "UPDATE booking_settings SET
            cancellation_deadline_hours = ?1,
            cancellation_fee_percent = ?2,
            no_show_fee_percent = ?3,
            allow_onsite_payment = ?4,
            allow_card_payment = ?5
         WHERE tenant_id = ?6",
        params![
            settings.cancellation_deadline_hours,
            settings.cancellation_fee_percent,
            settings.no_show_fee_percent,
            settings.allow_onsite_payment as i32,
            settings.allow_card_payment as i32,
            settings.tenant_id,
        ],
    )?;
    Ok(settings)
}
