use anyhow::Context;
use rusqlite::Connection;

// Migrations are embedded so in-memory databases get the full schema.
// Ordered by name; each runs at most once.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_core_tables",
    "CREATE TABLE locations (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        name TEXT NOT NULL,
        parallel_slots INTEGER NOT NULL DEFAULT 1 CHECK (parallel_slots >= 1),
        slot_interval_minutes INTEGER NOT NULL DEFAULT 30,
        min_booking_notice_hours INTEGER NOT NULL DEFAULT 0,
        max_booking_advance_days INTEGER NOT NULL DEFAULT 30,
        booking_enabled INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE opening_hours (
        location_id TEXT NOT NULL REFERENCES locations(id),
        weekday INTEGER NOT NULL CHECK (weekday BETWEEN 0 AND 6),
        open_time TEXT NOT NULL,
        close_time TEXT NOT NULL,
        is_closed INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (location_id, weekday)
    );

    CREATE TABLE service_prices (
        id TEXT PRIMARY KEY,
        package_name TEXT NOT NULL,
        vehicle_type TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL,
        price INTEGER NOT NULL,
        currency TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE bookings (
        id TEXT PRIMARY KEY,
        booking_code TEXT NOT NULL UNIQUE,
        location_id TEXT NOT NULL REFERENCES locations(id),
        driver_id TEXT,
        scheduled_start TEXT NOT NULL,
        scheduled_end TEXT NOT NULL,
        status TEXT NOT NULL,
        payment_status TEXT NOT NULL DEFAULT 'unpaid',
        service_duration_minutes INTEGER NOT NULL,
        service_price INTEGER NOT NULL,
        currency TEXT NOT NULL,
        customer_name TEXT,
        customer_phone TEXT,
        customer_email TEXT,
        created_by TEXT NOT NULL DEFAULT 'public',
        cancellation_fee INTEGER,
        cancellation_reason TEXT,
        cancelled_by TEXT,
        wash_ref TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX idx_bookings_location_start
        ON bookings(location_id, scheduled_start);

    CREATE TABLE blocked_time_slots (
        id TEXT PRIMARY KEY,
        location_id TEXT NOT NULL REFERENCES locations(id),
        start_time TEXT,
        end_time TEXT,
        is_recurring INTEGER NOT NULL DEFAULT 0,
        recurring_day_of_week INTEGER,
        recurring_start TEXT,
        recurring_end TEXT,
        reason TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE booking_settings (
        tenant_id TEXT PRIMARY KEY,
        cancellation_deadline_hours INTEGER NOT NULL DEFAULT 24,
        cancellation_fee_percent INTEGER NOT NULL DEFAULT 50,
        no_show_fee_percent INTEGER NOT NULL DEFAULT 100,
        allow_onsite_payment INTEGER NOT NULL DEFAULT 1,
        allow_card_payment INTEGER NOT NULL DEFAULT 0
    );",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
