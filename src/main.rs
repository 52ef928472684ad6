use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use washplan::clock::SystemClock;
use washplan::config::AppConfig;
use washplan::db;
use washplan::handlers;
use washplan::services::notify::LogNotifier;
use washplan::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        clock: Arc::new(SystemClock),
        notifier: Box::new(LogNotifier),
    });

    let app = Router::new()
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
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
