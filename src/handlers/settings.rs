use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{BookingSettings, BookingSettingsUpdate};
use crate::state::AppState;

// GET /api/admin/settings/:tenant_id
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
) -> Result<Json<BookingSettings>, EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let settings = queries::get_or_create_settings(&db, &tenant_id)?;
    Ok(Json(settings))
}

// POST /api/admin/settings/:tenant_id
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
    Json(body): Json<BookingSettingsUpdate>,
) -> Result<Json<BookingSettings>, EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let settings = queries::update_settings(&db, &tenant_id, &body)?;
    Ok(Json(settings))
}
