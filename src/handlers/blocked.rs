use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{BlockedTimeSlot, TimeOfDay};
use crate::state::AppState;

fn parse_datetime(s: &str) -> Result<NaiveDateTime, EngineError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| EngineError::BadRequest(format!("invalid datetime: {s}")))
}

#[derive(Serialize)]
pub struct BlockedResponse {
    id: String,
    location_id: String,
    start_time: Option<String>,
    end_time: Option<String>,
    is_recurring: bool,
    recurring_day_of_week: Option<u8>,
    recurring_start: Option<String>,
    recurring_end: Option<String>,
    reason: Option<String>,
}

impl From<BlockedTimeSlot> for BlockedResponse {
    fn from(b: BlockedTimeSlot) -> Self {
        BlockedResponse {
            id: b.id,
            location_id: b.location_id,
            start_time: b.start_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            end_time: b.end_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            is_recurring: b.is_recurring,
            recurring_day_of_week: b.recurring_day_of_week,
            recurring_start: b.recurring_start.map(|t| t.to_string()),
            recurring_end: b.recurring_end.map(|t| t.to_string()),
            reason: b.reason,
        }
    }
}

// GET /api/admin/blocked?location_id=
#[derive(Deserialize)]
pub struct BlockedQuery {
    pub location_id: Option<String>,
}

pub async fn list_blocked(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BlockedQuery>,
) -> Result<Json<Vec<BlockedResponse>>, EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let blocks = queries::list_blocked_periods(&db, query.location_id.as_deref())?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

// POST /api/admin/blocked
#[derive(Deserialize)]
pub struct CreateBlockedRequest {
    pub location_id: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
}

pub async fn create_blocked(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBlockedRequest>,
) -> Result<(StatusCode, Json<BlockedResponse>), EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let start = parse_datetime(&body.start_time)?;
    let end = parse_datetime(&body.end_time)?;
    if end <= start {
        return Err(EngineError::BadRequest(
            "end_time must be after start_time".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    queries::get_location(&db, &body.location_id)?
        .ok_or_else(|| EngineError::NotFound(format!("location {}", body.location_id)))?;

    let block = BlockedTimeSlot {
        id: Uuid::new_v4().to_string(),
        location_id: body.location_id,
        start_time: Some(start),
        end_time: Some(end),
        is_recurring: false,
        recurring_day_of_week: None,
        recurring_start: None,
        recurring_end: None,
        reason: body.reason,
    };
    queries::insert_blocked_period(&db, &block)?;

    Ok((StatusCode::CREATED, Json(block.into())))
}

// POST /api/admin/blocked/recurring
#[derive(Deserialize)]
pub struct CreateRecurringRequest {
    pub location_id: String,
    pub day_of_week: u8,
    pub start: String,
    pub end: String,
    pub reason: Option<String>,
}

pub async fn create_recurring_blocked(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateRecurringRequest>,
) -> Result<(StatusCode, Json<BlockedResponse>), EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    if body.day_of_week > 6 {
        return Err(EngineError::BadRequest(
            "day_of_week must be 0 (Sunday) through 6 (Saturday)".to_string(),
        ));
    }
    let start: TimeOfDay = body
        .start
        .parse()
        .map_err(|e| EngineError::BadRequest(format!("{e}")))?;
    let end: TimeOfDay = body
        .end
        .parse()
        .map_err(|e| EngineError::BadRequest(format!("{e}")))?;
    if end <= start {
        return Err(EngineError::BadRequest(
            "end must be after start".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    queries::get_location(&db, &body.location_id)?
        .ok_or_else(|| EngineError::NotFound(format!("location {}", body.location_id)))?;

    let block = BlockedTimeSlot {
        id: Uuid::new_v4().to_string(),
        location_id: body.location_id,
        start_time: None,
        end_time: None,
        is_recurring: true,
        recurring_day_of_week: Some(body.day_of_week),
        recurring_start: Some(start),
        recurring_end: Some(end),
        reason: body.reason,
    };
    queries::insert_blocked_period(&db, &block)?;

    Ok((StatusCode::CREATED, Json(block.into())))
}

// DELETE /api/admin/blocked/:id
pub async fn delete_blocked(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, EngineError> {
    super::check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    if queries::delete_blocked_period(&db, &id)? {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(EngineError::NotFound(format!("blocked period {id}")))
    }
}
