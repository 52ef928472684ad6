use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::EngineError;
use crate::services::scheduling;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub service_id: Option<String>,
}

#[derive(Serialize)]
pub struct SlotResponse {
    start: String,
    end: String,
    available: bool,
    remaining_capacity: i64,
}

// GET /api/locations/:id/slots?date=YYYY-MM-DD&service_id=...
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, EngineError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| EngineError::BadRequest(format!("invalid date: {}", query.date)))?;

    let now = state.clock.now();
    let db = state.db.lock().unwrap();

    let location = queries::get_location(&db, &location_id)?
        .ok_or_else(|| EngineError::NotFound(format!("location {location_id}")))?;

    // Without a service the grid is walked at the location's own interval.
    let duration_minutes = match &query.service_id {
        Some(service_id) => {
            let service = queries::get_service_price(&db, service_id)?
                .ok_or_else(|| EngineError::NotFound(format!("service {service_id}")))?;
            if !service.is_active {
                return Err(EngineError::PolicyViolation(
                    "the selected service is not active".to_string(),
                ));
            }
            service.duration_minutes
        }
        None => location.slot_interval_minutes,
    };

    let slots = scheduling::generate_slots(&db, &location, date, duration_minutes, now)?;

    Ok(Json(
        slots
            .into_iter()
            .map(|s| SlotResponse {
                start: s.start.format("%Y-%m-%d %H:%M").to_string(),
                end: s.end.format("%Y-%m-%d %H:%M").to_string(),
                available: s.available,
                remaining_capacity: s.remaining_capacity,
            })
            .collect(),
    ))
}
