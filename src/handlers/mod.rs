pub mod blocked;
pub mod bookings;
pub mod health;
pub mod settings;
pub mod slots;

use axum::http::HeaderMap;

use crate::errors::EngineError;

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), EngineError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(EngineError::Unauthorized);
    }
    Ok(())
}
