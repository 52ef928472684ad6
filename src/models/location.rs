use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Maximum simultaneous reservations; always >= 1.
    pub parallel_slots: i64,
    pub slot_interval_minutes: i64,
    pub min_booking_notice_hours: i64,
    pub max_booking_advance_days: i64,
    pub booking_enabled: bool,
}
