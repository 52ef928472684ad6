use serde::{Deserialize, Serialize};

/// Pairing of a service package and a vehicle type. A booking freezes the
/// duration and price from this row at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePrice {
    pub id: String,
    pub package_name: String,
    pub vehicle_type: String,
    pub duration_minutes: i64,
    /// Minor currency units.
    pub price: i64,
    pub currency: String,
    pub is_active: bool,
}
