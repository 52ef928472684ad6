use serde::{Deserialize, Serialize};

/// Per-tenant cancellation and payment policy. Rows are created lazily with
/// these defaults the first time a tenant's settings are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSettings {
    pub tenant_id: String,
    pub cancellation_deadline_hours: i64,
    pub cancellation_fee_percent: i64,
    pub no_show_fee_percent: i64,
    pub allow_onsite_payment: bool,
    pub allow_card_payment: bool,
}

impl BookingSettings {
    pub fn defaults(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            cancellation_deadline_hours: 24,
            cancellation_fee_percent: 50,
            no_show_fee_percent: 100,
            allow_onsite_payment: true,
            allow_card_payment: false,
        }
    }
}

/// Explicit partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingSettingsUpdate {
    pub cancellation_deadline_hours: Option<i64>,
    pub cancellation_fee_percent: Option<i64>,
    pub no_show_fee_percent: Option<i64>,
    pub allow_onsite_payment: Option<bool>,
    pub allow_card_payment: Option<bool>,
}

impl BookingSettings {
    pub fn apply(&mut self, update: &BookingSettingsUpdate) {
        if let Some(v) = update.cancellation_deadline_hours {
            self.cancellation_deadline_hours = v;
        }
        if let Some(v) = update.cancellation_fee_percent {
            self.cancellation_fee_percent = v;
        }
        if let Some(v) = update.no_show_fee_percent {
            self.no_show_fee_percent = v;
        }
        if let Some(v) = update.allow_onsite_payment {
            self.allow_onsite_payment = v;
        }
        if let Some(v) = update.allow_card_payment {
            self.allow_card_payment = v;
        }
    }
}
