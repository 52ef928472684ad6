use async_trait::async_trait;
use chrono::NaiveDateTime;

/// What the confirmation message needs to say; delivery itself is an external
/// collaborator.
#[derive(Debug, Clone)]
pub struct BookingSummary {
    pub booking_code: String,
    pub location_name: String,
    pub scheduled_start: NaiveDateTime,
    pub duration_minutes: i64,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// A failed send must never roll back the booking; callers log and move on.
    async fn send_booking_confirmation(
        &self,
        contact: &str,
        summary: &BookingSummary,
    ) -> anyhow::Result<()>;
}

/// Default sender: records the hand-off in the log and succeeds.
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send_booking_confirmation(
        &self,
        contact: &str,
        summary: &BookingSummary,
    ) -> anyhow::Result<()> {
        tracing::info!(
            code = %summary.booking_code,
            contact = %contact,
            start = %summary.scheduled_start,
            "booking confirmation handed off"
        );
        Ok(())
    }
}
