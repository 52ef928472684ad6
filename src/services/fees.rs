use chrono::NaiveDateTime;

use crate::models::BookingSettings;

/// Cancellation fee, in minor units. Applies only when the booking is
/// cancelled strictly inside the deadline window; exactly at the deadline no
/// fee is due. Absence of a fee is `None`, not zero.
pub fn cancellation_fee(
    settings: &BookingSettings,
    service_price: i64,
    scheduled_start: NaiveDateTime,
    now: NaiveDateTime,
) -> Option<i64> {
    let minutes_until_start = (scheduled_start - now).num_minutes();
    if minutes_until_start < settings.cancellation_deadline_hours * 60 {
        Some(service_price * settings.cancellation_fee_percent / 100)
    } else {
        None
    }
}

/// No-show fee has no deadline test; it is recorded only when positive.
pub fn no_show_fee(settings: &BookingSettings, service_price: i64) -> Option<i64> {
    let fee = service_price * settings.no_show_fee_percent / 100;
    (fee > 0).then_some(fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn settings() -> BookingSettings {
        BookingSettings {
            tenant_id: "tenant1".to_string(),
            cancellation_deadline_hours: 24,
            cancellation_fee_percent: 50,
            no_show_fee_percent: 100,
            allow_onsite_payment: true,
            allow_card_payment: false,
        }
    }

    #[test]
    fn test_no_fee_outside_deadline() {
        let fee = cancellation_fee(
            &settings(),
            10000,
            dt("2025-06-18 12:00"),
            dt("2025-06-16 12:00"),
        );
        assert_eq!(fee, None);
    }

    #[test]
    fn test_no_fee_exactly_at_deadline() {
        // 24h on the dot: no fee
        let fee = cancellation_fee(
            &settings(),
            10000,
            dt("2025-06-17 12:00"),
            dt("2025-06-16 12:00"),
        );
        assert_eq!(fee, None);
    }

    #[test]
    fn test_fee_one_minute_inside_deadline() {
        let fee = cancellation_fee(
            &settings(),
            10000,
            dt("2025-06-17 12:00"),
            dt("2025-06-16 12:01"),
        );
        assert_eq!(fee, Some(5000));
    }

    #[test]
    fn test_fee_when_start_already_passed() {
        let fee = cancellation_fee(
            &settings(),
            10000,
            dt("2025-06-16 12:00"),
            dt("2025-06-16 13:00"),
        );
        assert_eq!(fee, Some(5000));
    }

    #[test]
    fn test_no_show_fee_ignores_deadline() {
        assert_eq!(no_show_fee(&settings(), 10000), Some(10000));
    }

    #[test]
    fn test_no_show_fee_zero_percent_not_recorded() {
        let mut s = settings();
        s.no_show_fee_percent = 0;
        assert_eq!(no_show_fee(&s, 10000), None);
    }
}
