use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minutes since midnight, parsed from zero-padded "HH:MM". All time-of-day
/// comparisons in the engine happen on this integer form, never on the raw
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Anchors this time-of-day on a calendar date.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(self.0 * 60, 0)
            .unwrap_or_default();
        date.and_time(time)
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!("invalid time format: {s}"));
        }
        let hour: u32 = parts[0]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
        let minute: u32 = parts[1]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
        if hour > 23 || minute > 59 {
            return Err(anyhow::anyhow!("time out of range: {s}"));
        }
        Ok(TimeOfDay(hour * 60 + minute))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Weekday index used throughout the schema: 0 = Sunday .. 6 = Saturday.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// At most one entry per (location, weekday). A missing entry means the
/// location is closed that weekday; there is no implicit default window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHoursEntry {
    pub location_id: String,
    pub weekday: u8,
    pub open_time: TimeOfDay,
    pub close_time: TimeOfDay,
    pub is_closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_time() {
        let t: TimeOfDay = "08:30".parse().unwrap();
        assert_eq!(t.minutes(), 510);
        assert_eq!(t.to_string(), "08:30");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("8".parse::<TimeOfDay>().is_err());
        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("ab:cd".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_ordering_is_numeric_not_lexicographic() {
        let nine: TimeOfDay = "09:00".parse().unwrap();
        let seventeen: TimeOfDay = "17:00".parse().unwrap();
        assert!(nine < seventeen);
    }

    #[test]
    fn test_on_date() {
        let t: TimeOfDay = "14:15".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        assert_eq!(
            t.on(date),
            date.and_hms_opt(14, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_weekday_zero_is_sunday() {
        // 2025-06-15 is a Sunday, 2025-06-16 a Monday
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 0);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()), 1);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()), 6);
    }
}
