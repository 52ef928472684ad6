use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::opening_hours::{weekday_of, TimeOfDay};

/// A blackout window carved out of the bookable grid. Exactly one of the two
/// shapes is populated: one-off (`start_time`/`end_time`) or recurring weekly
/// (`recurring_day_of_week` + `recurring_start`/`recurring_end`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTimeSlot {
    pub id: String,
    pub location_id: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub is_recurring: bool,
    pub recurring_day_of_week: Option<u8>,
    pub recurring_start: Option<TimeOfDay>,
    pub recurring_end: Option<TimeOfDay>,
    pub reason: Option<String>,
}

impl BlockedTimeSlot {
    /// Half-open overlap against a candidate slot [start, end) on `date`.
    /// Recurring rules compare weekday and minute-of-day only; their own
    /// date fields are irrelevant.
    pub fn overlaps(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if self.is_recurring {
            let (Some(day), Some(rec_start), Some(rec_end)) = (
                self.recurring_day_of_week,
                self.recurring_start,
                self.recurring_end,
            ) else {
                return false;
            };
            if weekday_of(date) != day {
                return false;
            }
            let slot_start = minute_of_day(start);
            let slot_end = minute_of_day(end);
            slot_start < rec_end.minutes() && slot_end > rec_start.minutes()
        } else {
            match (self.start_time, self.end_time) {
                (Some(block_start), Some(block_end)) => start < block_end && end > block_start,
                _ => false,
            }
        }
    }
}

fn minute_of_day(dt: NaiveDateTime) -> u32 {
    dt.time().hour() * 60 + dt.time().minute()
}
