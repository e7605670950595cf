//! "What do I take next" lookup over a patient's active schedules.
//!
//! Lookup is same-day only. Times compare as fixed-width `HH:MM:SS`
//! strings, and the current time is truncated to the minute.

use chrono::{NaiveTime, Timelike};

use crate::models::DoseSchedule;

#[derive(Debug, Clone, PartialEq)]
pub enum NextDose {
    /// The patient has no active schedules at all.
    NothingScheduled,
    /// Every dose for today is at or before the current minute.
    NoneLeftToday,
    Upcoming {
        schedule: DoseSchedule,
        remaining_minutes: u32,
    },
}

/// `now` rendered as `HH:MM:00`.
pub fn time_key(now: NaiveTime) -> String {
    format!("{:02}:{:02}:00", now.hour(), now.minute())
}

fn minute_of_day(time: &str) -> Option<u32> {
    let mut parts = time.split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// The first schedule strictly later than `now` today.
pub fn next_dose(now: NaiveTime, schedules: &[DoseSchedule]) -> NextDose {
    if schedules.is_empty() {
        return NextDose::NothingScheduled;
    }

    let now_key = time_key(now);
    let mut sorted: Vec<&DoseSchedule> = schedules.iter().collect();
    sorted.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));

    let Some(next) = sorted
        .into_iter()
        .find(|s| s.scheduled_time.as_str() > now_key.as_str())
    else {
        return NextDose::NoneLeftToday;
    };

    let now_minutes = now.hour() * 60 + now.minute();
    let remaining_minutes = match minute_of_day(&next.scheduled_time) {
        Some(at) => at.saturating_sub(now_minutes),
        None => {
            tracing::warn!(time = %next.scheduled_time, "Malformed scheduled_time");
            0
        }
    };

    NextDose::Upcoming {
        schedule: next.clone(),
        remaining_minutes,
    }
}

/// Spoken duration. Minutes are never singularised.
pub fn format_remaining(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    let unit = if hours > 1 { "hours" } else { "hour" };
    format!("{hours} {unit} and {rest} minutes")
}
