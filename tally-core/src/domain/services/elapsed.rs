//! Elapsed-time arithmetic for a running timer.
//!
//! A fetched entry reports `hours` that already include the running segment up
//! to the fetch instant. Everything here converts between that snapshot, the
//! segment start and live seconds without counting the segment twice.

use time::{Date, OffsetDateTime};

use crate::domain::models::{DailyTotals, EntryId, TimeEntry};

/// Seconds the segment has been running, never negative.
fn running_seconds(segment_started_at: OffsetDateTime, now: OffsetDateTime) -> f64 {
    (now - segment_started_at).as_seconds_f64().max(0.0)
}

/// Hours banked before the current segment began.
pub fn compute_base_hours(
    hours_at_fetch: f64,
    segment_started_at: OffsetDateTime,
    now: OffsetDateTime,
) -> f64 {
    (hours_at_fetch - running_seconds(segment_started_at, now) / 3600.0).max(0.0)
}

/// Total seconds to display: banked hours plus the live segment, floored.
pub fn compute_elapsed_seconds(
    base_hours: f64,
    segment_started_at: OffsetDateTime,
    now: OffsetDateTime,
) -> u64 {
    let total = base_hours.max(0.0) * 3600.0 + running_seconds(segment_started_at, now);
    total.floor() as u64
}

pub fn hours_to_seconds(hours: f64) -> u64 {
    (hours.max(0.0) * 3600.0).round() as u64
}

/// `HH:MM:SS`; hours keep growing past 99.
pub fn format_hms(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// `H:MM` from one hour up, `M:SS` below.
pub fn format_compact(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    if h > 0 {
        format!("{}:{:02}", h, m)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Sum today's logged time.
///
/// The running entry is left out of the base sum; `live_elapsed_seconds`
/// already covers its banked and live portions.
pub fn aggregate_today(
    entries: &[TimeEntry],
    today: Date,
    running: Option<EntryId>,
    live_elapsed_seconds: u64,
) -> DailyTotals {
    let base_seconds = entries
        .iter()
        .filter(|e| e.date == today)
        .filter(|e| Some(e.id) != running)
        .map(|e| hours_to_seconds(e.hours))
        .sum();

    let total_seconds = match running {
        Some(_) => base_seconds + live_elapsed_seconds,
        None => base_seconds,
    };

    DailyTotals {
        base_seconds,
        total_seconds,
    }
}
