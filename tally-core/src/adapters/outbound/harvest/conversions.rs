use chrono::{DateTime, Datelike, NaiveDate, Utc};
use time::{Date, OffsetDateTime};

use crate::domain::{
    models::{AuthenticatedUser, Project, TimeEntry},
    TimeTrackingError,
};

pub fn to_time_date(date: NaiveDate) -> Result<Date, TimeTrackingError> {
    let month = time::Month::try_from(date.month() as u8)
        .map_err(|_| TimeTrackingError::unknown(format!("Invalid month: {}", date.month())))?;
    Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| TimeTrackingError::unknown(format!("Invalid date {}: {}", date, e)))
}

pub fn to_naive_date(date: Date) -> Result<NaiveDate, TimeTrackingError> {
    NaiveDate::from_ymd_opt(date.year(), u8::from(date.month()) as u32, date.day() as u32)
        .ok_or_else(|| TimeTrackingError::validation(format!("Invalid date: {}", date)))
}

pub fn to_offset_datetime(at: DateTime<Utc>) -> Option<OffsetDateTime> {
    let nanos = at.timestamp_nanos_opt()?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos as i128).ok()
}

/// Convert a Harvest time entry to a domain TimeEntry.
pub fn to_domain_time_entry(entry: harvest::TimeEntry) -> Result<TimeEntry, TimeTrackingError> {
    let mut domain = TimeEntry::new(entry.id, entry.user.id, to_time_date(entry.spent_date)?)
        .with_project(entry.project.id, entry.project.name)
        .with_task(entry.task.id, entry.task.name)
        .with_notes(entry.notes.unwrap_or_default())
        .with_hours(entry.hours.unwrap_or(0.0));

    domain.is_running = entry.is_running;
    domain.timer_started_at = entry.timer_started_at.and_then(to_offset_datetime);
    domain.created_at = entry.created_at.and_then(to_offset_datetime);
    Ok(domain)
}

/// Convert a page of entries, skipping malformed stopped ones.
///
/// A running entry that fails to convert is an error: dropping it would read
/// as the timer having been stopped elsewhere.
pub fn to_domain_time_entries(
    entries: Vec<harvest::TimeEntry>,
) -> Result<Vec<TimeEntry>, TimeTrackingError> {
    let mut converted = Vec::with_capacity(entries.len());
    for entry in entries {
        let (id, is_running) = (entry.id, entry.is_running);
        match to_domain_time_entry(entry) {
            Ok(entry) => converted.push(entry),
            Err(e) if is_running => {
                tracing::error!("Running time entry {} could not be read: {}", id, e);
                return Err(e);
            }
            Err(e) => tracing::warn!("Skipping time entry {}: {}", id, e),
        }
    }
    Ok(converted)
}

pub fn to_domain_user(me: harvest::Me) -> AuthenticatedUser {
    let user = AuthenticatedUser::new(me.id, me.full_name());
    match me.email {
        Some(email) => user.with_email(email),
        None => user,
    }
}

pub fn to_domain_project(project: harvest::Project) -> Project {
    let domain = Project::new(project.id, project.name);
    match project.code {
        Some(code) if !code.is_empty() => domain.with_code(code),
        _ => domain,
    }
}
