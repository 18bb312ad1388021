use time::{Date, OffsetDateTime};

/// Source of wall-clock time and the user's local calendar.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;

    /// The civil date of `at` in the user's local time zone.
    fn local_date(&self, at: OffsetDateTime) -> Date;

    fn today(&self) -> Date {
        self.local_date(self.now())
    }
}

/// Clock backed by the system time and the OS time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn local_date(&self, at: OffsetDateTime) -> Date {
        use chrono::{Datelike, TimeZone};

        // time::UtcOffset::current_local_offset fails once threads exist.
        let local = match chrono::Local.timestamp_opt(at.unix_timestamp(), 0).single() {
            Some(local) => local.date_naive(),
            None => return at.date(),
        };
        time::Month::try_from(local.month() as u8)
            .ok()
            .and_then(|month| Date::from_calendar_date(local.year(), month, local.day() as u8).ok())
            .unwrap_or_else(|| at.date())
    }
}

/// `YYYY-MM-DD`, the format the provider expects for `spent_date`.
pub fn local_date_string(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn local_date_string_is_zero_padded() {
        assert_eq!(local_date_string(date!(2025 - 01 - 05)), "2025-01-05");
        assert_eq!(local_date_string(date!(2025 - 12 - 31)), "2025-12-31");
    }

    #[test]
    fn system_clock_today_is_within_a_day_of_utc() {
        let clock = SystemClock;
        let now = clock.now();
        let today = clock.today();
        let diff = (today - now.date()).whole_days().abs();
        assert!(diff <= 1);
    }
}
