use super::HarvestFilter;

/// Query for `GET /time_entries`. Dates are the caller's local civil dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntryFilter {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
    pub user_id: Option<u64>,
    pub page: Option<u32>,
}

impl TimeEntryFilter {
    pub fn new(from: chrono::NaiveDate, to: chrono::NaiveDate) -> Self {
        Self {
            from,
            to,
            user_id: None,
            page: None,
        }
    }

    pub fn single_day(day: chrono::NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl HarvestFilter for TimeEntryFilter {
    fn as_query_string(&self) -> String {
        let mut query = format!(
            "from={}&to={}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        );
        if let Some(user_id) = self.user_id {
            query.push_str(&format!("&user_id={}", user_id));
        }
        if let Some(page) = self.page {
            query.push_str(&format!("&page={}", page));
        }
        query
    }
}
