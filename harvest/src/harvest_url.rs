use crate::domain::HarvestFilter;

pub const API_BASE_URL: &str = "https://api.harvestapp.com/v2";
pub const ID_BASE_URL: &str = "https://id.getharvest.com/api/v2";

#[derive(Debug, Clone)]
pub struct HarvestURL(String);

impl AsRef<str> for HarvestURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HarvestURL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl HarvestURL {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    pub fn with_filter(&self, filter: &impl HarvestFilter) -> Self {
        let query = filter.as_query_string();
        if query.is_empty() {
            return self.clone();
        }

        if self.0.contains('?') {
            Self(format!("{}&{}", self.0, query))
        } else {
            Self(format!("{}?{}", self.0, query))
        }
    }
}
