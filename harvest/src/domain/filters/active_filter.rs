use super::HarvestFilter;

/// `is_active=true` listing filter shared by projects and task assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveFilter {
    pub page: Option<u32>,
}

impl ActiveFilter {
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl HarvestFilter for ActiveFilter {
    fn as_query_string(&self) -> String {
        match self.page {
            Some(page) => format!("is_active=true&page={}", page),
            None => "is_active=true".to_string(),
        }
    }
}
