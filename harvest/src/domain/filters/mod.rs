mod active_filter;
mod time_entry_filter;

pub use active_filter::ActiveFilter;
pub use time_entry_filter::TimeEntryFilter;

pub trait HarvestFilter {
    fn as_query_string(&self) -> String;
}
