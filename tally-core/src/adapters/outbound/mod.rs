mod file_store;
mod harvest;
mod log_observer;
#[cfg(test)]
pub mod mock;

pub use file_store::JsonFileStore;
pub use harvest::HarvestAdapter;
pub use log_observer::LogObserver;
