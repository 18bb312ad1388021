use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::TimeEntry;

#[derive(Debug, Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// Something that reacts to timer transitions (a status badge, a log, ...).
///
/// Failures are logged by the dispatcher and never reach the reconciler.
#[async_trait]
pub trait TimerObserver: Send + Sync + 'static {
    async fn on_timer_started(&self, entry: &TimeEntry) -> Result<(), ObserverError>;

    async fn on_timer_stopped(&self) -> Result<(), ObserverError>;
}
