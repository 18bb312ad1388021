use async_trait::async_trait;

use crate::domain::{
    models::TimeEntry,
    ports::outbound::{ObserverError, TimerObserver},
};

/// Observer that reports timer transitions to the log.
#[derive(Debug, Default)]
pub struct LogObserver;

#[async_trait]
impl TimerObserver for LogObserver {
    async fn on_timer_started(&self, entry: &TimeEntry) -> Result<(), ObserverError> {
        tracing::info!("Timer running: {} ({})", entry.label(), entry.id);
        Ok(())
    }

    async fn on_timer_stopped(&self) -> Result<(), ObserverError> {
        tracing::info!("Timer stopped");
        Ok(())
    }
}
