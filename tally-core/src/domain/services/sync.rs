use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SyncSettings;
use crate::domain::ports::inbound::TimerService;

use super::SyncAction;

/// Background loop that reconciles on a fixed period.
///
/// The first pass runs immediately. Dropping the worker stops the loop.
pub struct SyncWorker {
    service: Arc<dyn TimerService>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn new(service: Arc<dyn TimerService>, settings: &SyncSettings) -> Self {
        Self {
            service,
            period: settings.poll_interval(),
            handle: None,
        }
    }

    /// Start polling, replacing any loop this worker already runs.
    pub fn spawn(&mut self) {
        self.stop();

        let service = self.service.clone();
        let period = self.period;
        tracing::info!("Timer sync started (every {}s)", period.as_secs());

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let outcome = service.reconcile().await;
                match outcome.action() {
                    SyncAction::None => tracing::trace!("Timer in sync"),
                    SyncAction::Error => tracing::debug!("Sync pass failed: {:?}", outcome),
                    action => tracing::info!("Sync pass: {}", action.as_str()),
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!("Timer sync stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
