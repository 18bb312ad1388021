use async_trait::async_trait;

use crate::domain::{
    models::{DailyTotals, RunningTimerView, StartTimerRequest, TimeEntry},
    services::ReconcileOutcome,
    TimeTrackingError,
};

/// Inbound port for timer operations.
///
/// Presentation surfaces (the CLI, the sync worker) drive the timer through
/// this trait and never touch the provider directly.
#[async_trait]
pub trait TimerService: Send + Sync + 'static {
    /// Rebuild the view from the locally persisted snapshot, if any.
    ///
    /// No remote call is made; the next reconcile confirms or corrects it.
    async fn restore(&self) -> RunningTimerView;

    /// Start (or resume) a timer for the given project and task.
    async fn start(&self, request: &StartTimerRequest) -> Result<TimeEntry, TimeTrackingError>;

    /// Stop the running timer. Returns `None` when nothing was running.
    async fn stop(&self) -> Result<Option<TimeEntry>, TimeTrackingError>;

    /// Align the local view with the provider's view of today.
    async fn reconcile(&self) -> ReconcileOutcome;

    /// Replace the notes on the running entry. `None` when nothing is running.
    async fn update_notes(&self, notes: &str) -> Result<Option<TimeEntry>, TimeTrackingError>;

    /// A copy of the current view.
    async fn status(&self) -> RunningTimerView;

    /// Advance the live elapsed counter and return it.
    async fn tick(&self) -> u64;

    async fn daily_totals(&self) -> Result<DailyTotals, TimeTrackingError>;

    /// Today's entries belonging to the authenticated user.
    async fn today_entries(&self) -> Result<Vec<TimeEntry>, TimeTrackingError>;
}
