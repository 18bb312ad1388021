use std::sync::Arc;

use anyhow::{Context, Result};
use tally_core::adapters::outbound::{HarvestAdapter, JsonFileStore, LogObserver};
use tally_core::domain::{
    events,
    models::SessionIdentity,
    ports::{inbound::TimerService, outbound::TimerObserver},
    services::{IdentityOutcome, IdentityService, TimerReconciler},
};
use tokio::task::JoinHandle;

use crate::config::TallyConfig;
use crate::session_store;
use crate::status_file::StatusFileObserver;

pub type Reconciler = TimerReconciler<HarvestAdapter, JsonFileStore>;

/// Everything a command needs, wired for one run of the binary.
pub struct Session {
    pub client: Arc<HarvestAdapter>,
    pub reconciler: Arc<Reconciler>,
    pub identity: IdentityOutcome,
    dispatcher: JoinHandle<()>,
}

impl Session {
    /// Drop the reconciler's event sender and wait for queued notifications.
    pub async fn finish(self) {
        let Session {
            reconciler,
            dispatcher,
            ..
        } = self;
        drop(reconciler);
        if let Err(e) = dispatcher.await {
            tracing::debug!("Event dispatcher ended abnormally: {}", e);
        }
    }
}

/// Validate identity, restore the persisted timer and reconcile once.
pub async fn start_session(config: &TallyConfig) -> Result<Session> {
    let credentials = session_store::load_credentials()?
        .context("Not logged in. Run `tally login --subdomain <name>` first.")?;

    let client = Arc::new(HarvestAdapter::new(credentials));
    let store = Arc::new(JsonFileStore::new(TallyConfig::state_path()?));
    let session_identity = Arc::new(SessionIdentity::default());

    let identity = IdentityService::new(
        client.clone(),
        store.clone(),
        session_identity.clone(),
        config.identity.clone(),
    )
    .validate()
    .await;
    if identity.is_degraded() {
        eprintln!("Warning: could not reach Harvest, showing last known state.");
    }

    let (tx, rx) = events::channel();
    let observers: Vec<Arc<dyn TimerObserver>> = vec![
        Arc::new(LogObserver),
        Arc::new(StatusFileObserver::new(TallyConfig::status_path()?)),
    ];
    let dispatcher = events::spawn_dispatcher(rx, observers);

    let reconciler = Arc::new(
        TimerReconciler::new(client.clone(), store, session_identity).with_events(tx),
    );
    reconciler.restore().await;
    let outcome = reconciler.reconcile().await;
    tracing::debug!("Initial reconcile: {}", outcome.action().as_str());

    Ok(Session {
        client,
        reconciler,
        identity,
        dispatcher,
    })
}
