use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use super::{models::TimeEntry, ports::outbound::TimerObserver};

/// Timer transitions published by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Started(TimeEntry),
    Stopped,
}

pub type EventTx = UnboundedSender<TimerEvent>;
pub type EventRx = UnboundedReceiver<TimerEvent>;

pub fn channel() -> (EventTx, EventRx) {
    mpsc::unbounded_channel()
}

/// Fan events out to observers until every sender is dropped.
pub fn spawn_dispatcher(
    mut rx: EventRx,
    observers: Vec<Arc<dyn TimerObserver>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            for observer in &observers {
                let result = match &event {
                    TimerEvent::Started(entry) => observer.on_timer_started(entry).await,
                    TimerEvent::Stopped => observer.on_timer_stopped().await,
                };
                if let Err(e) = result {
                    tracing::warn!("Timer observer failed on {:?}: {}", event_name(&event), e);
                }
            }
        }
        tracing::debug!("Timer event channel closed");
    })
}

fn event_name(event: &TimerEvent) -> &'static str {
    match event {
        TimerEvent::Started(_) => "started",
        TimerEvent::Stopped => "stopped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::mock::{ObservedEvent, RecordingObserver};
    use time::macros::date;

    #[tokio::test]
    async fn dispatcher_delivers_in_order_and_survives_failures() {
        let failing = Arc::new(RecordingObserver::failing());
        let recording = Arc::new(RecordingObserver::default());
        let (tx, rx) = channel();
        let handle = spawn_dispatcher(rx, vec![failing.clone(), recording.clone()]);

        let entry = TimeEntry::new(1, 1, date!(2025 - 09 - 18));
        tx.send(TimerEvent::Started(entry)).unwrap();
        tx.send(TimerEvent::Stopped).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            recording.events(),
            vec![ObservedEvent::Started(1), ObservedEvent::Stopped]
        );
        assert_eq!(failing.events().len(), 2);
    }
}
