use castlink_core::decode_mailbox;
use castlink_session::{SessionConfig, SessionEvent, SessionState, SignalStore};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Upper bound for any wait. Tests run on paused time, so this costs nothing.
const WAIT_LIMIT: Duration = Duration::from_secs(120);

/// Let `cycles` poll ticks elapse.
pub async fn run_polls(config: &SessionConfig, cycles: u32) {
    tokio::time::sleep(config.poll_interval() * cycles + Duration::from_millis(1)).await;
}

/// Wait until the watched state equals `target`. Returns false on timeout.
pub async fn wait_for_state(rx: &mut watch::Receiver<SessionState>, target: SessionState) -> bool {
    matches!(
        tokio::time::timeout(WAIT_LIMIT, rx.wait_for(|state| *state == target)).await,
        Ok(Ok(_))
    )
}

/// Everything broadcast so far, without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Number of transitions into `state` among `events`.
pub fn entered(events: &[SessionEvent], state: SessionState) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::Transition { to, .. } if *to == state))
        .count()
}

/// Number of entries currently in a mailbox.
pub async fn mailbox_len(store: &dyn SignalStore, path: &str) -> usize {
    match store.get(path).await.unwrap() {
        Some(value) => decode_mailbox(value).len(),
        None => 0,
    }
}
