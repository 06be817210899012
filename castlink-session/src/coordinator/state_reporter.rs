use crate::coordinator::{SessionEvent, SessionState};
use crate::error::SessionError;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

/// Fan-out of session state to any number of observers.
#[derive(Clone)]
pub struct StateReporter {
    state: Arc<watch::Sender<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl StateReporter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    pub fn current(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, from: SessionState, to: SessionState) {
        self.state.send_replace(to);
        let _ = self.events.send(SessionEvent::Transition { from, to });
    }

    pub(crate) fn report_failure(&self, err: SessionError) {
        let _ = self.events.send(SessionEvent::Failed(err));
    }
}

impl Default for StateReporter {
    fn default() -> Self {
        Self::new()
    }
}
