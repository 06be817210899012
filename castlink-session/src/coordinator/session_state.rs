use crate::error::SessionError;
use castlink_core::{Role, RoomCode, SessionId};
use std::fmt;
use std::time::SystemTime;

/// Lifecycle of one session. `Closed` and `Failed` are terminal and always
/// fall back to `Idle` once teardown completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Host published an offer and waits for an answer.
    Offering,
    /// Viewer is reading the host's offer.
    AwaitingOffer,
    Negotiating,
    Connected,
    Closed,
    Failed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle, Offering | AwaitingOffer) => true,
            (Offering | AwaitingOffer, Negotiating) => true,
            (Negotiating, Connected) => true,
            (Idle | Offering | AwaitingOffer | Negotiating | Connected, Failed) => true,
            (Offering | AwaitingOffer | Negotiating | Connected, Closed) => true,
            (Closed | Failed, Idle) => true,
            _ => false,
        }
    }

    pub fn is_live(self) -> bool {
        !matches!(
            self,
            SessionState::Idle | SessionState::Closed | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Snapshot of the running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub role: Role,
    pub code: RoomCode,
    pub state: SessionState,
    pub created_at: SystemTime,
}

/// Notifications for observers of a supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Transition {
        from: SessionState,
        to: SessionState,
    },
    Failed(SessionError),
}
