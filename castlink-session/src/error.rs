use castlink_core::{RoomCode, RoomCodeError};
use thiserror::Error;

/// Failures that end a session or prevent one from starting.
///
/// Store outages are deliberately absent: a failed store call only skips the
/// current publish or poll attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to acquire local media: {0}")]
    MediaAcquisitionFailed(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    /// Capture stopped outside the session, e.g. permission revoked.
    #[error("local media ended")]
    MediaEnded,

    #[error("invalid room code: {0}")]
    InvalidRoomCode(#[from] RoomCodeError),

    #[error("a session is already running")]
    SessionActive,
}

impl SessionError {
    pub(crate) fn negotiation(what: &str, err: anyhow::Error) -> Self {
        Self::NegotiationFailed(format!("{}: {:#}", what, err))
    }
}
