use castlink_core::MIN_ROOM_CODE_LEN;
use serde::Deserialize;
use std::time::Duration;

/// Tunables for one supervisor and the sessions it runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between two reads of the remote slot/mailbox.
    pub poll_interval_ms: u64,
    /// Length of generated room codes, 5 or 6.
    pub room_code_len: usize,
    /// Whether the host clears `rooms/{code}` when its session ends.
    pub release_room_on_stop: bool,
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            room_code_len: MIN_ROOM_CODE_LEN,
            release_room_on_stop: true,
        }
    }
}
