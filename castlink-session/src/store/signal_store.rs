use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),

    #[error("store answered with status {0}")]
    Status(u16),

    #[error("store returned undecodable data: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Status(status.as_u16())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Hierarchical key-value store used as the rendezvous between host and viewer.
///
/// Paths are `/`-separated. Writing `Value::Null` deletes the subtree at that
/// path, and reading an absent path yields `None`. Implementations give no
/// atomicity across paths.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;
}
