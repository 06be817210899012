use async_trait::async_trait;
use castlink_session::{MemoryStore, SignalStore, StoreError};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory store that can be told to fail its next few calls.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_puts: AtomicUsize,
    failing_gets: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_puts(&self, count: usize) {
        self.failing_puts.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_gets(&self, count: usize) {
        self.failing_gets.store(count, Ordering::SeqCst);
    }

    fn should_fail(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SignalStore for FlakyStore {
    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        if Self::should_fail(&self.failing_puts) {
            return Err(StoreError::Transport(format!("injected failure on {}", path)));
        }
        self.inner.put(path, value).await
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        if Self::should_fail(&self.failing_gets) {
            return Err(StoreError::Status(503));
        }
        self.inner.get(path).await
    }
}
