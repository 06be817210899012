use crate::store::SignalStore;
use castlink_core::{IceCandidate, Role, RoomCode, SignalMessage};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Outgoing candidates of one session, published in generation order.
///
/// Each candidate gets a strictly increasing sequence number when it is
/// pushed, so two content-identical emissions still land under distinct keys.
/// A failed write keeps it (and everything after it) queued for the next
/// flush.
pub struct CandidateBuffer {
    code: RoomCode,
    role: Role,
    queue: VecDeque<(u64, IceCandidate)>,
    last_seq: u64,
    finished: bool,
    published: usize,
}

impl CandidateBuffer {
    pub fn new(code: RoomCode, role: Role) -> Self {
        Self {
            code,
            role,
            queue: VecDeque::new(),
            last_seq: 0,
            finished: false,
            published: 0,
        }
    }

    /// Queues a locally gathered candidate. Returns `false` only for
    /// candidates arriving after the end-of-candidates marker.
    pub fn push(&mut self, candidate: IceCandidate) -> bool {
        if self.finished {
            debug!("Dropping candidate gathered after end of candidates");
            return false;
        }
        let seq = self.next_seq();
        self.queue.push_back((seq, candidate));
        true
    }

    /// End of local gathering. Queued candidates still get flushed.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn published(&self) -> usize {
        self.published
    }

    /// Writes queued candidates in order, stopping at the first store error.
    pub async fn flush(&mut self, store: &dyn SignalStore) -> usize {
        let mut written = 0;
        while let Some((seq, candidate)) = self.queue.front() {
            let message = SignalMessage::IceCandidate {
                from: self.role,
                seq: *seq,
                candidate: candidate.clone(),
            };
            let path = message.path(&self.code).to_string();
            let value = match message.into_value() {
                Ok(value) => value,
                Err(e) => {
                    warn!("Dropping unserializable candidate {}: {}", seq, e);
                    self.queue.pop_front();
                    continue;
                }
            };

            if let Err(e) = store.put(&path, value).await {
                warn!("Publishing candidate to {} failed, will retry: {}", path, e);
                break;
            }
            debug!("Published candidate {}", path);
            self.queue.pop_front();
            written += 1;
        }
        self.published += written;
        written
    }

    // Wall-clock milliseconds, bumped when the clock did not advance.
    fn next_seq(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last_seq = now.max(self.last_seq + 1);
        self.last_seq
    }
}
