use castlink_core::{MailboxEntry, decode_mailbox};
use serde_json::Value;
use std::collections::HashSet;

/// Ledger of remote mailbox entries already handed to the engine.
///
/// Identity is the entry key, not its content: two keys carrying the same
/// candidate are both delivered, and a key is never delivered twice.
#[derive(Debug, Default)]
pub struct Inbox {
    ingested: HashSet<String>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries of `mailbox` not seen before, in key order, and
    /// marks them as ingested.
    pub fn fresh(&mut self, mailbox: Value) -> Vec<MailboxEntry> {
        decode_mailbox(mailbox)
            .into_iter()
            .filter(|entry| self.ingested.insert(entry.key.clone()))
            .collect()
    }
}
