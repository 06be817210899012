use crate::model::signaling::IceCandidate;
use serde_json::Value;

/// One candidate read back from a mailbox. `key` is the entry's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct MailboxEntry {
    pub key: String,
    pub candidate: IceCandidate,
}

/// Splits a mailbox read into entries ordered by sequence.
///
/// Stores that collapse small integer keys hand back an array instead of an
/// object; indices become keys and `null` holes are skipped. Any other shape
/// is treated as an empty mailbox.
pub fn decode_mailbox(value: Value) -> Vec<MailboxEntry> {
    let mut entries: Vec<MailboxEntry> = match value {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(key, v)| MailboxEntry {
                key,
                candidate: IceCandidate::new(v),
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(index, v)| MailboxEntry {
                key: index.to_string(),
                candidate: IceCandidate::new(v),
            })
            .collect(),
        _ => Vec::new(),
    };

    entries.sort_by(|a, b| order_key(&a.key).cmp(&order_key(&b.key)));
    entries
}

// Numeric keys first in numeric order, anything else after them lexically.
fn order_key(key: &str) -> (bool, u64, &str) {
    match key.parse::<u64>() {
        Ok(seq) => (false, seq, key),
        Err(_) => (true, 0, key),
    }
}
