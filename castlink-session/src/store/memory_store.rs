use crate::store::{SignalStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

/// In-process store with the same path-tree semantics as the hosted one.
///
/// Objects are flattened into leaves on write and reassembled on read, so a
/// child can be written or read independently of its parent.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leaves: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn remove_subtree(&self, path: &str) {
        let prefix = format!("{}/", path);
        self.leaves
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    fn remove_scalar_ancestors(&self, path: &str) {
        let mut end = path.len();
        while let Some(idx) = path[..end].rfind('/') {
            self.leaves.remove(&path[..idx]);
            end = idx;
        }
    }

    fn write_leaves(&self, path: &str, value: Value) {
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, child) in map {
                    self.write_leaves(&format!("{}/{}", path, key), child);
                }
            }
            other => {
                self.leaves.insert(path.to_string(), other);
            }
        }
    }

    fn assemble(&self, path: &str) -> Option<Value> {
        let prefix = format!("{}/", path);
        let mut root = Map::new();
        for entry in self.leaves.iter() {
            let Some(rest) = entry.key().strip_prefix(&prefix) else {
                continue;
            };
            insert_nested(&mut root, rest, entry.value().clone());
        }
        if root.is_empty() {
            None
        } else {
            Some(Value::Object(root))
        }
    }
}

fn insert_nested(root: &mut Map<String, Value>, rest: &str, value: Value) {
    match rest.split_once('/') {
        None => {
            root.insert(rest.to_string(), value);
        }
        Some((head, tail)) => {
            let child = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_nested(map, tail, value);
            }
        }
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = normalize(path);
        self.remove_subtree(path);
        if !value.is_null() {
            self.remove_scalar_ancestors(path);
            self.write_leaves(path, value);
        }
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let path = normalize(path);
        if let Some(leaf) = self.leaves.get(path) {
            return Ok(Some(leaf.clone()));
        }
        Ok(self.assemble(path))
    }
}
