use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Query results keyed by path-like segments, e.g. `["auth", "me"]`.
///
/// Entries never go stale on their own; they stay until a matching
/// `invalidate` or `clear`.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<Vec<String>, Value>>>,
}

fn owned_key(key: &[&str]) -> Vec<String> {
    key.iter().map(|segment| segment.to_string()).collect()
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &[&str]) -> Option<T> {
        let value = self.entries.lock().get(&owned_key(key)).cloned()?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Discarding cached query {:?}: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &[&str], data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.entries.lock().insert(owned_key(key), value);
            }
            Err(e) => warn!("Could not cache query {:?}: {}", key, e),
        }
    }

    pub fn contains(&self, key: &[&str]) -> bool {
        self.entries.lock().contains_key(&owned_key(key))
    }

    /// Drops every entry whose key starts with `prefix`; returns how many.
    pub fn invalidate(&self, prefix: &[&str]) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| {
            key.len() < prefix.len() || key.iter().zip(prefix).any(|(a, b)| a.as_str() != *b)
        });
        let removed = before - entries.len();
        debug!("Invalidated {} cached queries under {:?}", removed, prefix);
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
