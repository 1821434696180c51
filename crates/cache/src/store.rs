use std::collections::HashMap;
use std::sync::Arc;

use time::UtcDateTime;
use tokio::sync::RwLock;

use crate::models::{TeacherResource, UnitKey};

/// Diagnostic view of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub inserted: UtcDateTime,
    pub len: usize,
}

#[derive(Debug)]
struct Entry {
    inserted: UtcDateTime,
    resources: Arc<[TeacherResource]>,
}

/// Process-lifetime memo of resolved units.
///
/// At most one entry per key. Entries never expire; a later `put` for the
/// same key replaces the earlier list wholesale and [`clear`](Self::clear) is
/// the only reset. Lists are handed out as shared `Arc<[_]>` slices so
/// readers never copy or observe a partially written entry.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<UnitKey, Entry>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &UnitKey) -> Option<Arc<[TeacherResource]>> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| entry.resources.clone())
    }

    /// Store `resources` under `key`, replacing any previous entry.
    pub async fn put(&self, key: UnitKey, resources: impl Into<Arc<[TeacherResource]>>) -> Arc<[TeacherResource]> {
        let resources = resources.into();
        let entry = Entry {
            inserted: UtcDateTime::now(),
            resources: resources.clone(),
        };
        let previous = self.entries.write().await.insert(key.clone(), entry);
        if previous.is_some() {
            tracing::debug!(key = %key, count = resources.len(), "Replaced cached resources");
        } else {
            tracing::debug!(key = %key, count = resources.len(), "Cached resources");
        }
        resources
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::info!(dropped, "Resource cache cleared");
    }

    pub async fn contains(&self, key: &UnitKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Insertion time and list length for `key`.
    pub async fn entry_info(&self, key: &UnitKey) -> Option<EntryInfo> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| EntryInfo {
            inserted: entry.inserted,
            len: entry.resources.len(),
        })
    }

    /// Every cached key, sorted.
    pub async fn keys(&self) -> Vec<UnitKey> {
        let mut keys: Vec<UnitKey> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
