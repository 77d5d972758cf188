use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::store::Table;

#[derive(Debug)]
struct CacheEntry {
    sequence: u64,
    inserted_at: Instant,
    table: Arc<Table>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
}

/// Memoizes query results keyed by the rendered query text. Entries expire
/// after the TTL; once the cache is full the oldest entry is evicted. Values
/// are immutable behind `Arc`, so hits are safe to share across readers.
#[derive(Debug)]
pub struct QueryCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl QueryCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Table>> {
        let mut inner = self.inner.lock().expect("query cache mutex poisoned");
        let expired = inner
            .entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed() >= self.ttl)?;
        if expired {
            inner.entries.remove(key);
            return None;
        }
        inner.entries.get(key).map(|entry| entry.table.clone())
    }

    pub fn put(&self, key: String, table: Arc<Table>) {
        let mut inner = self.inner.lock().expect("query cache mutex poisoned");
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.sequence)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                sequence,
                inserted_at: Instant::now(),
                table,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("query cache mutex poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
