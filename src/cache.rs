//! Short-TTL memoization for aggregation results.
//!
//! An explicit component owning its own state: constructed once, injected
//! where needed, nothing ambient. On miss or expiry callers recompute
//! synchronously and store; concurrent requests for the same expired key may
//! each recompute (staleness up to the TTL is the accepted tradeoff, a
//! thundering herd across one TTL boundary is survivable).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on read.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, (Instant::now(), value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Cache key for aggregation entry points: one slot per distinct query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub op: &'static str,
    pub window: String,
    pub sort: Option<&'static str>,
    pub limit: Option<usize>,
    pub actor: Option<String>,
}

impl QueryKey {
    pub fn new(op: &'static str, window: &str) -> Self {
        Self { op, window: window.to_string(), sort: None, limit: None, actor: None }
    }

    pub fn sort(mut self, sort: &'static str) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }
}
