//! The cache itself.
//!
//! All state lives behind one [`parking_lot::Mutex`]: entry map, recency order,
//! per-path key sets and the reverse dependency index are always updated together,
//! so a reader never observes an entry without its index edges (or the reverse).

use parking_lot::Mutex;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use crate::key::CacheKey;
use crate::stats::CacheStats;

/// Compiled output for one file snapshot.
///
/// Entries are handed out behind `Arc` and never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub output: Vec<u8>,
    /// Module paths the output depends on, in the order the transform reported them.
    pub dependencies: Vec<String>,
    pub size_bytes: u64,
}

#[derive(Debug)]
struct Slot {
    entry: Arc<CacheEntry>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Slot>,
    /// Oldest access first.
    recency: BTreeMap<u64, CacheKey>,
    keys_by_path: HashMap<String, HashSet<CacheKey>>,
    /// Dependency path -> paths of live entries that declared it.
    dependents: HashMap<String, HashSet<String>>,
    clock: u64,
    size_bytes: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let now = self.tick();
        let slot = self.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut slot.last_used, now);
        let entry = Arc::clone(&slot.entry);
        self.recency.remove(&previous);
        self.recency.insert(now, key.clone());
        Some(entry)
    }

    fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        let now = self.tick();
        self.size_bytes += entry.size_bytes;

        for dependency in &entry.dependencies {
            self.dependents
                .entry(dependency.clone())
                .or_default()
                .insert(key.path.clone());
        }
        self.keys_by_path
            .entry(key.path.clone())
            .or_default()
            .insert(key.clone());
        self.recency.insert(now, key.clone());
        self.entries.insert(
            key,
            Slot {
                entry: Arc::new(entry),
                last_used: now,
            },
        );
    }

    /// Remove one entry and every index reference that only it justified.
    fn remove(&mut self, key: &CacheKey) -> bool {
        let Some(slot) = self.entries.remove(key) else {
            return false;
        };
        self.recency.remove(&slot.last_used);
        self.size_bytes -= slot.entry.size_bytes;

        let path_emptied = match self.keys_by_path.get_mut(&key.path) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => true,
        };
        if path_emptied {
            self.keys_by_path.remove(&key.path);
        }

        for dependency in &slot.entry.dependencies {
            // Another snapshot of the same path may still declare this dependency.
            let still_declared = self.keys_by_path.get(&key.path).is_some_and(|keys| {
                keys.iter().any(|other| {
                    self.entries
                        .get(other)
                        .is_some_and(|s| s.entry.dependencies.contains(dependency))
                })
            });
            if still_declared {
                continue;
            }
            if let Some(paths) = self.dependents.get_mut(dependency) {
                paths.remove(&key.path);
                if paths.is_empty() {
                    self.dependents.remove(dependency);
                }
            }
        }

        true
    }

    fn remove_path(&mut self, path: &str) -> bool {
        let keys: Vec<CacheKey> = self
            .keys_by_path
            .get(path)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();

        let mut removed = false;
        for key in &keys {
            removed |= self.remove(key);
        }
        removed
    }

    fn evict_to(&mut self, max_size: u64) {
        while self.size_bytes > max_size {
            let Some(key) = self.recency.values().next().cloned() else {
                break;
            };
            tracing::debug!(key = %key, "Evicting cache entry");
            if !self.remove(&key) {
                self.recency.pop_first();
            }
        }
    }
}

/// Size-bounded, LRU-evicting transform cache.
///
/// Safe to share between the request path and the reload loop.
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
/// use wren_cache::{CacheKey, TransformCache};
///
/// let cache = TransformCache::new(1024 * 1024);
/// let key = CacheKey::new("src/button.ts", SystemTime::UNIX_EPOCH, 42);
/// cache.set(key.clone(), b"export {}".to_vec(), vec!["src/base.ts".into()]);
///
/// assert!(cache.get(&key).is_some());
/// assert_eq!(cache.invalidate("src/base.ts"), vec!["src/button.ts".to_string()]);
/// assert!(cache.get(&key).is_none());
/// ```
#[derive(Debug)]
pub struct TransformCache {
    max_size: u64,
    state: Mutex<CacheState>,
}

impl TransformCache {
    /// Create an empty cache holding at most `max_size` bytes of output.
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Exact lookup. A hit marks the entry most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let mut state = self.state.lock();
        match state.touch(key) {
            Some(entry) => {
                state.hits += 1;
                Some(entry)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Insert or replace the entry for `key`, then evict least recently used entries
    /// until the cache is back under capacity.
    ///
    /// Output larger than the whole capacity is not cached; an older entry under the
    /// same key is still dropped because it is being replaced.
    pub fn set(&self, key: CacheKey, output: Vec<u8>, dependencies: Vec<String>) {
        let size_bytes = output.len() as u64;
        let mut state = self.state.lock();

        state.remove(&key);

        if size_bytes > self.max_size {
            tracing::debug!(
                key = %key,
                size_bytes,
                max_size = self.max_size,
                "Output exceeds cache capacity, not caching"
            );
            return;
        }

        let mut seen = HashSet::default();
        let dependencies = dependencies
            .into_iter()
            .filter(|dep| seen.insert(dep.clone()))
            .collect();

        state.insert(
            key,
            CacheEntry {
                output,
                dependencies,
                size_bytes,
            },
        );
        state.evict_to(self.max_size);
    }

    /// Remove every entry for `path` and every entry that transitively depends on it.
    ///
    /// Returns each path whose entries were removed exactly once, in breadth-first
    /// order starting from `path`. Dependency cycles terminate because every path is
    /// visited at most once.
    pub fn invalidate(&self, path: &str) -> Vec<String> {
        let mut state = self.state.lock();

        let mut invalidated = Vec::new();
        let mut visited: HashSet<String> = HashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(path.to_string());
        queue.push_back(path.to_string());

        while let Some(current) = queue.pop_front() {
            // Copy before removal: removing dependents mutates this set.
            let mut dependents: Vec<String> = state
                .dependents
                .get(&current)
                .map(|paths| paths.iter().cloned().collect())
                .unwrap_or_default();
            dependents.sort();

            if state.remove_path(&current) {
                invalidated.push(current);
            }

            for dependent in dependents {
                if visited.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }

        invalidated
    }

    /// Drop all entries. Hit and miss counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
        state.keys_by_path.clear();
        state.dependents.clear();
        state.size_bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate: CacheStats::compute_hit_rate(state.hits, state.misses),
            size_bytes: state.size_bytes,
            max_size: self.max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any snapshot of `path` is cached.
    pub fn contains_path(&self, path: &str) -> bool {
        self.state.lock().keys_by_path.contains_key(path)
    }

    /// Paths of cached entries that declared `dependency`, sorted.
    pub fn dependents_of(&self, dependency: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut paths: Vec<String> = state
            .dependents
            .get(dependency)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}
