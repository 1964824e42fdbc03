use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Ten minutes keeps the upstream happy without serving stale listings for long
pub const DEFAULT_TTL_SECS: u64 = 600;

struct CacheEntry<T> {
    dataset: Arc<Vec<T>>,
    fetched_at: DateTime<Utc>,
}

/// Single-entry cache holding a complete upstream snapshot
///
/// The entry is either absent or a whole dataset as of `fetched_at`. It is
/// only ever replaced, never patched, so readers can't observe a half-updated
/// snapshot. Readers get an `Arc` to the snapshot they saw; a concurrent
/// refresh swaps the entry without disturbing them.
pub struct DatasetCache<T> {
    entry: RwLock<Option<CacheEntry<T>>>,
    ttl: Duration,
}

impl<T> DatasetCache<T> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh dataset, if there is one
    pub fn get(&self) -> Option<Arc<Vec<T>>> {
        self.get_at(Utc::now())
    }

    pub fn get_at(&self, now: DateTime<Utc>) -> Option<Arc<Vec<T>>> {
        let guard = self.entry.read().ok()?;
        let entry = guard.as_ref()?;

        if self.entry_expired(entry, now) {
            debug!("Cached dataset expired (fetched at {})", entry.fetched_at);
            None
        } else {
            Some(Arc::clone(&entry.dataset))
        }
    }

    /// Replace the cached dataset, stamping it with the current time
    pub fn set(&self, dataset: Vec<T>) -> Arc<Vec<T>> {
        self.set_at(dataset, Utc::now())
    }

    pub fn set_at(&self, dataset: Vec<T>, fetched_at: DateTime<Utc>) -> Arc<Vec<T>> {
        let dataset = Arc::new(dataset);

        // A poisoned lock only means another writer panicked mid-swap; the
        // Option inside is still a valid whole entry, so overwrite it
        let mut guard = match self.entry.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(CacheEntry {
            dataset: Arc::clone(&dataset),
            fetched_at,
        });

        dataset
    }

    /// True when there's nothing cached or the cached dataset is past its TTL
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.entry.read() {
            Ok(guard) => guard
                .as_ref()
                .map_or(true, |entry| self.entry_expired(entry, now)),
            Err(_) => true,
        }
    }

    /// When the current snapshot was fetched, fresh or not
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry
            .read()
            .ok()?
            .as_ref()
            .map(|entry| entry.fetched_at)
    }

    /// Number of records in the current snapshot, fresh or not
    pub fn len(&self) -> Option<usize> {
        self.entry
            .read()
            .ok()?
            .as_ref()
            .map(|entry| entry.dataset.len())
    }

    fn entry_expired(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.fetched_at) >= self.ttl
    }
}

impl<T> Default for DatasetCache<T> {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(DEFAULT_TTL_SECS))
    }
}
