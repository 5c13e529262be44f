//! Upstream client cache
//!
//! Bounded LRU of constructed upstream clients keyed by [`ClientFingerprint`].
//! Entries expire a fixed time after creation. Construction is single-flight
//! per fingerprint: concurrent misses for the same key wait on one builder
//! and then share its result.
//!
//! ## Locking
//!
//! Entry bookkeeping lives behind a `parking_lot::Mutex` that is only held for
//! map operations, never across an `.await`. Per-fingerprint construction is
//! serialized by a `tokio::sync::Mutex` looked up in a separate in-flight map.

use gateway_core::ClientFingerprint;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default maximum number of cached clients
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default entry lifetime (30 minutes)
pub const DEFAULT_TTL_SECS: u64 = 30 * 60;

/// Default period of the background expiry sweep
pub const DEFAULT_SWEEP_SECS: u64 = 60;

/// Cache sizing and expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_size: usize,
    /// Maximum age of an entry, measured from creation
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
        }
    }
}

/// A handle served by the cache
#[derive(Debug, Clone)]
pub struct Lease<H> {
    pub handle: H,
    /// True when the handle existed before this request
    pub cached: bool,
}

/// Point-in-time cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

#[derive(Debug)]
struct CacheEntry<H> {
    handle: H,
    created_at: Instant,
    last_accessed: Instant,
}

impl<H> CacheEntry<H> {
    fn new(handle: H) -> Self {
        let now = Instant::now();
        Self {
            handle,
            created_at: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.created_at) >= ttl
    }
}

/// LRU + TTL cache of upstream client handles
pub struct ClientCache<H> {
    config: CacheConfig,
    /// Insertion order is recency order: front is least recently used
    entries: Mutex<IndexMap<ClientFingerprint, CacheEntry<H>>>,
    inflight: Mutex<HashMap<ClientFingerprint, Arc<AsyncMutex<()>>>>,
}

impl<H: Clone> ClientCache<H> {
    pub fn new(config: CacheConfig) -> Self {
        info!(
            "Client cache configured: max_size={}, ttl={:?}",
            config.max_size, config.ttl
        );
        Self {
            config,
            entries: Mutex::new(IndexMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached handle for `fingerprint`, or build it with `factory`
    ///
    /// At most one `factory` runs per fingerprint at a time. A failed build
    /// caches nothing and its error is returned unchanged; the next waiter, if
    /// any, tries again.
    pub async fn get_or_create<F, Fut, E>(
        &self,
        fingerprint: &ClientFingerprint,
        factory: F,
    ) -> Result<Lease<H>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<H, E>>,
    {
        if let Some(handle) = self.lookup(fingerprint) {
            debug!("Client cache hit for {}", fingerprint);
            return Ok(Lease {
                handle,
                cached: true,
            });
        }

        let ticket = self.inflight_ticket(fingerprint);
        let _building = ticket.lock.lock().await;

        // Another task may have finished building while we waited
        if let Some(handle) = self.lookup(fingerprint) {
            debug!("Client for {} built by a concurrent request", fingerprint);
            return Ok(Lease {
                handle,
                cached: true,
            });
        }

        debug!("Client cache miss for {}, constructing", fingerprint);
        match factory().await {
            Ok(handle) => {
                self.insert(fingerprint.clone(), handle.clone());
                Ok(Lease {
                    handle,
                    cached: false,
                })
            }
            Err(e) => {
                warn!("Client construction failed for {}", fingerprint);
                Err(e)
            }
        }
    }

    /// Unexpired handle for `fingerprint`, marking it recently used
    pub fn get(&self, fingerprint: &ClientFingerprint) -> Option<H> {
        self.lookup(fingerprint)
    }

    /// Store a handle, evicting the least recently used entry when full
    pub fn insert(&self, fingerprint: ClientFingerprint, handle: H) {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let ttl = self.config.ttl;
        entries.retain(|_, entry| !entry.is_expired(ttl, now));

        // Re-inserting moves the key to the most recent position
        entries.shift_remove(&fingerprint);

        while entries.len() >= self.config.max_size.max(1) {
            match entries.shift_remove_index(0) {
                Some((evicted, entry)) => debug!(
                    "Evicted least recently used client {} (idle {:?})",
                    evicted,
                    now.duration_since(entry.last_accessed)
                ),
                None => break,
            }
        }

        debug!("Cached client {} ({} entries)", fingerprint, entries.len() + 1);
        entries.insert(fingerprint, CacheEntry::new(handle));
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &ClientFingerprint) -> bool {
        let removed = self.entries.lock().shift_remove(fingerprint).is_some();
        if removed {
            debug!("Invalidated cached client {}", fingerprint);
        }
        removed
    }

    /// Remove everything, returning the number of entries dropped
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        info!("Cleared {} cached clients", cleared);
        cleared
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let ttl = self.config.ttl;
        let size = self
            .entries
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(ttl, now))
            .count();

        CacheStats {
            size,
            max_size: self.config.max_size,
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.ttl;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl, now));
        before - entries.len()
    }

    fn lookup(&self, fingerprint: &ClientFingerprint) -> Option<H> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let index = entries.get_index_of(fingerprint)?;

        let expired = entries
            .get_index(index)
            .map(|(_, entry)| entry.is_expired(self.config.ttl, now))
            .unwrap_or(true);
        if expired {
            entries.shift_remove_index(index);
            debug!("Cached client {} expired", fingerprint);
            return None;
        }

        let last = entries.len() - 1;
        entries.move_index(index, last);
        let (_, entry) = entries.get_index_mut(last)?;
        entry.last_accessed = now;
        Some(entry.handle.clone())
    }

    fn inflight_ticket(&self, fingerprint: &ClientFingerprint) -> InflightTicket<'_, H> {
        let lock = self
            .inflight
            .lock()
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        InflightTicket {
            cache: self,
            fingerprint: fingerprint.clone(),
            lock,
        }
    }
}

impl<H: Clone + Send + 'static> ClientCache<H> {
    /// Spawn the background expiry sweep
    ///
    /// The task holds only a weak reference and exits once the cache is dropped.
    pub fn start(self: &Arc<Self>) -> CacheSweeper {
        let period = self.config.sweep_interval;
        if period.is_zero() {
            warn!("Client cache sweep disabled (zero interval); expiry is checked on access only");
            return CacheSweeper { task: None };
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Swept {} expired clients", purged);
                }
            }
        });

        info!("Client cache sweeper started (every {:?})", period);
        CacheSweeper { task: Some(task) }
    }
}

/// Handle to the background sweep task
#[derive(Debug)]
pub struct CacheSweeper {
    task: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Client cache sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Claim on a fingerprint's construction lock
///
/// Dropping it removes the lock from the in-flight map once no other task
/// holds a clone, including when the owning future is cancelled.
struct InflightTicket<'a, H> {
    cache: &'a ClientCache<H>,
    fingerprint: ClientFingerprint,
    lock: Arc<AsyncMutex<()>>,
}

impl<H> Drop for InflightTicket<'_, H> {
    fn drop(&mut self) {
        let mut inflight = self.cache.inflight.lock();
        let idle = inflight
            .get(&self.fingerprint)
            .is_some_and(|current| Arc::ptr_eq(current, &self.lock) && Arc::strong_count(current) <= 2);
        if idle {
            inflight.remove(&self.fingerprint);
        }
    }
}
