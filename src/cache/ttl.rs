//! Namespaced expiry cache for small name lists.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace};

use super::{deadline, is_fresh};
use crate::clock::{Clock, SystemClock};

/// Well-known cache namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Scene names reported by the live system.
    Scenes,
    /// Saved preset names.
    Presets,
    /// Source names inside one scene.
    Sources(String),
}

impl Namespace {
    /// Key under which the namespace is stored.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parses `scenes`, `presets` or `sources:<scene>`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scenes" => Some(Self::Scenes),
            "presets" => Some(Self::Presets),
            _ => s
                .strip_prefix("sources:")
                .filter(|scene| !scene.is_empty())
                .map(|scene| Self::Sources(scene.to_string())),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scenes => f.write_str("scenes"),
            Self::Presets => f.write_str("presets"),
            Self::Sources(scene) => write!(f, "sources:{scene}"),
        }
    }
}

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// `None` when the TTL overflows the clock; such entries never expire.
    pub expires_at: Option<Instant>,
}

/// Entry counts reported by [`TtlCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
}

/// Expiry-based cache keyed by namespace.
///
/// Every namespace carries its own expiry. Entries live in a sharded map, so
/// a write to one namespace does not stall readers of the others.
///
/// Every `invalidate` and `reset` bumps a generation counter. A caller that
/// fetched on a miss can store its result with [`TtlCache::set_unless_invalidated`]
/// so a list read before a concurrent invalidation is not served afterwards.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a cache driven by the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            clock,
        }
    }

    /// Returns the value for `namespace` if it has not expired.
    pub fn get(&self, namespace: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(namespace)?;
        if is_fresh(entry.expires_at, now) {
            trace!(namespace, "Cache hit");
            Some(entry.value.clone())
        } else {
            trace!(namespace, "Cache entry expired");
            None
        }
    }

    /// Stores `value` under `namespace` for `ttl`.
    pub fn set(&self, namespace: &str, value: V, ttl: Duration) {
        let expires_at = deadline(self.clock.now(), ttl);
        self.entries
            .insert(namespace.to_string(), CacheEntry { value, expires_at });
        trace!(namespace, ttl_ms = ttl.as_millis(), "Cache set");
    }

    /// Current invalidation generation. Read it before fetching on a miss.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stores `value` unless an invalidation or reset happened since `since`.
    ///
    /// The check runs after the insert, so an invalidation racing with this
    /// call either removes the entry itself or is seen here. Returns false
    /// when the value was dropped.
    pub fn set_unless_invalidated(
        &self,
        namespace: &str,
        value: V,
        ttl: Duration,
        since: u64,
    ) -> bool {
        self.set(namespace, value, ttl);
        if self.generation() == since {
            return true;
        }
        self.entries.remove(namespace);
        debug!(namespace, since, "Dropped value fetched before an invalidation");
        false
    }

    /// Drops a single namespace.
    pub fn invalidate(&self, namespace: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.entries.remove(namespace).is_some() {
            debug!(namespace, "Cache namespace invalidated");
        }
    }

    /// Clears every namespace.
    ///
    /// Shards are cleared one after another, not under a single lock, so a
    /// `set` racing with the reset may survive it. A `set_unless_invalidated`
    /// racing with it does not. Meant for test isolation between runs.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        debug!("Cache reset");
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| is_fresh(entry.expires_at, now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored namespaces, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let fresh = self
            .entries
            .iter()
            .filter(|e| is_fresh(e.value().expires_at, now))
            .count();
        CacheStats {
            total: self.entries.len(),
            fresh,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
