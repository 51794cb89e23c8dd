//! Expiry cache for rendered scene thumbnails.
//!
//! Entries are keyed by scene name and hold the encoded image with its MIME
//! type. Failed renders are never stored here; only successful payloads go
//! through [`ThumbnailCache::set`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::{deadline, is_fresh};
use crate::clock::{Clock, SystemClock};

/// Bounds on what the cache may hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailLimits {
    pub max_entries: usize,
    pub max_bytes: usize,
}

impl Default for ThumbnailLimits {
    fn default() -> Self {
        Self {
            max_entries: 32,
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// A thumbnail served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedThumbnail {
    pub image: Arc<[u8]>,
    pub mime_type: String,
}

#[derive(Debug)]
struct ThumbnailEntry {
    image: Arc<[u8]>,
    mime_type: String,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Entries {
    by_scene: HashMap<String, ThumbnailEntry>,
    total_bytes: usize,
}

impl Entries {
    fn remove(&mut self, scene: &str) -> Option<ThumbnailEntry> {
        let entry = self.by_scene.remove(scene)?;
        self.total_bytes -= entry.image.len();
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .by_scene
            .iter()
            .filter(|(_, e)| !is_fresh(e.expires_at, now))
            .map(|(scene, _)| scene.clone())
            .collect();
        for scene in expired {
            self.remove(&scene);
        }
    }

    fn evict_soonest_expiring(&mut self) -> bool {
        let victim = self
            .by_scene
            .iter()
            .min_by_key(|(_, e)| (e.expires_at.is_none(), e.expires_at))
            .map(|(scene, _)| scene.clone());
        match victim {
            Some(scene) => {
                trace!(scene = %scene, "Evicting thumbnail");
                self.remove(&scene);
                true
            }
            None => false,
        }
    }
}

/// Size-capped expiry cache of scene thumbnails.
pub struct ThumbnailCache {
    entries: RwLock<Entries>,
    limits: ThumbnailLimits,
    clock: Arc<dyn Clock>,
}

impl ThumbnailCache {
    #[must_use]
    pub fn new(limits: ThumbnailLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(limits: ThumbnailLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            limits,
            clock,
        }
    }

    /// Returns the cached thumbnail for `scene` if it has not expired.
    pub fn get(&self, scene: &str) -> Option<CachedThumbnail> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.by_scene.get(scene)?;
        if !is_fresh(entry.expires_at, now) {
            trace!(scene, "Thumbnail expired");
            return None;
        }
        Some(CachedThumbnail {
            image: Arc::clone(&entry.image),
            mime_type: entry.mime_type.clone(),
        })
    }

    /// Stores a rendered thumbnail, evicting older entries to stay in bounds.
    ///
    /// Returns false if the payload alone exceeds the byte cap and was not stored.
    pub fn set(
        &self,
        scene: &str,
        image: impl Into<Arc<[u8]>>,
        mime_type: &str,
        ttl: Duration,
    ) -> bool {
        let image: Arc<[u8]> = image.into();
        if image.len() > self.limits.max_bytes || self.limits.max_entries == 0 {
            warn!(
                scene,
                bytes = image.len(),
                max_bytes = self.limits.max_bytes,
                "Thumbnail too large to cache"
            );
            return false;
        }

        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(scene);
        entries.purge_expired(now);

        while entries.by_scene.len() >= self.limits.max_entries
            || entries.total_bytes + image.len() > self.limits.max_bytes
        {
            if !entries.evict_soonest_expiring() {
                break;
            }
        }

        entries.total_bytes += image.len();
        debug!(scene, bytes = image.len(), mime_type, "Thumbnail cached");
        entries.by_scene.insert(
            scene.to_string(),
            ThumbnailEntry {
                image,
                mime_type: mime_type.to_string(),
                expires_at: deadline(now, ttl),
            },
        );
        true
    }

    /// Drops the thumbnail for one scene.
    pub fn invalidate(&self, scene: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(scene);
    }

    /// Clears every cached thumbnail.
    pub fn reset(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *entries = Entries::default();
        debug!("Thumbnail cache reset");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_scene
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of cached payload sizes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .total_bytes
    }

    #[must_use]
    pub const fn limits(&self) -> ThumbnailLimits {
        self.limits
    }
}
