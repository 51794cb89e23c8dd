//! Short-lived caches in front of the live system.
//!
//! - [`TtlCache`]: namespaced name lists (scenes, presets, source names)
//! - [`ThumbnailCache`]: rendered scene previews with size caps
//!
//! Neither cache fetches on a miss. Callers read, fetch from the live system
//! on a miss, then `set`. Two concurrent misses may both fetch; the last
//! `set` wins.

mod thumbnail;
mod ttl;

pub use thumbnail::{CachedThumbnail, ThumbnailCache, ThumbnailLimits};
pub use ttl::{CacheEntry, CacheStats, Namespace, TtlCache};

use std::time::{Duration, Instant};

/// Expiry for an entry stored at `now`. `None` means the TTL runs past the
/// end of the clock's range and the entry never expires.
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

fn is_fresh(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_none_or(|at| now < at)
}
