//! Integration tests for the name and thumbnail caches.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sk::cache::{Namespace, ThumbnailCache, ThumbnailLimits, TtlCache};
use sk::clock::ManualClock;

use crate::common::init_test_logging;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

// ===== TTL cache =====

#[test]
fn test_ttl_hit_before_expiry_miss_after() {
    init_test_logging();
    let clock = Arc::new(ManualClock::new());
    let cache = TtlCache::with_clock(clock.clone());
    let key = Namespace::Scenes.key();

    cache.set(&key, names(&["Main"]), Duration::from_secs(5));

    clock.advance(Duration::from_secs(4));
    assert_eq!(cache.get(&key), Some(names(&["Main"])));

    clock.advance(Duration::from_secs(2));
    assert_eq!(cache.get(&key), None);
}

#[test]
fn test_expiry_is_exclusive_at_boundary() {
    let clock = Arc::new(ManualClock::new());
    let cache = TtlCache::with_clock(clock.clone());
    cache.set("scenes", 1_u32, Duration::from_secs(5));

    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.get("scenes"), None);
}

#[test]
fn test_namespaces_expire_independently() {
    let clock = Arc::new(ManualClock::new());
    let cache = TtlCache::with_clock(clock.clone());
    let scenes = Namespace::Scenes.key();
    let sources = Namespace::Sources("Main".into()).key();

    cache.set(&scenes, names(&["Main"]), Duration::from_secs(2));
    cache.set(&sources, names(&["Cam"]), Duration::from_secs(10));

    clock.advance(Duration::from_secs(3));
    assert_eq!(cache.get(&scenes), None);
    assert_eq!(cache.get(&sources), Some(names(&["Cam"])));

    let stats = cache.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.fresh, 1);
}

#[test]
fn test_reset_misses_every_namespace() {
    let cache = TtlCache::new();
    for ns in [
        Namespace::Scenes,
        Namespace::Presets,
        Namespace::Sources("Main".into()),
    ] {
        cache.set(&ns.key(), names(&["x"]), Duration::from_secs(60));
    }

    cache.reset();

    for ns in [
        Namespace::Scenes,
        Namespace::Presets,
        Namespace::Sources("Main".into()),
    ] {
        assert_eq!(cache.get(&ns.key()), None, "{ns} survived reset");
    }
    assert!(cache.is_empty());
}

#[test]
fn test_last_writer_wins_under_concurrent_set() {
    let cache = Arc::new(TtlCache::new());
    let handles: Vec<_> = (0..8_u32)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..100 {
                    cache.set("scenes", i, Duration::from_secs(60));
                    assert!(cache.get("scenes").is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let value = cache.get("scenes").unwrap();
    assert!(value < 8);
    assert_eq!(cache.len(), 1);
}

// ===== Thumbnail cache =====

#[test]
fn test_thumbnail_expiry() {
    let clock = Arc::new(ManualClock::new());
    let cache = ThumbnailCache::with_clock(ThumbnailLimits::default(), clock.clone());

    assert!(cache.set("Main", vec![1, 2, 3], "image/png", Duration::from_secs(10)));
    clock.advance(Duration::from_secs(9));
    let hit = cache.get("Main").unwrap();
    assert_eq!(&*hit.image, &[1, 2, 3]);
    assert_eq!(hit.mime_type, "image/png");

    clock.advance(Duration::from_secs(1));
    assert!(cache.get("Main").is_none());
}

#[test]
fn test_thumbnail_entry_cap_evicts_soonest_expiring() {
    let clock = Arc::new(ManualClock::new());
    let limits = ThumbnailLimits {
        max_entries: 2,
        max_bytes: 1024,
    };
    let cache = ThumbnailCache::with_clock(limits, clock);

    cache.set("A", vec![0; 8], "image/png", Duration::from_secs(5));
    cache.set("B", vec![0; 8], "image/png", Duration::from_secs(30));
    cache.set("C", vec![0; 8], "image/png", Duration::from_secs(30));

    assert_eq!(cache.len(), 2);
    assert!(cache.get("A").is_none());
    assert!(cache.get("B").is_some());
    assert!(cache.get("C").is_some());
}

#[test]
fn test_thumbnail_byte_cap() {
    let limits = ThumbnailLimits {
        max_entries: 10,
        max_bytes: 100,
    };
    let cache = ThumbnailCache::new(limits);

    assert!(cache.set("A", vec![0; 60], "image/png", Duration::from_secs(30)));
    assert!(cache.set("B", vec![0; 60], "image/png", Duration::from_secs(60)));
    assert!(cache.total_bytes() <= 100);
    assert!(cache.get("A").is_none());

    assert!(!cache.set("Huge", vec![0; 101], "image/png", Duration::from_secs(60)));
    assert!(cache.get("Huge").is_none());
    assert!(cache.get("B").is_some());
}

#[test]
fn test_thumbnail_replace_keeps_byte_count() {
    let cache = ThumbnailCache::new(ThumbnailLimits::default());
    cache.set("Main", vec![0; 40], "image/png", Duration::from_secs(30));
    cache.set("Main", vec![0; 10], "image/jpeg", Duration::from_secs(30));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.total_bytes(), 10);
    assert_eq!(cache.get("Main").unwrap().mime_type, "image/jpeg");
}
