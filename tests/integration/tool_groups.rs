//! Integration tests for tool-group toggling and persistence.

use std::sync::Arc;
use std::thread;

use sk::cancel::CancellationToken;
use sk::error::{ErrorKind, SkError};
use sk::store::{SharedStore, SqliteStore, Store};
use sk::tool_groups::{ToolGroup, ToolGroupConfig, ToolGroupFlags};

use crate::common::{FailingFlagsStore, init_test_logging, memory_store};

fn config(store: SharedStore) -> ToolGroupConfig {
    ToolGroupConfig::load(store, ToolGroupFlags::all_enabled(), &CancellationToken::new()).unwrap()
}

#[test]
fn test_persisted_toggle_survives_restart() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sk.db");
    let cancel = CancellationToken::new();

    {
        let cfg = config(Arc::new(SqliteStore::open(&path).unwrap()));
        let outcome = cfg.set_config("Audio", false, true, &cancel).unwrap();
        assert!(outcome.persisted);
        assert!(outcome.persist_error.is_none());
    }

    let reopened = SqliteStore::open(&path).unwrap();
    let flags = reopened.load_tool_group_config().unwrap().unwrap();
    assert!(!flags.get(ToolGroup::Audio));
    assert!(flags.get(ToolGroup::Core));

    let cfg = config(Arc::new(reopened));
    assert!(!cfg.is_enabled(ToolGroup::Audio));
}

#[test]
fn test_unpersisted_toggle_is_lost_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sk.db");
    let cancel = CancellationToken::new();

    {
        let cfg = config(Arc::new(SqliteStore::open(&path).unwrap()));
        let outcome = cfg.set_config("Design", false, false, &cancel).unwrap();
        assert!(!outcome.persisted);
        assert!(!cfg.is_enabled(ToolGroup::Design));
    }

    let cfg = config(Arc::new(SqliteStore::open(&path).unwrap()));
    assert!(cfg.is_enabled(ToolGroup::Design));
}

#[test]
fn test_invalid_group_leaves_flags_unchanged() {
    let cfg = config(memory_store());
    let cancel = CancellationToken::new();
    cfg.set_config("Visual", false, false, &cancel).unwrap();
    let before = cfg.get_config(None, false).unwrap();

    let err = cfg.set_config("Bogus", true, true, &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("Core, Sources, Audio, Layout, Visual, Design"));

    assert_eq!(cfg.get_config(None, false).unwrap(), before);
}

#[test]
fn test_idempotent_toggle() {
    let cfg = config(memory_store());
    let cancel = CancellationToken::new();

    let first = cfg.set_config("Layout", true, false, &cancel).unwrap();
    let second = cfg.set_config("Layout", true, false, &cancel).unwrap();

    assert!(second.previous_state);
    assert!(second.new_state);
    assert_eq!(first, second);
    assert_eq!(cfg.snapshot(), ToolGroupFlags::all_enabled());
}

#[test]
fn test_persist_failure_keeps_toggle() {
    init_test_logging();
    let store: SharedStore = Arc::new(FailingFlagsStore::new(memory_store()));
    let cfg = config(store);

    let outcome = cfg
        .set_config("Audio", false, true, &CancellationToken::new())
        .unwrap();

    assert!(!outcome.persisted);
    assert_eq!(outcome.persist_error.as_deref(), Some("storage error: disk full"));
    assert!(outcome.previous_state);
    assert!(!outcome.new_state);
    assert!(!cfg.is_enabled(ToolGroup::Audio));
}

#[test]
fn test_cancelled_set_does_not_mutate() {
    let cfg = config(memory_store());
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(
        cfg.set_config("Audio", false, true, &cancel),
        Err(SkError::Cancelled { .. })
    ));
    assert!(cfg.is_enabled(ToolGroup::Audio));
}

#[test]
fn test_get_config_verbose_and_filter() {
    let cfg = config(memory_store());

    let terse = cfg.get_config(Some("sources"), false).unwrap();
    assert_eq!(terse.len(), 1);
    assert_eq!(terse[0].name, ToolGroup::Sources);
    assert!(terse[0].tools.is_none());

    let verbose = cfg.get_config(Some("Sources"), true).unwrap();
    let tools = verbose[0].tools.as_ref().unwrap();
    assert_eq!(tools.len(), verbose[0].tool_count);

    assert_eq!(cfg.get_config(None, false).unwrap().len(), ToolGroup::ALL.len());
}

#[test]
fn test_list_groups_omits_disabled() {
    let cfg = config(memory_store());
    cfg.set_config("Design", false, false, &CancellationToken::new())
        .unwrap();

    let enabled = cfg.list_groups(false);
    assert_eq!(enabled.len(), ToolGroup::ALL.len() - 1);
    assert!(enabled.iter().all(|g| g.name != ToolGroup::Design));

    let all = cfg.list_groups(true);
    assert_eq!(all.len(), ToolGroup::ALL.len());
    assert!(all.iter().any(|g| g.name == ToolGroup::Design && !g.enabled));
}

#[test]
fn test_settings_defaults_used_until_persisted() {
    let store = memory_store();
    let defaults = ToolGroupFlags::with_disabled(&[ToolGroup::Visual]);
    let cfg = ToolGroupConfig::load(store.clone(), defaults, &CancellationToken::new()).unwrap();
    assert!(!cfg.is_enabled(ToolGroup::Visual));

    store
        .save_tool_group_config(&ToolGroupFlags::all_enabled())
        .unwrap();
    let cfg = ToolGroupConfig::load(store, defaults, &CancellationToken::new()).unwrap();
    assert!(cfg.is_enabled(ToolGroup::Visual));
}

#[test]
fn test_concurrent_readers_and_writers() {
    let cfg = Arc::new(config(memory_store()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cfg = Arc::clone(&cfg);
            thread::spawn(move || {
                let cancel = CancellationToken::new();
                for n in 0..50 {
                    if i % 2 == 0 {
                        cfg.set_config("Audio", n % 2 == 0, false, &cancel).unwrap();
                    } else {
                        assert_eq!(cfg.get_config(None, false).unwrap().len(), 6);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(cfg.is_enabled(ToolGroup::Core));
}
