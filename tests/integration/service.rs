//! Integration tests for the composition root.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use sk::cache::Namespace;
use sk::cancel::CancellationToken;
use sk::config::Settings;
use sk::error::{ErrorKind, SkError};
use sk::live::mock::Operation;
use sk::live::{Disconnected, SourceState};
use sk::service::Service;
use sk::store::{PresetSummary, ScenePreset, SharedStore, Store};
use sk::tool_groups::ToolGroupFlags;

use crate::common::{init_test_logging, memory_store, service_with, studio, write_config};

#[test]
fn test_scene_completions_cached_for_five_seconds() {
    init_test_logging();
    let mock = studio();
    let (svc, clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();

    assert_eq!(
        svc.completions(&Namespace::Scenes, "m", &cancel).unwrap(),
        vec!["Main"]
    );

    mock.add_scene("Movie", vec![]);
    clock.advance(Duration::from_secs(4));
    assert_eq!(
        svc.completions(&Namespace::Scenes, "m", &cancel).unwrap(),
        vec!["Main"]
    );

    clock.advance(Duration::from_secs(2));
    assert_eq!(
        svc.completions(&Namespace::Scenes, "m", &cancel).unwrap(),
        vec!["Main", "Movie"]
    );
    assert_eq!(
        mock.operations()
            .iter()
            .filter(|op| **op == Operation::ListScenes)
            .count(),
        2
    );
}

#[test]
fn test_unavailable_checked_before_population() {
    let mock = studio();
    mock.disconnect();
    let (svc, _clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();

    let err = svc
        .completions(&Namespace::Sources("Main".into()), "", &cancel)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(svc.name_cache().is_empty());

    mock.reconnect();
    assert_eq!(
        svc.completions(&Namespace::Sources("Main".into()), "", &cancel)
            .unwrap(),
        vec!["Cam", "Old"]
    );
}

#[test]
fn test_preset_completions_track_mutations() {
    let (svc, _clock) = service_with(studio(), memory_store());
    let cancel = CancellationToken::new();

    svc.save_preset("Gaming", "Main", &cancel).unwrap();
    assert_eq!(
        svc.completions(&Namespace::Presets, "", &cancel).unwrap(),
        vec!["Gaming"]
    );

    svc.rename_preset("Gaming", "Chatting", &cancel).unwrap();
    assert_eq!(
        svc.completions(&Namespace::Presets, "", &cancel).unwrap(),
        vec!["Chatting"]
    );

    svc.delete_preset("Chatting", &cancel).unwrap();
    assert!(svc.completions(&Namespace::Presets, "", &cancel).unwrap().is_empty());
}

#[test]
fn test_preset_operations_through_service() {
    let mock = studio();
    let (svc, _clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();

    let saved = svc.save_preset("P", "Main", &cancel).unwrap();
    assert_eq!(saved.source_count, 2);

    mock.add_scene("Main", vec![SourceState::new("Cam", false)]);
    let report = svc.apply_preset("P", &cancel).unwrap();
    assert_eq!((report.applied_count, report.total_count), (1, 2));

    let listed = svc.list_presets(Some("Main"), &cancel).unwrap();
    assert_eq!(listed[0].id, saved.id);
    assert_eq!(svc.get_preset_details("P", &cancel).unwrap().sources.len(), 2);
}

#[test]
fn test_thumbnail_mime_follows_bytes() {
    let mock = studio();
    let mut settings = Settings::default();
    settings.thumbnail.format = sk::live::ThumbnailFormat::Jpeg;
    let svc = Service::new(mock.clone(), memory_store(), &settings, &CancellationToken::new())
        .unwrap();

    let thumb = svc.get_thumbnail("Main", &CancellationToken::new()).unwrap();
    assert_eq!(thumb.mime_type, "image/jpeg");
    mock.assert_contains(&Operation::RenderThumbnail {
        scene: "Main".into(),
    });
}

#[test]
fn test_thumbnail_expires_and_rerenders() {
    let mock = studio();
    let (svc, clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();

    svc.get_thumbnail("Main", &cancel).unwrap();
    clock.advance(Duration::from_secs(9));
    assert!(svc.get_thumbnail("Main", &cancel).unwrap().cached);

    clock.advance(Duration::from_secs(1));
    assert!(!svc.get_thumbnail("Main", &cancel).unwrap().cached);
    assert_eq!(mock.render_count(), 2);
}

#[test]
fn test_thumbnail_failure_retried_immediately() {
    let mock = studio();
    let (svc, _clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();

    mock.fail_next_renders(1);
    assert!(svc.get_thumbnail("Main", &cancel).is_err());
    assert!(svc.get_thumbnail("Main", &cancel).is_ok());
}

#[test]
fn test_cancelled_token_skips_round_trips() {
    let mock = studio();
    let (svc, _clock) = service_with(mock.clone(), memory_store());
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(
        svc.completions(&Namespace::Scenes, "", &cancel),
        Err(SkError::Cancelled { .. })
    ));
    assert!(matches!(
        svc.get_thumbnail("Main", &cancel),
        Err(SkError::Cancelled { .. })
    ));
    assert!(matches!(
        svc.save_preset("P", "Main", &cancel),
        Err(SkError::Cancelled { .. })
    ));
    mock.assert_no_operations();
}

#[test]
fn test_open_from_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[tool_groups]\ndisabled = [\"Design\"]\n");
    let settings = Settings::load(Some(&path)).unwrap();
    let cancel = CancellationToken::new();

    let svc = Service::open(Arc::new(Disconnected), &settings, &cancel).unwrap();
    assert!(dir.path().join("sk.db").exists());
    assert!(!svc.tool_enabled("duplicate_source"));
    assert_eq!(svc.list_tool_groups(false).len(), 5);

    svc.set_tool_config("Design", true, true, &cancel).unwrap();
    drop(svc);

    let svc = Service::open(Arc::new(Disconnected), &settings, &cancel).unwrap();
    assert!(svc.tool_enabled("duplicate_source"));
    assert!(svc.get_tool_config(Some("design"), true).unwrap()[0].enabled);
}

type Hook = Box<dyn FnOnce() + Send>;

/// Store that runs a hook once, right after a preset listing is read.
struct ListHookStore {
    inner: SharedStore,
    after_list: Mutex<Option<Hook>>,
}

impl Store for ListHookStore {
    fn create_preset(&self, preset: &ScenePreset) -> sk::Result<i64> {
        self.inner.create_preset(preset)
    }

    fn get_preset(&self, name: &str) -> sk::Result<Option<ScenePreset>> {
        self.inner.get_preset(name)
    }

    fn list_presets(&self, scene_filter: Option<&str>) -> sk::Result<Vec<PresetSummary>> {
        let listed = self.inner.list_presets(scene_filter)?;
        let hook = self.after_list.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(listed)
    }

    fn rename_preset(&self, old_name: &str, new_name: &str) -> sk::Result<bool> {
        self.inner.rename_preset(old_name, new_name)
    }

    fn delete_preset(&self, name: &str) -> sk::Result<bool> {
        self.inner.delete_preset(name)
    }

    fn save_tool_group_config(&self, flags: &ToolGroupFlags) -> sk::Result<()> {
        self.inner.save_tool_group_config(flags)
    }

    fn load_tool_group_config(&self) -> sk::Result<Option<ToolGroupFlags>> {
        self.inner.load_tool_group_config()
    }
}

#[test]
fn test_save_during_preset_fetch_is_not_hidden() {
    init_test_logging();
    let store = Arc::new(ListHookStore {
        inner: memory_store(),
        after_list: Mutex::new(None),
    });
    let (svc, _clock) = service_with(studio(), store.clone());
    let svc = Arc::new(svc);
    let cancel = CancellationToken::new();

    let weak: Weak<Service> = Arc::downgrade(&svc);
    *store.after_list.lock().unwrap() = Some(Box::new(move || {
        let svc = weak.upgrade().unwrap();
        svc.save_preset("Late", "Main", &CancellationToken::new())
            .unwrap();
    }));

    // The listing was read before "Late" existed, so this caller sees it empty.
    assert!(svc.completions(&Namespace::Presets, "", &cancel).unwrap().is_empty());
    // The stale list was not kept: the next call refetches.
    assert_eq!(
        svc.completions(&Namespace::Presets, "", &cancel).unwrap(),
        vec!["Late"]
    );
}
