//! Shared helpers for integration and CLI tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sk::cancel::CancellationToken;
use sk::clock::ManualClock;
use sk::config::Settings;
use sk::error::{Result, SkError};
use sk::live::SourceState;
use sk::live::mock::MockLiveClient;
use sk::service::Service;
use sk::store::{PresetSummary, ScenePreset, SharedStore, SqliteStore, Store};
use sk::tool_groups::ToolGroupFlags;
use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A live system with a "Main" scene holding a camera and an overlay.
#[must_use]
pub fn studio() -> Arc<MockLiveClient> {
    Arc::new(
        MockLiveClient::new()
            .with_scene(
                "Main",
                vec![
                    SourceState::new("Cam", true),
                    SourceState::new("Old", false),
                ],
            )
            .with_scene("BRB", vec![SourceState::new("Slate", true)]),
    )
}

#[must_use]
pub fn memory_store() -> SharedStore {
    Arc::new(SqliteStore::in_memory().expect("in-memory store"))
}

/// Service over `client` and `store` with a manual clock.
pub fn service_with(
    client: Arc<MockLiveClient>,
    store: SharedStore,
) -> (Service, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let service = Service::with_clock(
        client,
        store,
        &Settings::default(),
        clock.clone(),
        &CancellationToken::new(),
    )
    .expect("service");
    (service, clock)
}

/// Writes a settings file whose database lives in `dir`.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!("[storage]\ndb_path = \"sk.db\"\n{extra}");
    std::fs::write(&path, body).expect("write config");
    path
}

/// Store wrapper whose flag persistence always fails.
pub struct FailingFlagsStore {
    inner: SharedStore,
}

impl FailingFlagsStore {
    pub fn new(inner: SharedStore) -> Self {
        Self { inner }
    }
}

impl Store for FailingFlagsStore {
    fn create_preset(&self, preset: &ScenePreset) -> Result<i64> {
        self.inner.create_preset(preset)
    }

    fn get_preset(&self, name: &str) -> Result<Option<ScenePreset>> {
        self.inner.get_preset(name)
    }

    fn list_presets(&self, scene_filter: Option<&str>) -> Result<Vec<PresetSummary>> {
        self.inner.list_presets(scene_filter)
    }

    fn rename_preset(&self, old_name: &str, new_name: &str) -> Result<bool> {
        self.inner.rename_preset(old_name, new_name)
    }

    fn delete_preset(&self, name: &str) -> Result<bool> {
        self.inner.delete_preset(name)
    }

    fn save_tool_group_config(&self, _flags: &ToolGroupFlags) -> Result<()> {
        Err(SkError::Storage("disk full".into()))
    }

    fn load_tool_group_config(&self) -> Result<Option<ToolGroupFlags>> {
        self.inner.load_tool_group_config()
    }
}
