//! Scene preset capture, storage and replay.
//!
//! A preset is an advisory snapshot of a mutable external system. Applying it
//! sets visibility source by source; sources that were renamed or removed
//! since capture are skipped and reported, never treated as fatal.
//!
//! Lifecycle per name: captured -> saved -> applied (any number of times),
//! renamed, or deleted. This layer adds no locking of its own; uniqueness of
//! names is enforced by the store.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cancel::{CancellationToken, ensure_active};
use crate::error::{Result, SkError};
use crate::live::{SharedClient, SourceState};
use crate::store::{PresetSummary, ScenePreset, SharedStore};

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub id: i64,
    pub source_count: usize,
}

/// A source that could not be restored during apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

/// Outcome of an apply. `applied_count < total_count` signals partial application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub preset: String,
    pub scene_name: String,
    pub applied_count: usize,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSource>,
}

impl ApplyReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.applied_count == self.total_count
    }
}

/// Captures, persists and replays source-visibility snapshots.
pub struct PresetEngine {
    client: SharedClient,
    store: SharedStore,
}

impl PresetEngine {
    #[must_use]
    pub fn new(client: SharedClient, store: SharedStore) -> Self {
        Self { client, store }
    }

    /// Reads every source in `scene` with its current visibility.
    ///
    /// Best effort: the live system may change mid-read and nothing is retried.
    #[instrument(skip(self, cancel))]
    pub fn capture(&self, scene: &str, cancel: &CancellationToken) -> Result<Vec<SourceState>> {
        if scene.trim().is_empty() {
            return Err(SkError::MissingField { field: "scene_name" });
        }
        ensure_active(cancel, "capture")?;
        if !self.client.is_connected() {
            return Err(SkError::Unavailable);
        }
        let sources = self.client.get_scene_sources(scene)?;
        debug!(scene, sources = sources.len(), "Captured scene");
        Ok(sources)
    }

    /// Persists a snapshot under a new name.
    ///
    /// Fails with `PresetExists` if the name is taken; the existing preset
    /// is left as it was.
    #[instrument(skip(self, sources, cancel), fields(sources = sources.len()))]
    pub fn save(
        &self,
        name: &str,
        scene: &str,
        sources: Vec<SourceState>,
        cancel: &CancellationToken,
    ) -> Result<i64> {
        validate_name(name)?;
        if scene.trim().is_empty() {
            return Err(SkError::MissingField { field: "scene_name" });
        }
        ensure_active(cancel, "save preset")?;
        let preset = ScenePreset::new(name.to_string(), scene.to_string(), sources);
        self.store.create_preset(&preset)
    }

    /// Captures `scene` and saves it as `name`.
    ///
    /// The name is checked before the live system is contacted so a duplicate
    /// costs no round trip. The store still enforces uniqueness on insert.
    #[instrument(skip(self, cancel))]
    pub fn capture_and_save(
        &self,
        name: &str,
        scene: &str,
        cancel: &CancellationToken,
    ) -> Result<SaveOutcome> {
        validate_name(name)?;
        ensure_active(cancel, "save preset")?;
        if self.store.get_preset(name)?.is_some() {
            return Err(SkError::PresetExists {
                name: name.to_string(),
            });
        }
        let sources = self.capture(scene, cancel)?;
        let source_count = sources.len();
        let id = self.save(name, scene, sources, cancel)?;
        Ok(SaveOutcome { id, source_count })
    }

    /// Replays a stored snapshot against the live system.
    ///
    /// Per-source failures are skipped and listed in the report. Only a
    /// missing preset, a disconnected live system, or cancellation fail the
    /// whole call.
    #[instrument(skip(self, cancel))]
    pub fn apply(&self, name: &str, cancel: &CancellationToken) -> Result<ApplyReport> {
        ensure_active(cancel, "apply preset")?;
        let preset = self.load(name)?;
        if !self.client.is_connected() {
            return Err(SkError::Unavailable);
        }

        let total_count = preset.sources.len();
        let mut applied_count = 0;
        let mut skipped = Vec::new();

        for source in &preset.sources {
            ensure_active(cancel, "apply preset")?;
            match self
                .client
                .set_source_visible(&preset.scene_name, &source.name, source.visible)
            {
                Ok(()) => applied_count += 1,
                Err(e) => {
                    warn!(
                        preset = %preset.name,
                        scene = %preset.scene_name,
                        source = %source.name,
                        error = %e,
                        "Skipping source"
                    );
                    skipped.push(SkippedSource {
                        name: source.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            preset = %preset.name,
            applied_count,
            total_count,
            "Preset applied"
        );
        Ok(ApplyReport {
            preset: preset.name,
            scene_name: preset.scene_name,
            applied_count,
            total_count,
            skipped,
        })
    }

    /// Lists presets, optionally only those captured from `scene_filter`.
    pub fn list(
        &self,
        scene_filter: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<PresetSummary>> {
        ensure_active(cancel, "list presets")?;
        self.store.list_presets(scene_filter)
    }

    /// Full preset including its source list.
    pub fn get_details(&self, name: &str, cancel: &CancellationToken) -> Result<ScenePreset> {
        ensure_active(cancel, "get preset")?;
        self.load(name)
    }

    /// Renames a preset. A taken `new_name` is rejected by the store.
    #[instrument(skip(self, cancel))]
    pub fn rename(&self, old_name: &str, new_name: &str, cancel: &CancellationToken) -> Result<()> {
        validate_name(new_name)?;
        ensure_active(cancel, "rename preset")?;
        if self.store.rename_preset(old_name, new_name)? {
            Ok(())
        } else {
            Err(SkError::PresetNotFound {
                name: old_name.to_string(),
            })
        }
    }

    #[instrument(skip(self, cancel))]
    pub fn delete(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel, "delete preset")?;
        if self.store.delete_preset(name)? {
            Ok(())
        } else {
            Err(SkError::PresetNotFound {
                name: name.to_string(),
            })
        }
    }

    fn load(&self, name: &str) -> Result<ScenePreset> {
        self.store
            .get_preset(name)?
            .ok_or_else(|| SkError::PresetNotFound {
                name: name.to_string(),
            })
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SkError::MissingField { field: "name" });
    }
    Ok(())
}
