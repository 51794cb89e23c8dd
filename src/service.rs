//! Composition root exposing the core's operations to a caller.
//!
//! A [`Service`] owns one instance of every cache, the preset engine and the
//! tool-group matrix. Hosts construct it once and hand it to their request
//! handlers; tests build isolated instances instead of sharing globals.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::cache::{Namespace, ThumbnailCache, TtlCache};
use crate::cancel::{CancellationToken, ensure_active};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::{Result, SkError};
use crate::live::{SharedClient, ThumbnailOptions, sniff_mime_type};
use crate::preset::{ApplyReport, PresetEngine, SaveOutcome};
use crate::store::{PresetSummary, ScenePreset, SharedStore, SqliteStore};
use crate::tool_groups::{SetConfigOutcome, ToolGroup, ToolGroupConfig, ToolGroupInfo};

/// A rendered scene preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub image: Arc<[u8]>,
    pub mime_type: String,
    /// True when served from the cache.
    pub cached: bool,
}

/// The caching and consistency core.
pub struct Service {
    client: SharedClient,
    store: SharedStore,
    names: TtlCache<Vec<String>>,
    thumbnails: ThumbnailCache,
    presets: PresetEngine,
    tools: ToolGroupConfig,
    name_ttl: Duration,
    thumbnail_ttl: Duration,
    thumbnail_options: ThumbnailOptions,
}

impl Service {
    /// Builds a service over an existing store.
    pub fn new(
        client: SharedClient,
        store: SharedStore,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        Self::with_clock(client, store, settings, Arc::new(SystemClock), cancel)
    }

    /// Builds a service whose caches read time from `clock`.
    pub fn with_clock(
        client: SharedClient,
        store: SharedStore,
        settings: &Settings,
        clock: Arc<dyn Clock>,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let tools =
            ToolGroupConfig::load(Arc::clone(&store), settings.initial_tool_flags()?, cancel)?;
        Ok(Self {
            presets: PresetEngine::new(Arc::clone(&client), Arc::clone(&store)),
            client,
            store,
            names: TtlCache::with_clock(Arc::clone(&clock)),
            thumbnails: ThumbnailCache::with_clock(settings.thumbnail_limits(), clock),
            tools,
            name_ttl: settings.name_ttl(),
            thumbnail_ttl: settings.thumbnail_ttl(),
            thumbnail_options: settings.thumbnail,
        })
    }

    /// Opens the SQLite store named by `settings` and builds a service over it.
    pub fn open(
        client: SharedClient,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        ensure_active(cancel, "open store")?;
        let store: SharedStore = Arc::new(SqliteStore::open(settings.db_path()?)?);
        Self::new(client, store, settings, cancel)
    }

    // === Name completions ===

    /// Names in `namespace` starting with `prefix`, compared case-insensitively.
    ///
    /// The full list is served from the name cache when fresh; otherwise it is
    /// fetched and cached. A disconnected live system never populates the cache.
    /// A list fetched while a preset mutation invalidated the cache is returned
    /// to this caller but not kept.
    #[instrument(skip(self, cancel), fields(namespace = %namespace))]
    pub fn completions(
        &self,
        namespace: &Namespace,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let key = namespace.key();
        let names = match self.names.get(&key) {
            Some(names) => names,
            None => {
                debug!("Name cache miss");
                let since = self.names.generation();
                let names = self.fetch_names(namespace, cancel)?;
                self.names
                    .set_unless_invalidated(&key, names.clone(), self.name_ttl, since);
                names
            }
        };

        let prefix = prefix.to_lowercase();
        Ok(names
            .into_iter()
            .filter(|n| n.to_lowercase().starts_with(&prefix))
            .collect())
    }

    fn fetch_names(
        &self,
        namespace: &Namespace,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        ensure_active(cancel, "fetch names")?;
        match namespace {
            Namespace::Presets => Ok(self
                .store
                .list_presets(None)?
                .into_iter()
                .map(|p| p.name)
                .collect()),
            Namespace::Scenes => {
                self.require_connected()?;
                Ok(self.client.list_scenes()?.names)
            }
            Namespace::Sources(scene) => {
                self.require_connected()?;
                Ok(self
                    .client
                    .get_scene_sources(scene)?
                    .into_iter()
                    .map(|s| s.name)
                    .collect())
            }
        }
    }

    // === Presets ===

    /// Captures `scene` and saves it as `name`.
    pub fn save_preset(
        &self,
        name: &str,
        scene: &str,
        cancel: &CancellationToken,
    ) -> Result<SaveOutcome> {
        let outcome = self.presets.capture_and_save(name, scene, cancel)?;
        self.names.invalidate(&Namespace::Presets.key());
        Ok(outcome)
    }

    pub fn apply_preset(&self, name: &str, cancel: &CancellationToken) -> Result<ApplyReport> {
        self.presets.apply(name, cancel)
    }

    pub fn list_presets(
        &self,
        scene_filter: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<PresetSummary>> {
        self.presets.list(scene_filter, cancel)
    }

    pub fn get_preset_details(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ScenePreset> {
        self.presets.get_details(name, cancel)
    }

    pub fn rename_preset(
        &self,
        old_name: &str,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.presets.rename(old_name, new_name, cancel)?;
        self.names.invalidate(&Namespace::Presets.key());
        Ok(())
    }

    pub fn delete_preset(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.presets.delete(name, cancel)?;
        self.names.invalidate(&Namespace::Presets.key());
        Ok(())
    }

    // === Tool groups ===

    pub fn get_tool_config(
        &self,
        group: Option<&str>,
        verbose: bool,
    ) -> Result<Vec<ToolGroupInfo>> {
        self.tools.get_config(group, verbose)
    }

    pub fn set_tool_config(
        &self,
        group: &str,
        enabled: bool,
        persist: bool,
        cancel: &CancellationToken,
    ) -> Result<SetConfigOutcome> {
        self.tools.set_config(group, enabled, persist, cancel)
    }

    #[must_use]
    pub fn list_tool_groups(&self, include_disabled: bool) -> Vec<ToolGroupInfo> {
        self.tools.list_groups(include_disabled)
    }

    /// Whether the group owning `tool` is enabled. Tools outside every group
    /// are always available.
    #[must_use]
    pub fn tool_enabled(&self, tool: &str) -> bool {
        ToolGroup::owning(tool).is_none_or(|group| self.tools.is_enabled(group))
    }

    // === Thumbnails ===

    /// Returns a preview of `scene`, rendering it on a cache miss.
    ///
    /// Render failures are returned to the caller and never cached.
    #[instrument(skip(self, cancel))]
    pub fn get_thumbnail(&self, scene: &str, cancel: &CancellationToken) -> Result<Thumbnail> {
        if let Some(hit) = self.thumbnails.get(scene) {
            debug!("Thumbnail cache hit");
            return Ok(Thumbnail {
                image: hit.image,
                mime_type: hit.mime_type,
                cached: true,
            });
        }

        ensure_active(cancel, "render thumbnail")?;
        self.require_connected()?;
        let bytes = self
            .client
            .render_thumbnail(scene, &self.thumbnail_options)?;
        let mime_type = sniff_mime_type(&bytes, self.thumbnail_options.format);
        let image: Arc<[u8]> = bytes.into();
        self.thumbnails
            .set(scene, Arc::clone(&image), mime_type, self.thumbnail_ttl);

        Ok(Thumbnail {
            image,
            mime_type: mime_type.to_string(),
            cached: false,
        })
    }

    // === Maintenance ===

    /// Empties both caches.
    pub fn reset_caches(&self) {
        self.names.reset();
        self.thumbnails.reset();
    }

    #[must_use]
    pub const fn name_cache(&self) -> &TtlCache<Vec<String>> {
        &self.names
    }

    #[must_use]
    pub const fn thumbnail_cache(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    #[must_use]
    pub const fn tool_groups(&self) -> &ToolGroupConfig {
        &self.tools
    }

    fn require_connected(&self) -> Result<()> {
        if self.client.is_connected() {
            Ok(())
        } else {
            Err(SkError::Unavailable)
        }
    }
}
