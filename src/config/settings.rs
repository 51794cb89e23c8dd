//! Settings file schema and loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::path::{default_config_path, resolve_path};
use crate::cache::ThumbnailLimits;
use crate::error::{Result, SkError};
use crate::live::ThumbnailOptions;
use crate::store::default_db_path;
use crate::tool_groups::{ToolGroup, ToolGroupFlags};

/// Cache lifetimes and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Lifetime of cached name lists (scenes, presets, sources).
    pub name_ttl_secs: u64,
    /// Lifetime of cached thumbnails.
    pub thumbnail_ttl_secs: u64,
    pub thumbnail_max_entries: usize,
    pub thumbnail_max_bytes: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let limits = ThumbnailLimits::default();
        Self {
            name_ttl_secs: 5,
            thumbnail_ttl_secs: 10,
            thumbnail_max_entries: limits.max_entries,
            thumbnail_max_bytes: limits.max_bytes,
        }
    }
}

/// Where presets and flags are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Initial tool-group flags, used until a matrix has been persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolGroupSettings {
    pub disabled: Vec<String>,
}

/// Effective runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub cache: CacheSettings,
    pub thumbnail: ThumbnailOptions,
    pub storage: StorageSettings,
    pub tool_groups: ToolGroupSettings,
    /// File these settings were read from, if any.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from `explicit`, or from the default location.
    ///
    /// An explicitly named file must exist. A missing default file yields
    /// defaults.
    #[instrument(skip_all, fields(explicit = ?explicit))]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(SkError::ConfigNotFound {
                        path: path.display().to_string(),
                    });
                }
                path.to_path_buf()
            }
            None => {
                let path = default_config_path()?;
                if !path.is_file() {
                    debug!(path = %path.display(), "No settings file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = std::fs::read_to_string(&path)?;
        let settings = Self::from_toml(&contents, Some(&path))?;
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Parses settings text. Relative paths resolve against `origin`'s directory.
    pub fn from_toml(contents: &str, origin: Option<&Path>) -> Result<Self> {
        let mut settings: Self =
            toml::from_str(contents).map_err(|e| SkError::ConfigParse(e.to_string()))?;

        settings.initial_tool_flags()?;

        if let Some(db_path) = settings.storage.db_path.take() {
            let base = origin
                .and_then(Path::parent)
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            settings.storage.db_path = Some(resolve_path(&db_path, &base)?);
        }
        settings.origin = origin.map(Path::to_path_buf);
        Ok(settings)
    }

    /// Database location after defaults are applied.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    /// Flag matrix described by `[tool_groups] disabled`.
    pub fn initial_tool_flags(&self) -> Result<ToolGroupFlags> {
        let disabled = self
            .tool_groups
            .disabled
            .iter()
            .map(|name| name.parse::<ToolGroup>())
            .collect::<Result<Vec<_>>>()?;
        Ok(ToolGroupFlags::with_disabled(&disabled))
    }

    #[must_use]
    pub const fn name_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.name_ttl_secs)
    }

    #[must_use]
    pub const fn thumbnail_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.thumbnail_ttl_secs)
    }

    #[must_use]
    pub const fn thumbnail_limits(&self) -> ThumbnailLimits {
        ThumbnailLimits {
            max_entries: self.cache.thumbnail_max_entries,
            max_bytes: self.cache.thumbnail_max_bytes,
        }
    }
}
