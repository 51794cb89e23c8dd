//! Durable storage for presets and tool-group flags.
//!
//! The [`Store`] trait is the only persistence seam the core depends on.
//! [`SqliteStore`] is the bundled implementation.
//!
//! # Usage
//!
//! ```ignore
//! use sk::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::open_default()?;
//! for summary in store.list_presets(None)? {
//!     println!("{}: {}", summary.name, summary.scene_name);
//! }
//! ```

mod db;
mod schema;

pub use db::{SqliteStore, default_db_path};
pub use schema::{PresetSummary, ScenePreset};

use std::sync::Arc;

use crate::error::Result;
use crate::tool_groups::ToolGroupFlags;

/// Persistence operations used by the preset engine and tool-group config.
///
/// Preset names are unique: creating a duplicate, or renaming onto an
/// existing name, fails with `PresetExists`. Other failures surface as
/// `Storage` errors.
pub trait Store: Send + Sync {
    /// Inserts a new preset and returns its id.
    fn create_preset(&self, preset: &ScenePreset) -> Result<i64>;

    /// Loads a preset with its sources.
    fn get_preset(&self, name: &str) -> Result<Option<ScenePreset>>;

    /// Lists presets, optionally only those captured from `scene`.
    fn list_presets(&self, scene_filter: Option<&str>) -> Result<Vec<PresetSummary>>;

    /// Renames a preset. Returns false if `old_name` does not exist.
    fn rename_preset(&self, old_name: &str, new_name: &str) -> Result<bool>;

    /// Deletes a preset. Returns false if it does not exist.
    fn delete_preset(&self, name: &str) -> Result<bool>;

    /// Replaces the stored flag matrix.
    fn save_tool_group_config(&self, flags: &ToolGroupFlags) -> Result<()>;

    /// Loads the stored flag matrix, if one was ever saved.
    fn load_tool_group_config(&self) -> Result<Option<ToolGroupFlags>>;
}

/// Shared handle to a store.
pub type SharedStore = Arc<dyn Store>;
