//! Preset data types.
//!
//! A preset is a named snapshot of per-source visibility for one scene. The
//! scene and its sources may have changed or disappeared by the time the
//! preset is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::live::SourceState;

/// A saved visibility snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePreset {
    /// Database ID (set after loading from the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique preset name.
    pub name: String,
    /// Scene the snapshot was captured from.
    pub scene_name: String,
    /// Source visibility, in capture order.
    #[serde(default)]
    pub sources: Vec<SourceState>,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
}

impl ScenePreset {
    /// Create a new preset stamped with the current time.
    #[must_use]
    pub fn new(name: String, scene_name: String, sources: Vec<SourceState>) -> Self {
        Self {
            id: None,
            name,
            scene_name,
            sources,
            created_at: Utc::now(),
        }
    }

    /// Summary view used for listings.
    #[must_use]
    pub fn summary(&self) -> PresetSummary {
        PresetSummary {
            id: self.id.unwrap_or_default(),
            name: self.name.clone(),
            scene_name: self.scene_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing entry without the source list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSummary {
    pub id: i64,
    pub name: String,
    pub scene_name: String,
    pub created_at: DateTime<Utc>,
}
