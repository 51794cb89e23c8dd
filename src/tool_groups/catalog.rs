//! The closed set of capability groups and their static metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::SkError;

/// A named, independently toggleable bundle of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolGroup {
    /// Scene switching, recording, streaming and status.
    Core,
    /// Source listing and visibility.
    Sources,
    /// Input mute and volume.
    Audio,
    /// Scene presets.
    Layout,
    /// Screenshot sources for visual monitoring.
    Visual,
    /// Source creation and transforms.
    Design,
}

struct GroupMeta {
    name: &'static str,
    description: &'static str,
    tool_count: usize,
    tools: &'static [&'static str],
}

const CORE: GroupMeta = GroupMeta {
    name: "Core",
    description: "Scene management, recording, streaming and connection status",
    tool_count: 11,
    tools: &[
        "list_scenes",
        "set_current_scene",
        "create_scene",
        "remove_scene",
        "start_recording",
        "stop_recording",
        "get_recording_status",
        "start_streaming",
        "stop_streaming",
        "get_streaming_status",
        "get_obs_status",
    ],
};

const SOURCES: GroupMeta = GroupMeta {
    name: "Sources",
    description: "Source listing, visibility toggles and input settings",
    tool_count: 5,
    tools: &[
        "list_sources",
        "toggle_source_visibility",
        "get_source_settings",
        "get_input_list",
        "get_input_kind_list",
    ],
};

const AUDIO: GroupMeta = GroupMeta {
    name: "Audio",
    description: "Input mute state and volume control",
    tool_count: 4,
    tools: &[
        "get_input_mute",
        "toggle_input_mute",
        "set_input_volume",
        "get_input_volume",
    ],
};

const LAYOUT: GroupMeta = GroupMeta {
    name: "Layout",
    description: "Scene presets: save, apply, list, rename and delete",
    tool_count: 6,
    tools: &[
        "save_scene_preset",
        "apply_scene_preset",
        "list_scene_presets",
        "get_preset_details",
        "rename_scene_preset",
        "delete_scene_preset",
    ],
};

const VISUAL: GroupMeta = GroupMeta {
    name: "Visual",
    description: "Scene thumbnails and periodic screenshot sources",
    tool_count: 5,
    tools: &[
        "get_source_screenshot",
        "create_screenshot_source",
        "remove_screenshot_source",
        "list_screenshot_sources",
        "configure_screenshot_cadence",
    ],
};

const DESIGN: GroupMeta = GroupMeta {
    name: "Design",
    description: "Source creation, transforms, cropping and ordering",
    tool_count: 14,
    tools: &[
        "create_text_source",
        "create_image_source",
        "create_color_source",
        "create_browser_source",
        "create_media_source",
        "set_source_transform",
        "get_source_transform",
        "set_source_crop",
        "set_source_bounds",
        "set_source_order",
        "set_source_blend_mode",
        "set_source_locked",
        "duplicate_source",
        "remove_source",
    ],
};

impl ToolGroup {
    /// Every group, in display order.
    pub const ALL: [Self; 6] = [
        Self::Core,
        Self::Sources,
        Self::Audio,
        Self::Layout,
        Self::Visual,
        Self::Design,
    ];

    const fn meta(self) -> &'static GroupMeta {
        match self {
            Self::Core => &CORE,
            Self::Sources => &SOURCES,
            Self::Audio => &AUDIO,
            Self::Layout => &LAYOUT,
            Self::Visual => &VISUAL,
            Self::Design => &DESIGN,
        }
    }

    /// Canonical group name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.meta().name
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        self.meta().description
    }

    /// Declared number of tools in the group.
    #[must_use]
    pub const fn tool_count(self) -> usize {
        self.meta().tool_count
    }

    /// Names of the tools in the group.
    #[must_use]
    pub const fn tools(self) -> &'static [&'static str] {
        self.meta().tools
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Group that lists `tool`, if any.
    #[must_use]
    pub fn owning(tool: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.tools().contains(&tool))
    }

    /// Comma-separated list of valid names, for error messages.
    #[must_use]
    pub fn valid_names() -> String {
        Self::ALL.map(Self::name).join(", ")
    }
}

impl FromStr for ToolGroup {
    type Err = SkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SkError::UnknownToolGroup {
            name: s.to_string(),
            valid: Self::valid_names(),
        })
    }
}

impl fmt::Display for ToolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ToolGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
