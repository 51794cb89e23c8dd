//! Value types exchanged with the live system.

use serde::{Deserialize, Serialize};

/// Visibility of one source inside a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    /// Source name as reported by the live system.
    pub name: String,
    /// Whether the source is shown.
    pub visible: bool,
}

impl SourceState {
    #[must_use]
    pub fn new(name: impl Into<String>, visible: bool) -> Self {
        Self {
            name: name.into(),
            visible,
        }
    }
}

/// Scene names plus the scene currently on program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneList {
    pub names: Vec<String>,
    pub current: Option<String>,
}

/// Encoding requested for a rendered thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ThumbnailFormat {
    /// Image crate format for this encoding.
    #[must_use]
    pub const fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        self.image_format().to_mime_type()
    }
}

/// Parameters for a thumbnail render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailOptions {
    pub width: u32,
    pub height: u32,
    pub format: ThumbnailFormat,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            format: ThumbnailFormat::Png,
        }
    }
}

/// Works out the MIME type of an encoded image.
///
/// Falls back to the MIME type of the requested format when the bytes are
/// not recognisable.
#[must_use]
pub fn sniff_mime_type(bytes: &[u8], requested: ThumbnailFormat) -> &'static str {
    image::guess_format(bytes).map_or_else(|_| requested.mime_type(), |f| f.to_mime_type())
}
