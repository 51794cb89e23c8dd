//! Live system abstraction.
//!
//! The running production tool is reached only through [`LiveStateClient`].
//! Its control protocol lives outside this crate; implementations wrap
//! whatever transport the host application uses. [`mock::MockLiveClient`]
//! stands in for it in tests, and [`Disconnected`] is used where no live
//! system is configured at all.

mod info;
pub mod mock;

pub use info::{SceneList, SourceState, ThumbnailFormat, ThumbnailOptions, sniff_mime_type};

use std::sync::Arc;

use crate::error::{Result, SkError};

/// Operations the core needs from the live system.
///
/// Every method is a blocking round trip. Implementations report a missing
/// scene as `SceneNotFound` and a missing source as `SourceNotFound`.
pub trait LiveStateClient: Send + Sync {
    /// Whether the live system is currently reachable.
    fn is_connected(&self) -> bool;

    /// All scene names and the scene currently on program.
    fn list_scenes(&self) -> Result<SceneList>;

    /// Every source in `scene` with its current visibility.
    fn get_scene_sources(&self, scene: &str) -> Result<Vec<SourceState>>;

    /// Shows or hides `source` inside `scene`.
    fn set_source_visible(&self, scene: &str, source: &str, visible: bool) -> Result<()>;

    /// Renders a preview of `scene` and returns the encoded image.
    fn render_thumbnail(&self, scene: &str, opts: &ThumbnailOptions) -> Result<Vec<u8>>;
}

/// Shared handle to a live client.
pub type SharedClient = Arc<dyn LiveStateClient>;

/// Client used when no live system is configured.
///
/// Reports itself as disconnected; every round trip is `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl LiveStateClient for Disconnected {
    fn is_connected(&self) -> bool {
        false
    }

    fn list_scenes(&self) -> Result<SceneList> {
        Err(SkError::Unavailable)
    }

    fn get_scene_sources(&self, _scene: &str) -> Result<Vec<SourceState>> {
        Err(SkError::Unavailable)
    }

    fn set_source_visible(&self, _scene: &str, _source: &str, _visible: bool) -> Result<()> {
        Err(SkError::Unavailable)
    }

    fn render_thumbnail(&self, _scene: &str, _opts: &ThumbnailOptions) -> Result<Vec<u8>> {
        Err(SkError::Unavailable)
    }
}
