//! Mock live client for unit and integration testing.
//!
//! Holds scripted scenes in memory, records every round trip, and supports
//! error injection so partial-failure paths can be exercised.
//!
//! # Example
//!
//! ```rust,ignore
//! use sk::live::mock::{MockLiveClient, Operation};
//! use sk::live::{LiveStateClient, SourceState};
//!
//! let mock = MockLiveClient::new()
//!     .with_scene("Main", vec![SourceState::new("Cam", false)]);
//!
//! mock.set_source_visible("Main", "Cam", true).unwrap();
//! mock.assert_contains(&Operation::SetSourceVisible {
//!     scene: "Main".into(),
//!     source: "Cam".into(),
//!     visible: true,
//! });
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::{LiveStateClient, SceneList, SourceState, ThumbnailFormat, ThumbnailOptions};
use crate::error::{Result, SkError};

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
const WEBP_SIGNATURE: &[u8] = b"RIFF\0\0\0\0WEBP";

/// Recorded round trip for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListScenes,
    GetSceneSources {
        scene: String,
    },
    SetSourceVisible {
        scene: String,
        source: String,
        visible: bool,
    },
    RenderThumbnail {
        scene: String,
    },
}

#[derive(Debug, Clone)]
struct MockScene {
    name: String,
    sources: Vec<SourceState>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory stand-in for the live system.
pub struct MockLiveClient {
    scenes: Mutex<Vec<MockScene>>,
    current: Mutex<Option<String>>,
    operation_log: Mutex<Vec<Operation>>,
    error_injection: Mutex<Option<SkError>>,
    failing_renders: AtomicUsize,
    render_count: AtomicUsize,
    connected: AtomicBool,
}

impl MockLiveClient {
    /// Create a connected mock with no scenes.
    #[must_use]
    pub fn new() -> Self {
        debug!("Creating mock live client");
        Self {
            scenes: Mutex::new(Vec::new()),
            current: Mutex::new(None),
            operation_log: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
            failing_renders: AtomicUsize::new(0),
            render_count: AtomicUsize::new(0),
            connected: AtomicBool::new(true),
        }
    }

    /// Add a scene with the given sources. The first scene added becomes current.
    #[must_use]
    pub fn with_scene(self, name: &str, sources: Vec<SourceState>) -> Self {
        self.add_scene(name, sources);
        self
    }

    // === Scripting ===

    /// Add or replace a scene.
    pub fn add_scene(&self, name: &str, sources: Vec<SourceState>) {
        let mut scenes = lock(&self.scenes);
        scenes.retain(|s| s.name != name);
        scenes.push(MockScene {
            name: name.to_string(),
            sources,
        });
        let mut current = lock(&self.current);
        if current.is_none() {
            *current = Some(name.to_string());
        }
    }

    /// Remove a scene entirely.
    pub fn remove_scene(&self, name: &str) {
        lock(&self.scenes).retain(|s| s.name != name);
        let mut current = lock(&self.current);
        if current.as_deref() == Some(name) {
            *current = None;
        }
    }

    /// Remove one source from a scene.
    pub fn remove_source(&self, scene: &str, source: &str) {
        if let Some(s) = lock(&self.scenes).iter_mut().find(|s| s.name == scene) {
            s.sources.retain(|src| src.name != source);
        }
    }

    /// Rename one source inside a scene.
    pub fn rename_source(&self, scene: &str, from: &str, to: &str) {
        if let Some(s) = lock(&self.scenes).iter_mut().find(|s| s.name == scene) {
            for src in s.sources.iter_mut().filter(|src| src.name == from) {
                src.name = to.to_string();
            }
        }
    }

    /// Set the scene reported as current.
    pub fn set_current(&self, scene: &str) {
        *lock(&self.current) = Some(scene.to_string());
    }

    /// Inject an error for the next round trip.
    pub fn inject_error(&self, error: SkError) {
        *lock(&self.error_injection) = Some(error);
    }

    /// Make the next `count` renders fail.
    pub fn fail_next_renders(&self, count: usize) {
        self.failing_renders.store(count, Ordering::SeqCst);
    }

    /// Set the live system as disconnected.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Set the live system as connected.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    // === Assertions ===

    /// Current visibility of a source, if both scene and source exist.
    #[must_use]
    pub fn source_visible(&self, scene: &str, source: &str) -> Option<bool> {
        lock(&self.scenes)
            .iter()
            .find(|s| s.name == scene)?
            .sources
            .iter()
            .find(|src| src.name == source)
            .map(|src| src.visible)
    }

    /// Number of renders attempted, failed ones included.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.render_count.load(Ordering::SeqCst)
    }

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        lock(&self.operation_log).clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        lock(&self.operation_log).len()
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert no operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if any operations were recorded.
    pub fn assert_no_operations(&self) {
        let ops = self.operations();
        assert!(ops.is_empty(), "Expected no operations, but found: {ops:#?}");
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        lock(&self.operation_log).clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        lock(&self.operation_log).push(op);
    }

    fn check_error(&self) -> Result<()> {
        if let Some(error) = lock(&self.error_injection).take() {
            return Err(error);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SkError::Unavailable);
        }
        Ok(())
    }
}

impl Default for MockLiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveStateClient for MockLiveClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn list_scenes(&self) -> Result<SceneList> {
        self.check_error()?;
        self.record_op(Operation::ListScenes);
        Ok(SceneList {
            names: lock(&self.scenes).iter().map(|s| s.name.clone()).collect(),
            current: lock(&self.current).clone(),
        })
    }

    fn get_scene_sources(&self, scene: &str) -> Result<Vec<SourceState>> {
        self.check_error()?;
        self.record_op(Operation::GetSceneSources {
            scene: scene.to_string(),
        });
        lock(&self.scenes)
            .iter()
            .find(|s| s.name == scene)
            .map(|s| s.sources.clone())
            .ok_or_else(|| SkError::SceneNotFound {
                scene: scene.to_string(),
            })
    }

    fn set_source_visible(&self, scene: &str, source: &str, visible: bool) -> Result<()> {
        self.check_error()?;
        self.record_op(Operation::SetSourceVisible {
            scene: scene.to_string(),
            source: source.to_string(),
            visible,
        });
        let mut scenes = lock(&self.scenes);
        let s = scenes
            .iter_mut()
            .find(|s| s.name == scene)
            .ok_or_else(|| SkError::SceneNotFound {
                scene: scene.to_string(),
            })?;
        let src = s
            .sources
            .iter_mut()
            .find(|src| src.name == source)
            .ok_or_else(|| SkError::SourceNotFound {
                scene: scene.to_string(),
                source_name: source.to_string(),
            })?;
        src.visible = visible;
        Ok(())
    }

    fn render_thumbnail(&self, scene: &str, opts: &ThumbnailOptions) -> Result<Vec<u8>> {
        self.check_error()?;
        self.record_op(Operation::RenderThumbnail {
            scene: scene.to_string(),
        });
        self.render_count.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_renders.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_renders.store(failing - 1, Ordering::SeqCst);
            return Err(SkError::LiveRequest(format!(
                "render of scene '{scene}' failed"
            )));
        }

        if !lock(&self.scenes).iter().any(|s| s.name == scene) {
            return Err(SkError::SceneNotFound {
                scene: scene.to_string(),
            });
        }

        let signature = match opts.format {
            ThumbnailFormat::Png => PNG_SIGNATURE,
            ThumbnailFormat::Jpeg => JPEG_SIGNATURE,
            ThumbnailFormat::Webp => WEBP_SIGNATURE,
        };
        let mut bytes = signature.to_vec();
        bytes.extend_from_slice(scene.as_bytes());
        Ok(bytes)
    }
}
