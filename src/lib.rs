//! Scene keeper library - caching and consistency core for a live-production
//! control surface.
//!
//! The core sits between request handlers and a remote live-production system.
//! It keeps short-lived name and thumbnail caches, persists scene presets and
//! replays them, and holds the matrix of enabled tool groups.
//!
//! # Modules
//!
//! - `cache`: TTL name cache and bounded thumbnail cache
//! - `live`: Live-system client seam and a scriptable mock
//! - `store`: SQLite persistence for presets and tool-group flags
//! - `preset`: Capture, save and apply of scene presets
//! - `tool_groups`: Capability groups and their enablement
//! - `service`: Composition root wiring the above together
//! - `config`: Settings file handling
#![forbid(unsafe_code)]

pub mod cache;
pub mod cancel;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
pub mod preset;
pub mod service;
pub mod store;
pub mod tool_groups;

pub use error::{Result, SkError};
pub use service::{Service, Thumbnail};
