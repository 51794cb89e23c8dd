//! Runtime settings.
//!
//! Settings come from a TOML file. Every field has a default, so a missing
//! default file simply yields [`Settings::default`].
//!
//! ```toml
//! [cache]
//! name_ttl_secs = 5
//! thumbnail_ttl_secs = 10
//! thumbnail_max_entries = 32
//! thumbnail_max_bytes = 16777216
//!
//! [thumbnail]
//! width = 320
//! height = 180
//! format = "png"
//!
//! [storage]
//! db_path = "~/.local/share/sk/sk.db"
//!
//! [tool_groups]
//! disabled = ["Design"]
//! ```

mod path;
mod settings;

pub use path::{default_config_path, home_dir, resolve_path};
pub use settings::{CacheSettings, Settings, StorageSettings, ToolGroupSettings};
