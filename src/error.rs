//! Error types for scene preset, cache and tool-group operations.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of every [`SkError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    Unavailable,
    Internal,
    Cancelled,
}

/// Primary error type for scene keeper operations.
#[derive(Error, Debug)]
pub enum SkError {
    // Lookup errors
    #[error("preset '{name}' not found")]
    PresetNotFound { name: String },

    #[error("scene '{scene}' not found")]
    SceneNotFound { scene: String },

    #[error("source '{source_name}' not found in scene '{scene}'")]
    SourceNotFound { scene: String, source_name: String },

    // Conflicts
    #[error("preset '{name}' already exists")]
    PresetExists { name: String },

    // Argument errors
    #[error("unknown tool group '{name}' (valid groups: {valid})")]
    UnknownToolGroup { name: String, valid: String },

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Live system
    #[error("live system is not connected")]
    Unavailable,

    #[error("live system request failed: {0}")]
    LiveRequest(String),

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    // Storage
    #[error("storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SkError {
    /// Maps the error onto the caller-facing taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PresetNotFound { .. }
            | Self::SceneNotFound { .. }
            | Self::SourceNotFound { .. }
            | Self::ConfigNotFound { .. } => ErrorKind::NotFound,
            Self::PresetExists { .. } => ErrorKind::Conflict,
            Self::UnknownToolGroup { .. }
            | Self::MissingField { .. }
            | Self::InvalidArgument(_)
            | Self::ConfigParse(_) => ErrorKind::InvalidArgument,
            Self::Unavailable => ErrorKind::Unavailable,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::LiveRequest(_) | Self::Storage(_) | Self::Io(_) | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::Conflict | ErrorKind::InvalidArgument
        ) || matches!(self, Self::Unavailable)
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::PresetNotFound { .. } => Some("Run: sk presets list"),
            Self::PresetExists { .. } => Some("Choose another name or delete the existing preset"),
            Self::UnknownToolGroup { .. } => Some("Run: sk tools list --all"),
            Self::Unavailable => Some("Ensure the live system is running and connected"),
            Self::ConfigNotFound { .. } => Some("Check --config or SK_CONFIG"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SkError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience type alias for Results using SkError.
pub type Result<T> = std::result::Result<T, SkError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| SkError::Other(format!("{}: {e}", f().into())))
    }
}
