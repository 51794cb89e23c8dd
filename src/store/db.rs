//! SQLite implementation of [`Store`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::{debug, info, instrument, trace};

use super::Store;
use super::schema::{PresetSummary, ScenePreset};
use crate::error::{Result, SkError};
use crate::live::SourceState;
use crate::tool_groups::ToolGroupFlags;

/// SQLite schema for preset and flag storage.
const SCHEMA_SQL: &str = r#"
-- Preset metadata
CREATE TABLE IF NOT EXISTS presets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    scene_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Per-source visibility within a preset
CREATE TABLE IF NOT EXISTS preset_sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    preset_id INTEGER NOT NULL REFERENCES presets(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    source_name TEXT NOT NULL,
    visible INTEGER NOT NULL,
    UNIQUE(preset_id, position)
);

-- Tool group flag matrix
CREATE TABLE IF NOT EXISTS tool_groups (
    name TEXT PRIMARY KEY,
    enabled INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_presets_scene ON presets(scene_name);
CREATE INDEX IF NOT EXISTS idx_preset_sources_preset ON preset_sources(preset_id);
"#;

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SkError::Storage(format!("Invalid timestamp '{raw}': {e}")))
}

/// Database wrapper for preset storage.
///
/// The connection sits behind a mutex so one store can be shared across
/// threads; each call holds it for a single statement or transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a database at the standard location.
    #[instrument]
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(&path)
    }

    /// Opens or creates a database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SkError::Storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!(path = %path.display(), "Opening preset database");
        let conn = Connection::open(path)
            .map_err(|e| SkError::Storage(format!("Failed to open database: {e}")))?;

        let store = Self::from_connection(conn)?;
        info!(path = %path.display(), "Preset database ready");
        Ok(store)
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SkError::Storage(format!("Failed to create in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| SkError::Storage(format!("Failed to enable foreign keys: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| SkError::Storage(format!("Failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks if a preset exists by name.
    #[instrument(skip(self))]
    pub fn preset_exists(&self, name: &str) -> Result<bool> {
        let exists = self
            .conn()
            .query_row(
                "SELECT 1 FROM presets WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }
}

impl Store for SqliteStore {
    #[instrument(skip(self, preset), fields(name = %preset.name, scene = %preset.scene_name))]
    fn create_preset(&self, preset: &ScenePreset) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| SkError::Storage(format!("Failed to start transaction: {e}")))?;

        let created_at = preset.created_at.to_rfc3339();
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO presets (name, scene_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![preset.name, preset.scene_name, created_at, now],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                SkError::PresetExists {
                    name: preset.name.clone(),
                }
            } else {
                SkError::Storage(format!("Failed to insert preset: {e}"))
            }
        })?;
        let preset_id = tx.last_insert_rowid();

        for (position, source) in preset.sources.iter().enumerate() {
            trace!(
                position,
                source = %source.name,
                visible = source.visible,
                "Inserting preset source"
            );
            tx.execute(
                "INSERT INTO preset_sources (preset_id, position, source_name, visible)
                 VALUES (?1, ?2, ?3, ?4)",
                params![preset_id, position, source.name, source.visible],
            )
            .map_err(|e| SkError::Storage(format!("Failed to insert preset source: {e}")))?;
        }

        tx.commit()
            .map_err(|e| SkError::Storage(format!("Failed to commit transaction: {e}")))?;

        info!(name = %preset.name, id = preset_id, sources = preset.sources.len(), "Preset saved");
        Ok(preset_id)
    }

    #[instrument(skip(self))]
    fn get_preset(&self, name: &str) -> Result<Option<ScenePreset>> {
        let conn = self.conn();
        let row: Option<(i64, String, String, String)> = conn
            .query_row(
                "SELECT id, name, scene_name, created_at FROM presets WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((id, name, scene_name, created_at)) = row else {
            debug!(name, "Preset not found");
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT source_name, visible FROM preset_sources
             WHERE preset_id = ?1 ORDER BY position",
        )?;
        let sources = stmt
            .query_map(params![id], |row| {
                Ok(SourceState {
                    name: row.get(0)?,
                    visible: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(name = %name, sources = sources.len(), "Preset loaded");
        Ok(Some(ScenePreset {
            id: Some(id),
            name,
            scene_name,
            sources,
            created_at: parse_timestamp(&created_at)?,
        }))
    }

    #[instrument(skip(self))]
    fn list_presets(&self, scene_filter: Option<&str>) -> Result<Vec<PresetSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, scene_name, created_at FROM presets
             WHERE ?1 IS NULL OR scene_name = ?1
             ORDER BY name",
        )?;

        let rows = stmt
            .query_map(params![scene_filter], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let summaries = rows
            .into_iter()
            .map(|(id, name, scene_name, created_at)| {
                Ok(PresetSummary {
                    id,
                    name,
                    scene_name,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = summaries.len(), "Listed presets");
        Ok(summaries)
    }

    #[instrument(skip(self))]
    fn rename_preset(&self, old_name: &str, new_name: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .conn()
            .execute(
                "UPDATE presets SET name = ?1, updated_at = ?2 WHERE name = ?3",
                params![new_name, now, old_name],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SkError::PresetExists {
                        name: new_name.to_string(),
                    }
                } else {
                    SkError::Storage(format!("Failed to rename preset: {e}"))
                }
            })?;

        if updated > 0 {
            info!(old_name, new_name, "Preset renamed");
        }
        Ok(updated > 0)
    }

    #[instrument(skip(self))]
    fn delete_preset(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM presets WHERE name = ?1", params![name])
            .map_err(|e| SkError::Storage(format!("Failed to delete preset: {e}")))?;

        if deleted > 0 {
            info!(name, "Preset deleted");
        } else {
            debug!(name, "Preset not found for deletion");
        }
        Ok(deleted > 0)
    }

    #[instrument(skip_all)]
    fn save_tool_group_config(&self, flags: &ToolGroupFlags) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| SkError::Storage(format!("Failed to start transaction: {e}")))?;
        let now = Utc::now().to_rfc3339();

        for (group, enabled) in flags.iter() {
            tx.execute(
                "INSERT INTO tool_groups (name, enabled, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE
                 SET enabled = excluded.enabled, updated_at = excluded.updated_at",
                params![group.name(), enabled, now],
            )
            .map_err(|e| SkError::Storage(format!("Failed to save tool group '{group}': {e}")))?;
        }

        tx.commit()
            .map_err(|e| SkError::Storage(format!("Failed to commit transaction: {e}")))?;
        debug!("Tool group flags persisted");
        Ok(())
    }

    #[instrument(skip_all)]
    fn load_tool_group_config(&self) -> Result<Option<ToolGroupFlags>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name, enabled FROM tool_groups")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(ToolGroupFlags::from_rows(rows)))
    }
}

/// Returns the default database path.
///
/// Location: `~/.local/share/sk/sk.db`
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        SkError::Other("Could not determine local data directory".to_string())
    })?;
    Ok(data_dir.join("sk").join("sk.db"))
}
