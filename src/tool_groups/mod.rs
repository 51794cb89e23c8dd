//! Runtime enable/disable matrix for capability groups.
//!
//! A single reader-writer lock guards the flag matrix. Writers hold it only
//! long enough to flip one flag; persistence runs after the lock is released,
//! so readers see a toggle before its I/O starts. A failed persist does not
//! undo the toggle.
//!
//! Each toggle bumps a version. Writes to the store are serialized and a
//! snapshot older than the last one stored is skipped, so the store never
//! ends up behind the newest persisted toggle.

mod catalog;

pub use catalog::ToolGroup;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cancel::{CancellationToken, ensure_active};
use crate::error::Result;
use crate::store::SharedStore;

/// Enabled state of every group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolGroupFlags {
    enabled: [bool; ToolGroup::ALL.len()],
}

impl ToolGroupFlags {
    /// Every group enabled.
    #[must_use]
    pub const fn all_enabled() -> Self {
        Self {
            enabled: [true; ToolGroup::ALL.len()],
        }
    }

    /// Every group enabled except the ones listed.
    #[must_use]
    pub fn with_disabled(disabled: &[ToolGroup]) -> Self {
        let mut flags = Self::all_enabled();
        for group in disabled {
            flags.set(*group, false);
        }
        flags
    }

    #[must_use]
    pub const fn get(&self, group: ToolGroup) -> bool {
        self.enabled[group.index()]
    }

    /// Sets a flag and returns its previous value.
    pub fn set(&mut self, group: ToolGroup, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled[group.index()], enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolGroup, bool)> + '_ {
        ToolGroup::ALL.into_iter().map(|g| (g, self.get(g)))
    }

    /// Builds flags from stored `(name, enabled)` rows.
    ///
    /// Groups missing from the rows keep their default (enabled); rows naming
    /// groups that no longer exist are ignored.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut flags = Self::all_enabled();
        for (name, enabled) in rows {
            match ToolGroup::parse(name.as_ref()) {
                Some(group) => {
                    flags.set(group, enabled);
                }
                None => warn!(group = name.as_ref(), "Ignoring stored flag for unknown tool group"),
            }
        }
        flags
    }

    /// Name to enabled map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        self.iter().map(|(g, e)| (g.name(), e)).collect()
    }
}

impl Default for ToolGroupFlags {
    fn default() -> Self {
        Self::all_enabled()
    }
}

/// One row of `GetConfig` / `ListGroups` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolGroupInfo {
    pub name: ToolGroup,
    pub description: &'static str,
    pub enabled: bool,
    pub tool_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<&'static str>>,
}

impl ToolGroupInfo {
    fn new(group: ToolGroup, enabled: bool, verbose: bool) -> Self {
        Self {
            name: group,
            description: group.description(),
            enabled,
            tool_count: group.tool_count(),
            tools: verbose.then(|| group.tools().to_vec()),
        }
    }
}

/// Result of a `SetConfig` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetConfigOutcome {
    pub group: ToolGroup,
    pub previous_state: bool,
    pub new_state: bool,
    pub tools_affected: Vec<&'static str>,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct VersionedFlags {
    flags: ToolGroupFlags,
    version: u64,
}

/// In-memory flag matrix with optional durable snapshots.
pub struct ToolGroupConfig {
    flags: RwLock<VersionedFlags>,
    /// Version of the last snapshot written to the store.
    persisted_version: Mutex<u64>,
    store: SharedStore,
}

impl ToolGroupConfig {
    /// Creates a config with the given starting flags.
    #[must_use]
    pub fn new(store: SharedStore, flags: ToolGroupFlags) -> Self {
        Self {
            flags: RwLock::new(VersionedFlags { flags, version: 0 }),
            persisted_version: Mutex::new(0),
            store,
        }
    }

    /// Restores persisted flags, falling back to `defaults` when nothing was saved.
    #[instrument(skip_all)]
    pub fn load(
        store: SharedStore,
        defaults: ToolGroupFlags,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        ensure_active(cancel, "load tool group config")?;
        let flags = match store.load_tool_group_config()? {
            Some(saved) => {
                info!(flags = ?saved.to_map(), "Restored persisted tool group flags");
                saved
            }
            None => {
                debug!("No persisted tool group flags, using defaults");
                defaults
            }
        };
        Ok(Self::new(store, flags))
    }

    /// Copy of the current matrix.
    #[must_use]
    pub fn snapshot(&self) -> ToolGroupFlags {
        self.flags.read().unwrap_or_else(PoisonError::into_inner).flags
    }

    #[must_use]
    pub fn is_enabled(&self, group: ToolGroup) -> bool {
        self.snapshot().get(group)
    }

    /// Describes one group (when `group_filter` is set) or all of them.
    ///
    /// Tool name lists are included only when `verbose` is set.
    pub fn get_config(
        &self,
        group_filter: Option<&str>,
        verbose: bool,
    ) -> Result<Vec<ToolGroupInfo>> {
        let filter = group_filter.map(str::parse::<ToolGroup>).transpose()?;
        let flags = self.snapshot();
        Ok(flags
            .iter()
            .filter(|(g, _)| filter.is_none_or(|f| f == *g))
            .map(|(g, enabled)| ToolGroupInfo::new(g, enabled, verbose))
            .collect())
    }

    /// Toggles one group and optionally persists the whole matrix.
    #[instrument(skip(self, cancel))]
    pub fn set_config(
        &self,
        group: &str,
        enabled: bool,
        persist: bool,
        cancel: &CancellationToken,
    ) -> Result<SetConfigOutcome> {
        let group: ToolGroup = group.parse()?;
        ensure_active(cancel, "set tool group config")?;

        let (previous_state, snapshot) = {
            let mut state = self.flags.write().unwrap_or_else(PoisonError::into_inner);
            let previous = state.flags.set(group, enabled);
            state.version += 1;
            (previous, *state)
        };
        info!(%group, previous_state, new_state = enabled, "Tool group toggled");

        let mut outcome = SetConfigOutcome {
            group,
            previous_state,
            new_state: enabled,
            tools_affected: group.tools().to_vec(),
            persisted: false,
            persist_error: None,
        };

        if persist {
            match self.persist(snapshot) {
                Ok(()) => outcome.persisted = true,
                Err(e) => {
                    warn!(%group, error = %e, "Persisting tool group flags failed; toggle kept");
                    outcome.persist_error = Some(e.to_string());
                }
            }
        }

        Ok(outcome)
    }

    /// Writes `snapshot` unless a newer one already reached the store.
    ///
    /// A newer snapshot was taken after this one under the same lock, so it
    /// already carries this toggle or a later value for the same group.
    fn persist(&self, snapshot: VersionedFlags) -> Result<()> {
        let mut persisted = self
            .persisted_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshot.version <= *persisted {
            debug!(
                version = snapshot.version,
                persisted = *persisted,
                "Newer tool group flags already stored"
            );
            return Ok(());
        }
        self.store.save_tool_group_config(&snapshot.flags)?;
        *persisted = snapshot.version;
        Ok(())
    }

    /// Lists groups; disabled ones are left out unless `include_disabled`.
    #[must_use]
    pub fn list_groups(&self, include_disabled: bool) -> Vec<ToolGroupInfo> {
        self.snapshot()
            .iter()
            .filter(|(_, enabled)| include_disabled || *enabled)
            .map(|(g, enabled)| ToolGroupInfo::new(g, enabled, false))
            .collect()
    }
}
