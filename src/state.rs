//! On-disk persistence of the blacklist and activity log.
//!
//! The engine itself is purely in-memory; persistence is host-level
//! convenience so rules and history survive restarts. A missing or corrupt
//! state file degrades to an empty state rather than failing startup.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{activity_log::ActivityLogEntry, rules::BlacklistEntry};

/// What gets written to disk. Matches the shape the app has always
/// persisted, so old state files keep loading.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
    #[serde(default)]
    pub activity_logs: Vec<ActivityLogEntry>,
}

/// The default state file location, under the platform's local data dir.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|mut path| {
        path.push("warden");
        path.push("state.json");
        path
    })
}

/// Loads persisted state, falling back to an empty state when the file is
/// absent or unreadable.
pub fn load(path: &Path) -> PersistedState {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "state file {} is corrupt ({err}); starting with an empty state",
                    path.display()
                );
                PersistedState::default()
            }
        },
        Err(_) => PersistedState::default(),
    }
}

/// Writes state as pretty-printed JSON, creating parent directories as
/// needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create state directory {}", parent.display()))?;
    }

    let data = serde_json::to_string_pretty(state).context("unable to serialize state")?;
    fs::write(path, data)
        .with_context(|| format!("unable to write state file {}", path.display()))?;

    Ok(())
}
