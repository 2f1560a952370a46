use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};

use crate::ports::store::{StorageError, Store};

/// Milestone keys already shown on this device, persisted across restarts.
/// Append-only for a given countdown target; wiping the file is the
/// deliberate reset path.
#[derive(Debug)]
pub struct NotifiedSet {
    path: PathBuf,
    keys: BTreeSet<String>,
}

impl NotifiedSet {
    /// A missing file is an empty set; a corrupt file is an error rather
    /// than a silent reset, since resetting re-fires every milestone.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let keys = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(err) => return Err(err),
        };
        Ok(Self {
            path: path.to_path_buf(),
            keys,
        })
    }

    pub fn should_notify(&self, milestone_key: &str) -> bool {
        !self.keys.contains(milestone_key)
    }

    pub fn mark_notified(&mut self, milestone_key: &str) -> std::io::Result<()> {
        if !self.keys.insert(milestone_key.to_string()) {
            return Ok(());
        }
        let raw = serde_json::to_string(&self.keys)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(&self.path, raw)
    }
}

/// Server broadcast gate: permitted iff the milestone has never been
/// broadcast, or its last broadcast is strictly older than the suppression
/// window. The caller must record the broadcast before fanning out.
pub fn should_broadcast<D: Store>(
    store: &D,
    milestone_key: &str,
    now: OffsetDateTime,
    suppress_window: Duration,
) -> Result<bool, StorageError> {
    Ok(match store.last_broadcast(milestone_key)? {
        Some(last_sent) => now - last_sent > suppress_window,
        None => true,
    })
}
