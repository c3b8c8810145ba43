//! Persistent history log.
//!
//! The whole file is read, modified and rewritten on each record. Concurrent
//! writers from separate processes are not serialized and can lose events.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ListenerEntry;
use crate::error::Result;
use crate::persist::{app_dir, read_json, write_json_atomic};

use super::{diff, snapshot_from_entries, Event, HistoryData};

/// History file at `~/.config/whport/history.json`.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store at the default location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: app_dir()?.join("history.json"),
        })
    }

    /// Store at a custom path (for testing).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted data; empty when the file does not exist yet.
    pub async fn load(&self) -> Result<HistoryData> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    pub async fn save(&self, data: &HistoryData) -> Result<()> {
        write_json_atomic(&self.path, data).await
    }

    /// Diff `entries` against the stored snapshot, append the resulting
    /// events, store `entries` as the new snapshot, and return the events.
    ///
    /// A corrupt file fails the call and is left untouched.
    pub async fn record(
        &self,
        entries: &[ListenerEntry],
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut data = self.load().await?;

        let events = diff(data.last_snapshot.as_ref(), entries, timestamp);
        data.events.extend(events.iter().cloned());
        data.last_snapshot = Some(snapshot_from_entries(entries, timestamp));

        self.save(&data).await?;
        debug!(new_events = events.len(), total = data.events.len(), "Recorded history");
        Ok(events)
    }

    /// Forget all events and the snapshot.
    pub async fn clear(&self) -> Result<()> {
        self.save(&HistoryData::default()).await
    }
}
