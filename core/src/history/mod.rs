//! Listener history: snapshots, open/close events and their persistence.

mod diff;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ListenerEntry, ListenerKey, Protocol};

pub use diff::{diff, new_listeners, snapshot_from_entries};
pub use store::HistoryStore;

/// Reduced projection of a [`ListenerEntry`] kept for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub port: u16,
    pub protocol: Protocol,
    pub pid: u32,
    pub process: String,
    pub user: String,
}

impl SnapshotEntry {
    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(self.port, self.protocol)
    }
}

impl From<&ListenerEntry> for SnapshotEntry {
    fn from(entry: &ListenerEntry) -> Self {
        Self {
            port: entry.port,
            protocol: entry.protocol,
            pid: entry.pid,
            process: entry.process.clone(),
            user: entry.user.clone(),
        }
    }
}

/// Listener set observed at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
}

/// Whether a listener appeared or disappeared.
///
/// Ordered so that opens sort before closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Open,
    Close,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Open => f.write_str("open"),
            EventKind::Close => f.write_str("close"),
        }
    }
}

/// One listener change. Append-only once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub port: u16,
    pub protocol: Protocol,
    pub pid: u32,
    pub process: String,
    pub user: String,
}

impl Event {
    fn new(kind: EventKind, entry: &SnapshotEntry, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind,
            port: entry.port,
            protocol: entry.protocol,
            pid: entry.pid,
            process: entry.process.clone(),
            user: entry.user.clone(),
        }
    }

    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(self.port, self.protocol)
    }
}

/// Everything the history file holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<Snapshot>,
    #[serde(default)]
    pub events: Vec<Event>,
}
