//! Process profile domain model.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Point-in-time details of one process. Fetched on demand, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessProfile {
    pub pid: u32,
    /// Parent PID, zero when unknown.
    pub ppid: u32,
    /// Short binary name (last path segment), empty when unavailable.
    pub name: String,
    pub user: String,
    /// Full command line.
    pub command: String,
    /// Start time, absent when the utility's timestamp could not be parsed.
    pub started_at: Option<DateTime<Local>>,
    pub cpu_percent: f64,
    /// Resident memory in bytes.
    pub rss_bytes: u64,
    /// Direct child PIDs.
    pub children: Vec<u32>,
}

impl ProcessProfile {
    /// Time since the process started, if known.
    pub fn uptime(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.started_at.map(|started| now - started)
    }
}
