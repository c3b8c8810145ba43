//! List command - show ports in use.

use anyhow::{Context, Result};
use clap::Args;
use whport_core::{ListenerEntry, Protocol, ScanScope};

use super::entries_table;
use crate::services::Services;

/// Scan scope and filters shared by `list` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListFilters {
    /// Include ESTABLISHED connections (not just LISTEN)
    #[arg(long)]
    pub all: bool,

    /// Filter by port number
    #[arg(long)]
    pub port: Option<u16>,

    /// Filter by process name (substring, case-insensitive)
    #[arg(long)]
    pub process: Option<String>,

    /// Filter by protocol (tcp/udp)
    #[arg(long, value_parser = parse_protocol)]
    pub protocol: Option<Protocol>,
}

fn parse_protocol(value: &str) -> std::result::Result<Protocol, String> {
    Protocol::parse(value).ok_or_else(|| format!("unknown protocol {:?} (expected tcp or udp)", value))
}

impl ListFilters {
    pub fn scope(&self) -> ScanScope {
        if self.all {
            ScanScope::All
        } else {
            ScanScope::Listen
        }
    }

    pub fn matches(&self, entry: &ListenerEntry) -> bool {
        if self.port.is_some_and(|p| entry.port != p) {
            return false;
        }
        if let Some(ref name) = self.process {
            if !entry.process.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if self.protocol.is_some_and(|p| entry.protocol != p) {
            return false;
        }
        true
    }

    /// Human description of the active filters, empty when there are none.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(port) = self.port {
            parts.push(format!("port={}", port));
        }
        if let Some(ref process) = self.process {
            parts.push(format!("process={}", process));
        }
        if let Some(protocol) = self.protocol {
            parts.push(format!("protocol={}", protocol));
        }
        parts.join(", ")
    }

    /// Scan, filter and sort by port.
    pub async fn scan(&self, services: &Services) -> Result<Vec<ListenerEntry>> {
        let mut entries = services
            .scans
            .scan(self.scope())
            .await
            .context("Failed to scan ports")?;
        entries.retain(|e| self.matches(e));
        entries.sort_by_key(|e| e.port);
        Ok(entries)
    }
}

pub async fn run(services: &Services, filters: &ListFilters, json: bool) -> Result<()> {
    let entries = filters.scan(services).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    print!("{}", entries_table(&entries, None));
    Ok(())
}
