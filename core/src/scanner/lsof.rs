//! Listener scanner backed by lsof.

use tracing::{debug, warn};

use crate::domain::ListenerEntry;
use crate::error::Result;
use crate::ports::{CommandRunner, ListenerSource};

use super::parser::{parse_lsof_output, parse_ps_commands};

/// Scans sockets by running lsof through a [`CommandRunner`].
pub struct LsofScanner<R> {
    runner: R,
}

impl<R: CommandRunner> LsofScanner<R> {
    /// Create a scanner that runs utilities through `runner`.
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Sockets in listen state, TCP and UDP.
    ///
    /// Executes: `lsof -iTCP -iUDP -sTCP:LISTEN -P -n`
    ///
    /// Flags explained:
    /// - -iTCP -iUDP: Show TCP and UDP sockets
    /// - -sTCP:LISTEN: Only listening TCP sockets (UDP has no state)
    /// - -P: Show port numbers (don't resolve to service names)
    /// - -n: Show IP addresses (don't resolve to hostnames)
    pub async fn list_ports(&self) -> Result<Vec<ListenerEntry>> {
        self.scan(&["-iTCP", "-iUDP", "-sTCP:LISTEN", "-P", "-n"])
            .await
    }

    /// All TCP and UDP sockets, including established connections.
    pub async fn list_all_ports(&self) -> Result<Vec<ListenerEntry>> {
        self.scan(&["-iTCP", "-iUDP", "-P", "-n"]).await
    }

    /// Entries whose local port is exactly `port`, in any state.
    ///
    /// `lsof -i:PORT` also reports connections whose *remote* side uses the
    /// port; those are discarded.
    pub async fn find_by_port(&self, port: u16) -> Result<Vec<ListenerEntry>> {
        let selector = format!("-i:{}", port);
        let mut entries = self.scan(&[&selector, "-P", "-n"]).await?;
        entries.retain(|e| e.port == port);
        Ok(entries)
    }

    /// Listening entries whose process name or command contains `name`,
    /// case-insensitively. Filters [`list_ports`](Self::list_ports).
    pub async fn find_by_process(&self, name: &str) -> Result<Vec<ListenerEntry>> {
        let needle = name.to_lowercase();
        let mut entries = self.list_ports().await?;
        entries.retain(|e| {
            e.process.to_lowercase().contains(&needle)
                || e.command.to_lowercase().contains(&needle)
        });
        Ok(entries)
    }

    async fn scan(&self, args: &[&str]) -> Result<Vec<ListenerEntry>> {
        let output = self.runner.run("lsof", args).await?;
        let stdout = String::from_utf8_lossy(&output);

        let mut entries = parse_lsof_output(&stdout);
        debug!(count = entries.len(), "Parsed lsof output");

        self.enrich_commands(&mut entries).await;
        Ok(entries)
    }

    /// Replace short process names with full command lines from ps.
    ///
    /// Best-effort: a failing ps leaves the entries untouched.
    async fn enrich_commands(&self, entries: &mut [ListenerEntry]) {
        if entries.is_empty() {
            return;
        }

        let output = match self.runner.run("ps", &["-axo", "pid=,command="]).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Could not read full commands, keeping short names");
                return;
            }
        };

        let commands = parse_ps_commands(&String::from_utf8_lossy(&output));
        for entry in entries.iter_mut() {
            if let Some(command) = commands.get(&entry.pid) {
                entry.command = command.clone();
            }
        }
    }
}

impl<R: CommandRunner> ListenerSource for LsofScanner<R> {
    async fn list_ports(&self) -> Result<Vec<ListenerEntry>> {
        LsofScanner::list_ports(self).await
    }

    async fn list_all_ports(&self) -> Result<Vec<ListenerEntry>> {
        LsofScanner::list_all_ports(self).await
    }

    async fn find_by_port(&self, port: u16) -> Result<Vec<ListenerEntry>> {
        LsofScanner::find_by_port(self, port).await
    }

    async fn find_by_process(&self, name: &str) -> Result<Vec<ListenerEntry>> {
        LsofScanner::find_by_process(self, name).await
    }
}
