//! Listener scanning use case.

use crate::config::{Config, ScanScope};
use crate::domain::ListenerEntry;
use crate::error::Result;
use crate::ports::ListenerSource;

/// Runs scans through a [`ListenerSource`] and hides excluded processes.
///
/// Lookups by port bypass the exclude list: asking for a port by number is
/// explicit.
pub struct ScanService<L> {
    source: L,
    config: Config,
}

impl<L: ListenerSource> ScanService<L> {
    pub fn new(source: L, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan the sockets `scope` covers.
    pub async fn scan(&self, scope: ScanScope) -> Result<Vec<ListenerEntry>> {
        let mut entries = match scope {
            ScanScope::Listen => self.source.list_ports().await?,
            ScanScope::All => self.source.list_all_ports().await?,
        };
        self.config.apply_excludes(&mut entries);
        Ok(entries)
    }

    /// Scan with the configured default scope.
    pub async fn scan_default(&self) -> Result<Vec<ListenerEntry>> {
        self.scan(self.config.default_view).await
    }

    pub async fn find_by_port(&self, port: u16) -> Result<Vec<ListenerEntry>> {
        self.source.find_by_port(port).await
    }

    pub async fn find_by_process(&self, name: &str) -> Result<Vec<ListenerEntry>> {
        let mut entries = self.source.find_by_process(name).await?;
        self.config.apply_excludes(&mut entries);
        Ok(entries)
    }
}
