//! User configuration.
//!
//! Stored as JSON at `~/.config/whport/config.json`. Every field is optional
//! and falls back to its default when absent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ListenerEntry;
use crate::error::Result;
use crate::persist::{app_dir, read_json, write_json_atomic};
use crate::process::KillSignal;

/// Which sockets a default scan covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanScope {
    /// Listening sockets only.
    #[default]
    Listen,
    /// Listening sockets plus established connections.
    All,
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dashboard and watch refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Scan scope used by the dashboard.
    #[serde(default)]
    pub default_view: ScanScope,

    /// Signal used by `kill --signal` when none is given.
    #[serde(default = "default_kill_signal")]
    pub kill_signal: KillSignal,

    /// Process names hidden from listings.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_true")]
    pub color_enabled: bool,
}

fn default_refresh_interval() -> u64 {
    2
}

fn default_kill_signal() -> KillSignal {
    KillSignal::Term
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            default_view: ScanScope::default(),
            kill_signal: default_kill_signal(),
            exclude: Vec::new(),
            color_enabled: true,
        }
    }
}

impl Config {
    /// Refresh interval, never shorter than one second.
    pub fn refresh_every(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    /// Whether `entry`'s short process name is on the exclude list.
    pub fn is_excluded(&self, entry: &ListenerEntry) -> bool {
        self.exclude
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&entry.process))
    }

    /// Drop excluded entries.
    pub fn apply_excludes(&self, entries: &mut Vec<ListenerEntry>) {
        if !self.exclude.is_empty() {
            entries.retain(|e| !self.is_excluded(e));
        }
    }
}

/// Configuration store for reading and writing [`Config`].
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: app_dir()?.join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist. A file that cannot
    /// be parsed, including one naming an unknown signal, is an error.
    pub async fn load(&self) -> Result<Config> {
        Ok(read_json(&self.config_path).await?.unwrap_or_default())
    }

    /// Save configuration to disk atomically, creating the directory.
    pub async fn save(&self, config: &Config) -> Result<()> {
        write_json_atomic(&self.config_path, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Protocol, STATE_LISTEN};
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let config = store.load().await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.refresh_interval, 2);
        assert_eq!(config.default_view, ScanScope::Listen);
        assert_eq!(config.kill_signal, KillSignal::Term);
        assert!(config.color_enabled);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), r#"{"default_view": "all", "exclude": ["Dropbox"]}"#).unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.default_view, ScanScope::All);
        assert_eq!(config.exclude, vec!["Dropbox"]);
        assert_eq!(config.refresh_interval, 2);
        assert!(config.color_enabled);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store();

        let config = Config {
            refresh_interval: 5,
            default_view: ScanScope::All,
            kill_signal: KillSignal::Int,
            exclude: vec!["rapportd".to_string()],
            color_enabled: false,
        };
        store.save(&config).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"SIGINT\""));

        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_invalid_files() {
        let (store, _dir) = test_store();

        std::fs::write(store.path(), "{").unwrap();
        assert_eq!(store.load().await.unwrap_err().kind(), ErrorKind::Persistence);

        std::fs::write(store.path(), r#"{"kill_signal": "SIGSTOP"}"#).unwrap();
        assert_eq!(store.load().await.unwrap_err().kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_excludes() {
        let config = Config {
            exclude: vec!["ControlCenter".to_string()],
            ..Config::default()
        };
        let mut entries = vec![
            ListenerEntry::new(5000, Protocol::Tcp, 10, "controlcenter", "dev", STATE_LISTEN, "9u"),
            ListenerEntry::new(5001, Protocol::Tcp, 11, "controlcenterd", "dev", STATE_LISTEN, "9u"),
        ];

        config.apply_excludes(&mut entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pid, 11);
    }

    #[test]
    fn test_refresh_every_is_at_least_one_second() {
        let config = Config {
            refresh_interval: 0,
            ..Config::default()
        };
        assert_eq!(config.refresh_every(), Duration::from_secs(1));
    }
}
