//! Wiring of the core services against the real system.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use whport_core::adapters::{NixSignals, SystemRunner};
use whport_core::{
    Config, ConfigStore, InfoFetcher, KillService, LsofScanner, ProcessManager, ProtectedPids,
    ScanService,
};

pub type Runner = Arc<SystemRunner>;
pub type Scans = ScanService<LsofScanner<Runner>>;
pub type Kills = KillService<Runner, NixSignals>;
pub type Info = InfoFetcher<Runner>;

/// Everything a command may need, built once per invocation.
pub struct Services {
    pub scans: Scans,
    pub kills: Kills,
    pub info: Info,
}

impl Services {
    pub fn new(config: Config) -> Self {
        let runner: Runner = Arc::new(SystemRunner::new());
        Self {
            scans: ScanService::new(LsofScanner::new(runner.clone()), config),
            kills: KillService::new(ProcessManager::new(
                runner.clone(),
                NixSignals::new(),
                ProtectedPids::default(),
            )),
            info: InfoFetcher::new(runner),
        }
    }

    pub fn config(&self) -> &Config {
        self.scans.config()
    }
}

/// Config store at `path`, or at the default location.
pub fn config_store(path: Option<PathBuf>) -> Result<ConfigStore> {
    match path {
        Some(path) => Ok(ConfigStore::with_path(path)),
        None => ConfigStore::new().context("Failed to locate config directory"),
    }
}

pub async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let store = config_store(path)?;
    store
        .load()
        .await
        .with_context(|| format!("Failed to load config from {}", store.path().display()))
}
