//! Config command - show or initialize the configuration file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use whport_core::Config;

use crate::services::config_store;

pub async fn show(path: Option<PathBuf>, json: bool) -> Result<()> {
    let store = config_store(path)?;
    let config = store
        .load()
        .await
        .with_context(|| format!("Failed to load config from {}", store.path().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file: {}", store.path().display());
    if !store.path().exists() {
        println!("(not present, showing defaults)");
    }
    println!();
    println!("refresh_interval: {}s", config.refresh_interval);
    println!("default_view:     {:?}", config.default_view);
    println!("kill_signal:      {}", config.kill_signal);
    println!(
        "exclude:          {}",
        if config.exclude.is_empty() {
            "(none)".to_string()
        } else {
            config.exclude.join(", ")
        }
    );
    println!("color_enabled:    {}", config.color_enabled);
    Ok(())
}

pub async fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let store = config_store(path)?;
    if store.path().exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            store.path().display()
        );
    }

    store
        .save(&Config::default())
        .await
        .with_context(|| format!("Failed to write {}", store.path().display()))?;
    println!("Wrote default config to {}", store.path().display());
    Ok(())
}
