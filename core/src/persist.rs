//! JSON file helpers shared by the config and history stores.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Directory holding config, history and logs: `~/.config/whport`.
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Persistence("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join("whport"))
}

/// Read and parse `path`. An absent file is `Ok(None)`; an unreadable or
/// unparseable one is a persistence error.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Persistence(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Persistence(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write `value` as pretty JSON by writing a temp file and renaming it over
/// `path`. Creates the parent directory.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).await.map_err(|e| {
                Error::Persistence(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| Error::Persistence(format!("Failed to create temp file: {}", e)))?;

    file.write_all(content.as_bytes())
        .await
        .map_err(|e| Error::Persistence(format!("Failed to write {}: {}", path.display(), e)))?;

    file.sync_all()
        .await
        .map_err(|e| Error::Persistence(format!("Failed to sync {}: {}", path.display(), e)))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::Persistence(format!("Failed to rename {}: {}", path.display(), e)))?;

    Ok(())
}
