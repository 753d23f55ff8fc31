/// Signals file import/export
///
/// Reads and writes the `{ "signals": { "<name>": [snapshot, ...] } }` document.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::signal_store::{Signal, SignalStore};
use crate::error::ConfigError;
use crate::landmark::Snapshot;

/// Export filename used when nothing has been loaded yet
pub const DEFAULT_SIGNALS_FILENAME: &str = "signals-config.json";

#[derive(Debug, Deserialize)]
struct SignalsFile {
    signals: BTreeMap<String, Vec<Snapshot>>,
}

#[derive(Debug, Serialize)]
struct SignalsFileRef<'a> {
    signals: BTreeMap<&'a str, &'a [Snapshot]>,
}

impl SignalStore {
    /// Parse a signals document. The caller's store is not touched on error.
    pub fn from_json(json: &str) -> Result<SignalStore, ConfigError> {
        let file: SignalsFile = serde_json::from_str(json).map_err(ConfigError::Malformed)?;
        Ok(SignalStore::from_signals(
            file.signals
                .into_iter()
                .map(|(name, snapshots)| Signal::with_snapshots(name, snapshots)),
        ))
    }

    /// Serialize the whole store in the signals document shape
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let file = SignalsFileRef {
            signals: self.iter().map(|s| (s.name(), s.snapshots())).collect(),
        };
        serde_json::to_string_pretty(&file).map_err(ConfigError::SerializeFailed)
    }

    /// Load a signals document from disk
    pub fn load_file(path: &Path) -> Result<SignalStore, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let store = Self::from_json(&content)?;

        tracing::debug!(
            "Loaded {} signals ({} snapshots) from {}",
            store.len(),
            store.total_snapshots(),
            path.display()
        );
        Ok(store)
    }

    /// Write the store to disk as a signals document
    pub fn save_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = self.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        tracing::debug!("Saved signals to: {}", path.display());
        Ok(())
    }
}

/// Export target: the last loaded file's name, or the default filename
pub fn default_export_path(last_loaded: Option<&Path>) -> PathBuf {
    last_loaded
        .and_then(Path::file_name)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SIGNALS_FILENAME))
}
