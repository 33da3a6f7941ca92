//! File-backed storage adapters.
//!
//! Implements [`RecordPort`] for the inventory record and [`ConfigPort`]
//! for the JSON cabinet configuration.
//!
//! # Durability
//!
//! - Atomic writes: data goes to a sibling `.tmp` file, is synced, then
//!   renamed over the target.  A crash or failed write leaves the previous
//!   file intact.
//! - Config validation: every field is range-checked before persistence.
//! - A missing config file is not an error; defaults apply.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, RecordPort, StorageError};
use crate::config::CabinetConfig;

/// Write `data` to `path` through a temp file and rename.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ───────────────────────────────────────────────────────────────
// Inventory record
// ───────────────────────────────────────────────────────────────

/// Inventory record kept in a single text file.
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordPort for FileRecordStore {
    fn read_record(&self) -> Result<String, StorageError> {
        fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound
            } else {
                warn!("FileRecordStore: read {} failed: {}", self.path.display(), e);
                StorageError::IoError
            }
        })
    }

    fn write_record(&mut self, text: &str) -> Result<(), StorageError> {
        atomic_write(&self.path, text.as_bytes()).map_err(|e| {
            warn!("FileRecordStore: write {} failed: {}", self.path.display(), e);
            StorageError::IoError
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration
// ───────────────────────────────────────────────────────────────

/// [`CabinetConfig`] stored as pretty-printed JSON.
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<CabinetConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "JsonConfigFile: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(CabinetConfig::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: read failed: {}", e);
                return Err(ConfigError::IoError);
            }
        };
        let config: CabinetConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("JsonConfigFile: {} unreadable: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate().map_err(ConfigError::ValidationFailed)?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &CabinetConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let json = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        atomic_write(&self.path, json.as_bytes()).map_err(|e| {
            warn!("JsonConfigFile: write failed: {}", e);
            ConfigError::IoError
        })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}
