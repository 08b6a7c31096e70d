//! Application settings
//!
//! Every field has a default, so an absent or partial settings file is valid:
//!
//! ```toml
//! base_dir = "/etc/wireguard"
//!
//! [wireguard]
//! wg_binary = "wg"
//! wg_quick_binary = "wg-quick"
//! query_timeout_secs = 5
//!
//! [sync]
//! lock_timeout_ms = 5000
//! reconcile_source = "canonical"
//!
//! [logging]
//! level = "info"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wgsync_fs::{ConfigStore, NormalizedPath, constants::DEFAULT_BASE_DIR};

use crate::Result;
use crate::control::WgCommand;
use crate::store::FolderStore;

/// Which representation the reconciler compares against the live state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileSource {
    /// The merged config the daemon reads.
    #[default]
    Canonical,
    /// The managed folder.
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGuardSettings {
    pub wg_binary: String,
    pub wg_quick_binary: String,
    pub query_timeout_secs: u64,
}

impl Default for WireGuardSettings {
    fn default() -> Self {
        Self {
            wg_binary: "wg".to_string(),
            wg_quick_binary: "wg-quick".to_string(),
            query_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub lock_timeout_ms: u64,
    pub reconcile_source: ReconcileSource,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
            reconcile_source: ReconcileSource::Canonical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_dir: String,
    pub wireguard: WireGuardSettings,
    pub sync: SyncSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: DEFAULT_BASE_DIR.to_string(),
            wireguard: WireGuardSettings::default(),
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load_or_default(path)?)
    }

    /// Write to `path`. The format follows the extension.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> NormalizedPath {
        NormalizedPath::new(&self.base_dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.sync.lock_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.wireguard.query_timeout_secs)
    }

    pub fn folder_store(&self) -> FolderStore {
        FolderStore::new(self.base_dir()).with_lock_timeout(self.lock_timeout())
    }

    pub fn wg_command(&self) -> WgCommand {
        WgCommand::new(
            self.wireguard.wg_binary.clone(),
            self.wireguard.wg_quick_binary.clone(),
            self.query_timeout(),
        )
    }
}
