//! Settings resolution and service wiring
//!
//! Commands never build stores or controls themselves; they ask the
//! [`Context`] so that `--config` and `--base-dir` apply everywhere.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use wgsync_core::{
    ConfigSynchronizer, InterfaceManager, InterfaceStore, PeerManager, Settings, StateReconciler,
    WireGuardControl, X25519Generator,
};
use wgsync_fs::NormalizedPath;
use wgsync_fs::constants::DEFAULT_SETTINGS_PATH;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub settings_path: NormalizedPath,
}

impl Context {
    /// Load settings from `config` (or the default path) and apply overrides.
    pub fn load(config: Option<&Path>, base_dir: Option<&Path>) -> Result<Self> {
        let settings_path = match config {
            Some(path) => NormalizedPath::new(path),
            None => NormalizedPath::new(DEFAULT_SETTINGS_PATH),
        };

        let mut settings = Settings::load(&settings_path)?;
        if let Some(base_dir) = base_dir {
            settings = settings.with_base_dir(base_dir.to_string_lossy());
        }

        debug!(settings = %settings_path, base_dir = %settings.base_dir, "resolved settings");
        Ok(Self {
            settings,
            settings_path,
        })
    }

    pub fn store(&self) -> Arc<dyn InterfaceStore> {
        Arc::new(self.settings.folder_store())
    }

    pub fn control(&self) -> Arc<dyn WireGuardControl> {
        Arc::new(self.settings.wg_command())
    }

    pub fn synchronizer(&self) -> ConfigSynchronizer {
        ConfigSynchronizer::new(self.store(), self.control())
    }

    pub fn reconciler(&self) -> StateReconciler {
        StateReconciler::new(self.store(), self.control()).with_source(self.settings.sync.reconcile_source)
    }

    pub fn interfaces(&self) -> InterfaceManager {
        InterfaceManager::new(self.store(), Arc::new(X25519Generator))
    }

    pub fn peers(&self) -> PeerManager {
        PeerManager::new(self.store(), Arc::new(X25519Generator))
    }
}
