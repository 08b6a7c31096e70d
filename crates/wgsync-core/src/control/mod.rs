//! Live daemon control
//!
//! [`WireGuardControl`] is the seam between the engine and the running
//! daemon. [`WgCommand`] implements it with the `wg` and `wg-quick` tools.

mod dump;
mod wg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wgsync_fs::NormalizedPath;

use crate::Result;
use crate::model::RuntimeState;

pub use dump::parse_dump;
pub use wg::WgCommand;

/// Outcome of a live query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    Active(RuntimeState),
    /// The interface exists on disk but is not running.
    Inactive,
}

/// What happened when the daemon was asked to pick up a new merged config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReloadOutcome {
    Reloaded,
    /// The interface is not running; it will read the file when brought up.
    Skipped,
    /// The file was written but the daemon did not accept it.
    Failed { message: String },
    /// Dry run, nothing was signalled.
    NotAttempted,
}

impl ReloadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[async_trait]
pub trait WireGuardControl: Send + Sync {
    /// Observe the running interface.
    async fn query(&self, interface: &str) -> Result<LiveStatus>;

    /// Make the running interface match the merged config at `config_path`.
    ///
    /// Returns `Skipped` for an inactive interface. Errors mean the daemon
    /// could not be updated.
    async fn reload(&self, interface: &str, config_path: &NormalizedPath) -> Result<ReloadOutcome>;
}
