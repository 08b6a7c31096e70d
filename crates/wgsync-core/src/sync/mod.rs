//! Folder ↔ merged config synchronization
//!
//! - **apply**: merge the managed folder into the merged config and reload the daemon
//! - **reset**: split the merged config back into the managed folder
//! - **diff**: preview what apply would change

mod preview;
mod synchronizer;

use serde::{Deserialize, Serialize};

use crate::control::ReloadOutcome;
use crate::diff::{InterfaceFieldChange, PeerDiff, SyncStatus};
use crate::matcher::MatchTier;

pub use preview::{redact_secrets, unified_diff};
pub use synchronizer::ConfigSynchronizer;

/// Options for apply and reset
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute the report without writing files or signalling the daemon.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Pre-flight comparison of two representations of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDiffReport {
    pub interface: String,
    pub status: SyncStatus,
    pub peers: Vec<PeerDiff>,
    pub interface_changes: Vec<InterfaceFieldChange>,
    /// Unified diff of the merged config text, secrets redacted.
    pub text_diff: String,
}

impl ConfigDiffReport {
    pub fn is_in_sync(&self) -> bool {
        self.status == SyncStatus::InSync
    }
}

/// Result of an apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub interface: String,
    pub dry_run: bool,
    /// Whether the merged config content changed (or would change).
    pub changed: bool,
    pub path: String,
    pub diff: ConfigDiffReport,
    pub reload: ReloadOutcome,
}

/// How one merged-config peer was named in the folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAssignment {
    pub name: String,
    pub public_key: String,
    /// Tier that tied the peer to an existing folder file; `None` for a new name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchTier>,
    /// The folder file's private key was carried over.
    pub kept_private_key: bool,
}

/// Result of a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub interface: String,
    pub dry_run: bool,
    /// Whether the folder was (or would be) rewritten.
    pub changed: bool,
    pub diff: ConfigDiffReport,
    pub assignments: Vec<PeerAssignment>,
}
