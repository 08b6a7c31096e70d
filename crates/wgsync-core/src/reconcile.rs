//! Configured-vs-live reconciliation
//!
//! Read-only: the reconciler never takes the interface lock and never writes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ReconcileSource;
use crate::control::{LiveStatus, WireGuardControl};
use crate::diff::{DiffEngine, PeerDiff, PeerStatus, SyncStatus};
use crate::model::{PeerRecord, RuntimePeerRecord, RuntimeState};
use crate::store::InterfaceStore;
use crate::{Error, Result};

/// Sync state of a whole interface against the running daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceStatus {
    InSync,
    MinorDrift,
    OutOfSync,
    /// Configured but not running.
    Inactive,
    /// The live query failed; nothing is known about the daemon.
    Unavailable,
}

impl From<SyncStatus> for InterfaceStatus {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::InSync => Self::InSync,
            SyncStatus::MinorDrift => Self::MinorDrift,
            SyncStatus::OutOfSync => Self::OutOfSync,
        }
    }
}

impl std::fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InSync => "in sync",
            Self::MinorDrift => "minor drift",
            Self::OutOfSync => "out of sync",
            Self::Inactive => "inactive",
            Self::Unavailable => "unavailable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub interface: String,
    pub status: InterfaceStatus,
    pub source: ReconcileSource,
    pub configured: Vec<PeerRecord>,
    pub peers: Vec<PeerDiff>,
    pub live: Vec<RuntimePeerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_error: Option<String>,
}

/// Compares configured peers with the live daemon.
pub struct StateReconciler {
    store: Arc<dyn InterfaceStore>,
    control: Arc<dyn WireGuardControl>,
    source: ReconcileSource,
    engine: DiffEngine,
}

impl StateReconciler {
    pub fn new(store: Arc<dyn InterfaceStore>, control: Arc<dyn WireGuardControl>) -> Self {
        Self {
            store,
            control,
            source: ReconcileSource::default(),
            engine: DiffEngine::default(),
        }
    }

    pub fn with_source(mut self, source: ReconcileSource) -> Self {
        self.source = source;
        self
    }

    /// Raw live state. `None` when the interface is not running.
    pub async fn live_state(&self, interface: &str) -> Result<Option<RuntimeState>> {
        match self.control.query(interface).await? {
            LiveStatus::Active(state) => Ok(Some(state)),
            LiveStatus::Inactive => Ok(None),
        }
    }

    pub async fn reconcile(&self, interface: &str) -> Result<ReconcileReport> {
        let configured = self.configured_peers(interface)?;

        let mut report = ReconcileReport {
            interface: interface.to_string(),
            status: InterfaceStatus::Unavailable,
            source: self.source,
            configured,
            peers: Vec::new(),
            live: Vec::new(),
            live_error: None,
        };

        match self.control.query(interface).await {
            Ok(LiveStatus::Inactive) => {
                debug!(interface, "interface inactive, skipping peer comparison");
                report.status = InterfaceStatus::Inactive;
            }
            Ok(LiveStatus::Active(state)) => {
                let peers: Vec<PeerDiff> = self
                    .engine
                    .diff(&report.configured, &state.peers)
                    .into_iter()
                    .map(|mut diff| {
                        if diff.status == PeerStatus::Removed {
                            diff.status = PeerStatus::NotLive;
                        }
                        diff
                    })
                    .collect();
                report.status = SyncStatus::from_diffs(&peers).into();
                report.peers = peers;
                report.live = state.peers;
            }
            Err(e) => {
                warn!(interface, error = %e, "live query failed");
                report.live_error = Some(e.to_string());
            }
        }

        debug!(interface, status = %report.status, "reconciled interface");
        Ok(report)
    }

    fn configured_peers(&self, interface: &str) -> Result<Vec<PeerRecord>> {
        let folder_exists = self.store.folder_exists(interface)?;
        match self.source {
            ReconcileSource::Canonical => match self.store.read_canonical(interface)? {
                Some(config) => Ok(config.peers),
                None if folder_exists => Ok(Vec::new()),
                None => Err(not_found(interface)),
            },
            ReconcileSource::Folder => {
                if folder_exists {
                    Ok(self.store.read_folder(interface)?.peers)
                } else if self.store.canonical_exists(interface)? {
                    Ok(Vec::new())
                } else {
                    Err(not_found(interface))
                }
            }
        }
    }
}

fn not_found(interface: &str) -> Error {
    Error::InterfaceNotFound {
        name: interface.to_string(),
    }
}
