//! ConfigSynchronizer implementation

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::conf::{parse_config, render_config};
use crate::control::{ReloadOutcome, WireGuardControl};
use crate::diff::{DiffEngine, SyncStatus, diff_interface};
use crate::matcher::Matcher;
use crate::model::{InterfaceRecord, PeerRecord, WireGuardConfig};
use crate::store::InterfaceStore;
use crate::validation::{validate_interface, validate_peer_set};
use crate::{Error, Result};

use super::preview::unified_diff;
use super::{ApplyReport, ConfigDiffReport, PeerAssignment, ResetReport, SyncOptions};

/// Moves an interface between its managed folder and its merged config.
///
/// Writers take the per-interface lock from the store; previews and dry runs
/// do not.
pub struct ConfigSynchronizer {
    store: Arc<dyn InterfaceStore>,
    control: Arc<dyn WireGuardControl>,
    engine: DiffEngine,
}

impl ConfigSynchronizer {
    pub fn new(store: Arc<dyn InterfaceStore>, control: Arc<dyn WireGuardControl>) -> Self {
        Self {
            store,
            control,
            engine: DiffEngine::default(),
        }
    }

    /// Preview what apply would change, comparing the merged config (left)
    /// with the managed folder (right).
    pub fn diff(&self, interface: &str) -> Result<ConfigDiffReport> {
        let folder = self.store.read_folder(interface)?;
        let pending = render_config(&merged(&folder));
        self.apply_preview(interface, &folder, &pending)
    }

    /// Preview what reset would change, comparing the managed folder (left)
    /// with the merged config (right).
    pub fn preview_reset(&self, interface: &str) -> Result<ConfigDiffReport> {
        let canonical = self.require_canonical(interface)?;
        let folder = self.current_folder(interface)?;
        self.reset_preview(interface, &folder, &canonical)
    }

    pub async fn apply(&self, interface: &str) -> Result<ApplyReport> {
        self.apply_with_options(interface, SyncOptions::default()).await
    }

    /// Merge the managed folder into the merged config and reload the daemon.
    ///
    /// The folder is validated before anything is written; a rejected folder
    /// leaves the previous merged config untouched. A failed reload does not
    /// roll the file back and is reported as [`ReloadOutcome::Failed`].
    pub async fn apply_with_options(&self, interface: &str, options: SyncOptions) -> Result<ApplyReport> {
        let _lock = if options.dry_run {
            None
        } else {
            Some(self.store.lock(interface)?)
        };

        let folder = self.store.read_folder(interface)?;
        validate_interface(&folder.interface)?;
        validate_peer_set(interface, &folder.peers)?;

        let pending = render_config(&merged(&folder));
        let diff = self.apply_preview(interface, &folder, &pending)?;
        let path = self.store.canonical_path(interface)?;

        if options.dry_run {
            let current = self.store.read_canonical_text(interface)?;
            return Ok(ApplyReport {
                interface: interface.to_string(),
                dry_run: true,
                changed: current.as_deref() != Some(pending.as_str()),
                path: path.to_string(),
                diff,
                reload: ReloadOutcome::NotAttempted,
            });
        }

        let changed = self.store.write_canonical(interface, &pending)?;
        let reload = match self.control.reload(interface, &path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(interface, error = %e, "merged config written but reload failed");
                ReloadOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        info!(interface, changed, status = %diff.status, "applied managed folder");
        Ok(ApplyReport {
            interface: interface.to_string(),
            dry_run: false,
            changed,
            path: path.to_string(),
            diff,
            reload,
        })
    }

    pub fn reset(&self, interface: &str) -> Result<ResetReport> {
        self.reset_with_options(interface, SyncOptions::default())
    }

    /// Split the merged config back into the managed folder.
    ///
    /// Peers keep the name (and private key, while their public key is
    /// unchanged) of the folder file they match. Unmatched peers get the
    /// smallest free `peer<N>`. Nothing is written when the folder already
    /// agrees with the merged config.
    pub fn reset_with_options(&self, interface: &str, options: SyncOptions) -> Result<ResetReport> {
        let _lock = if options.dry_run {
            None
        } else {
            Some(self.store.lock(interface)?)
        };

        let canonical = self.require_canonical(interface)?;
        validate_interface(&canonical.interface)?;
        validate_peer_set(interface, &canonical.peers)?;

        let current = self.current_folder(interface)?;
        let (target, assignments, renamed) = self.split(interface, &canonical, &current);
        let diff = self.reset_preview(interface, &current, &canonical)?;

        let extras_differ = target.peers.iter().any(|peer| {
            current
                .peers
                .iter()
                .find(|existing| existing.name == peer.name)
                .is_none_or(|existing| existing.extra != peer.extra)
        });
        let changed = !diff.peers.is_empty()
            || !current.interface.same_section(&canonical.interface)
            || renamed
            || extras_differ
            || !self.store.folder_exists(interface)?;

        if changed && !options.dry_run {
            self.store.write_folder(&target)?;
            info!(interface, peers = target.peers.len(), "reset managed folder from merged config");
        } else if !changed {
            info!(interface, "managed folder already matches merged config");
        }

        Ok(ResetReport {
            interface: interface.to_string(),
            dry_run: options.dry_run,
            changed,
            diff,
            assignments,
        })
    }

    fn require_canonical(&self, interface: &str) -> Result<WireGuardConfig> {
        self.store
            .read_canonical(interface)?
            .ok_or_else(|| match self.store.canonical_path(interface) {
                Ok(path) => Error::CanonicalNotFound {
                    path: path.to_native(),
                },
                Err(e) => e,
            })
    }

    /// The managed folder, or an empty one when it does not exist yet.
    fn current_folder(&self, interface: &str) -> Result<WireGuardConfig> {
        if self.store.folder_exists(interface)? {
            self.store.read_folder(interface)
        } else {
            Ok(WireGuardConfig::new(InterfaceRecord::new(interface), Vec::new()))
        }
    }

    fn apply_preview(&self, interface: &str, folder: &WireGuardConfig, pending: &str) -> Result<ConfigDiffReport> {
        let current_text = self.store.read_canonical_text(interface)?;
        let empty = || WireGuardConfig::new(InterfaceRecord::new(interface), Vec::new());

        // Apply replaces an unreadable merged config. The structured diff
        // treats it as empty.
        let mut unreadable = false;
        let canonical = match current_text.as_deref() {
            Some(text) => {
                let path = self.store.canonical_path(interface)?;
                match parse_config(interface, text, &path.to_native()) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(interface, error = %e, "current merged config is unreadable, it will be replaced");
                        unreadable = true;
                        empty()
                    }
                }
            }
            None => empty(),
        };

        let mut report = self.report(
            interface,
            &canonical,
            folder,
            current_text.as_deref().unwrap_or(""),
            pending,
        );
        if unreadable {
            report.status = report.status.worst(SyncStatus::OutOfSync);
        }
        Ok(report)
    }

    fn reset_preview(
        &self,
        interface: &str,
        folder: &WireGuardConfig,
        canonical: &WireGuardConfig,
    ) -> Result<ConfigDiffReport> {
        let current_text = render_config(&merged(folder));
        let canonical_text = self.store.read_canonical_text(interface)?.unwrap_or_default();
        Ok(self.report(interface, folder, canonical, &current_text, &canonical_text))
    }

    fn report(
        &self,
        interface: &str,
        left: &WireGuardConfig,
        right: &WireGuardConfig,
        left_text: &str,
        right_text: &str,
    ) -> ConfigDiffReport {
        let peers = self.engine.diff(&left.peers, &right.peers);
        let interface_changes = diff_interface(&left.interface, &right.interface);

        let mut status = SyncStatus::from_diffs(&peers);
        if !interface_changes.is_empty() {
            status = status.worst(SyncStatus::OutOfSync);
        }

        ConfigDiffReport {
            interface: interface.to_string(),
            status,
            peers,
            interface_changes,
            text_diff: unified_diff(interface, left_text, right_text),
        }
    }

    /// Name the merged config's peers after the folder files they match.
    ///
    /// Returns the new folder, the assignments, and whether any peer ends up
    /// under a different name than the file it matched.
    fn split(
        &self,
        interface: &str,
        canonical: &WireGuardConfig,
        current: &WireGuardConfig,
    ) -> (WireGuardConfig, Vec<PeerAssignment>, bool) {
        let pairing = Matcher::default().pair(&canonical.peers, &current.peers);

        let mut taken: HashSet<String> = pairing
            .by_target
            .iter()
            .flatten()
            .filter_map(|(index, _)| current.peers[*index].name.clone())
            .collect();

        let mut peers = Vec::with_capacity(canonical.peers.len());
        let mut assignments = Vec::with_capacity(canonical.peers.len());
        let mut renamed = false;

        for (peer, found) in canonical.peers.iter().zip(&pairing.by_target) {
            let existing = found.map(|(index, tier)| (&current.peers[index], tier));

            let (name, matched_by, private_key) = match existing {
                Some((folder_peer, tier)) if folder_peer.name.is_some() => {
                    let keep_key = folder_peer.public_key == peer.public_key;
                    (
                        folder_peer.name.clone().unwrap_or_default(),
                        Some(tier),
                        if keep_key { folder_peer.private_key.clone() } else { None },
                    )
                }
                _ => {
                    renamed = true;
                    (next_free_name(interface, &mut taken), None, None)
                }
            };

            assignments.push(PeerAssignment {
                name: name.clone(),
                public_key: peer.public_key.clone(),
                matched_by,
                kept_private_key: private_key.is_some(),
            });
            peers.push(PeerRecord {
                name: Some(name),
                private_key,
                ..peer.without_secrets()
            });
        }

        (WireGuardConfig::new(canonical.interface.clone(), peers), assignments, renamed)
    }
}

/// Folder contents as they appear in a merged config.
fn merged(folder: &WireGuardConfig) -> WireGuardConfig {
    WireGuardConfig::new(
        folder.interface.clone(),
        folder.peers.iter().map(PeerRecord::without_secrets).collect(),
    )
}

/// Smallest `peer<N>` (N ≥ 1) not yet taken and distinct from the interface name.
fn next_free_name(interface: &str, taken: &mut HashSet<String>) -> String {
    let mut n = 1usize;
    loop {
        let candidate = format!("peer{}", n);
        if candidate != interface && !taken.contains(&candidate) {
            taken.insert(candidate.clone());
            return candidate;
        }
        n += 1;
    }
}
