//! Core engine for wgsync
//!
//! Keeps three views of a WireGuard interface consistent:
//!
//! - **Managed folder**: one file per peer plus an interface file, edited by
//!   people and tools
//! - **Merged config**: the single `<iface>.conf` consumed by `wg-quick`
//! - **Live state**: what the kernel reports through `wg show`
//!
//! # Architecture
//!
//! ```text
//!                      CLI
//!                       |
//!     +---------+-------+--------+-----------+
//!     |         |                |           |
//!   manage     sync          reconcile    config
//!     |         |                |
//!     |    diff / matcher    control (wg, wg-quick)
//!     |         |
//!   store --- conf (parse, render)
//!     |
//!  wgsync-fs
//! ```
//!
//! Filesystem work is synchronous; only the control layer awaits external
//! processes.

pub mod conf;
pub mod config;
pub mod control;
pub mod diff;
pub mod error;
pub mod keys;
pub mod manage;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod validation;

pub use config::{ReconcileSource, Settings};
pub use control::{LiveStatus, ReloadOutcome, WgCommand, WireGuardControl};
pub use diff::{DiffEngine, FieldChange, PeerDiff, PeerStatus, SyncStatus};
pub use error::{Error, ErrorKind, Result};
pub use keys::{KeyGenerator, KeyPair, X25519Generator};
pub use manage::{InterfaceManager, InterfaceUpdate, NewInterface, NewPeer, PeerManager, PeerUpdate};
pub use matcher::{MatchStrategy, MatchTier, Matcher};
pub use model::{InterfaceRecord, PeerRecord, PeerView, RuntimePeerRecord, RuntimeState, WireGuardConfig};
pub use normalize::PeerField;
pub use reconcile::{InterfaceStatus, ReconcileReport, StateReconciler};
pub use store::{FolderStore, InterfaceStore};
pub use sync::{
    ApplyReport, ConfigDiffReport, ConfigSynchronizer, PeerAssignment, ResetReport, SyncOptions,
};
