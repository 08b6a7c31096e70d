//! Peer and interface diffing
//!
//! Built on the normalizer and the matcher. Used for config-vs-config
//! previews and config-vs-live reconciliation alike.

mod engine;
mod report;

pub use engine::{DiffEngine, REDACTED, diff_interface, diff_peers};
pub use report::{FieldChange, InterfaceFieldChange, PeerDiff, PeerStatus, SyncStatus};
