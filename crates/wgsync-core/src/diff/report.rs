//! Diff result types

use serde::{Deserialize, Serialize};

use crate::normalize::PeerField;

/// What happened to a peer between the left and right collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeerStatus {
    /// Only on the right
    Added,
    /// Only on the left
    Removed,
    /// On both sides with at least one differing field
    Modified,
    /// Configured but absent from the live daemon
    NotLive,
}

/// One differing field with both raw values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: PeerField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_value: Option<String>,
}

/// Per-peer change entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDiff {
    /// Name when either side has one (left preferred), otherwise public key.
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: PeerStatus,
    pub is_strict: bool,
    pub changed_fields: Vec<FieldChange>,
}

impl PeerDiff {
    pub fn has_field(&self, field: PeerField) -> bool {
        self.changed_fields.iter().any(|c| c.field == field)
    }
}

/// Interface-level classification of a diff list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    InSync,
    MinorDrift,
    OutOfSync,
}

impl SyncStatus {
    /// In sync iff empty; out of sync iff any entry is strict; otherwise minor drift.
    pub fn from_diffs(diffs: &[PeerDiff]) -> Self {
        if diffs.is_empty() {
            Self::InSync
        } else if diffs.iter().any(|d| d.is_strict) {
            Self::OutOfSync
        } else {
            Self::MinorDrift
        }
    }

    /// The more severe of the two.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InSync => "in sync",
            Self::MinorDrift => "minor drift",
            Self::OutOfSync => "out of sync",
        })
    }
}

/// A differing `[Interface]` key. Private key values are redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceFieldChange {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_value: Option<String>,
}
