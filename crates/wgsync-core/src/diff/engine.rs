//! DiffEngine implementation

use tracing::debug;

use crate::matcher::Matcher;
use crate::model::{InterfaceRecord, PeerView};
use crate::normalize::{PeerField, normalize, normalize_allowed_ips, normalize_scalar};

use super::report::{FieldChange, InterfaceFieldChange, PeerDiff, PeerStatus};

/// Placeholder shown instead of private key material.
pub const REDACTED: &str = "[redacted]";

/// Structured per-peer diff between two peer collections.
///
/// Every `right` record is matched against the unconsumed `left` records.
/// Output lists `right` records (added or modified) in input order, then
/// unconsumed `left` records (removed) in input order. The engine never fails
/// and never drops a record.
#[derive(Debug, Default)]
pub struct DiffEngine {
    matcher: Matcher,
}

impl DiffEngine {
    pub fn new(matcher: Matcher) -> Self {
        Self { matcher }
    }

    pub fn diff<L, R>(&self, left: &[L], right: &[R]) -> Vec<PeerDiff>
    where
        L: PeerView,
        R: PeerView,
    {
        let pairing = self.matcher.pair(right, left);
        let mut diffs = Vec::new();

        for (right_index, found) in pairing.by_target.iter().enumerate() {
            let right_peer = &right[right_index];
            match found {
                Some((left_index, _tier)) => {
                    let left_peer = &left[*left_index];
                    let changed = changed_fields(left_peer, right_peer);
                    if !changed.is_empty() {
                        let is_strict = changed.iter().any(|c| c.field.is_strict());
                        diffs.push(PeerDiff {
                            identity: identity(Some(left_peer), Some(right_peer)),
                            name: name_of(Some(left_peer), Some(right_peer)),
                            status: PeerStatus::Modified,
                            is_strict,
                            changed_fields: changed,
                        });
                    }
                }
                None => diffs.push(PeerDiff {
                    identity: identity(None::<&L>, Some(right_peer)),
                    name: name_of(None::<&L>, Some(right_peer)),
                    status: PeerStatus::Added,
                    is_strict: true,
                    changed_fields: set_fields(right_peer, Side::Right),
                }),
            }
        }

        for left_index in &pairing.unmatched_candidates {
            let left_peer = &left[*left_index];
            diffs.push(PeerDiff {
                identity: identity(Some(left_peer), None::<&R>),
                name: name_of(Some(left_peer), None::<&R>),
                status: PeerStatus::Removed,
                is_strict: true,
                changed_fields: set_fields(left_peer, Side::Left),
            });
        }

        debug!(left = left.len(), right = right.len(), changes = diffs.len(), "computed peer diff");
        diffs
    }
}

/// Diff with the default three-tier matcher.
pub fn diff_peers<L: PeerView, R: PeerView>(left: &[L], right: &[R]) -> Vec<PeerDiff> {
    DiffEngine::default().diff(left, right)
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

fn raw_field<P: PeerView + ?Sized>(peer: &P, field: PeerField) -> Option<&str> {
    match field {
        PeerField::AllowedIps => Some(peer.allowed_ips()),
        PeerField::PublicKey => Some(peer.public_key()),
        PeerField::PersistentKeepalive => peer.persistent_keepalive(),
        PeerField::Endpoint => peer.endpoint(),
    }
}

fn changed_fields<L: PeerView, R: PeerView>(left: &L, right: &R) -> Vec<FieldChange> {
    PeerField::ALL
        .iter()
        .filter_map(|&field| {
            let left_raw = raw_field(left, field);
            let right_raw = raw_field(right, field);
            if normalize(field, left_raw) == normalize(field, right_raw) {
                return None;
            }
            Some(FieldChange {
                field,
                left_value: present(left_raw),
                right_value: present(right_raw),
            })
        })
        .collect()
}

fn set_fields<P: PeerView>(peer: &P, side: Side) -> Vec<FieldChange> {
    PeerField::ALL
        .iter()
        .filter_map(|&field| {
            let value = present(raw_field(peer, field))?;
            let (left_value, right_value) = match side {
                Side::Left => (Some(value), None),
                Side::Right => (None, Some(value)),
            };
            Some(FieldChange {
                field,
                left_value,
                right_value,
            })
        })
        .collect()
}

fn present(raw: Option<&str>) -> Option<String> {
    raw.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn non_empty_name<P: PeerView>(peer: Option<&P>) -> Option<String> {
    peer.and_then(|p| p.name())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn name_of<L: PeerView, R: PeerView>(left: Option<&L>, right: Option<&R>) -> Option<String> {
    non_empty_name(left).or_else(|| non_empty_name(right))
}

fn identity<L: PeerView, R: PeerView>(left: Option<&L>, right: Option<&R>) -> String {
    name_of(left, right)
        .or_else(|| {
            left.map(|p| p.public_key())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        })
        .or_else(|| right.map(|p| p.public_key().to_string()))
        .unwrap_or_default()
}

/// Differing `[Interface]` keys between two interface sections.
///
/// Address is compared as a set, other values trimmed. Private key values
/// are never reported, only their presence.
pub fn diff_interface(left: &InterfaceRecord, right: &InterfaceRecord) -> Vec<InterfaceFieldChange> {
    let mut changes = Vec::new();

    let address = |r: &InterfaceRecord| normalize_allowed_ips(r.address.as_deref().unwrap_or(""));
    if address(left) != address(right) {
        changes.push(change("Address", left.address.as_deref(), right.address.as_deref()));
    }

    let scalars = [
        ("ListenPort", left.listen_port.as_deref(), right.listen_port.as_deref()),
        ("DNS", left.dns.as_deref(), right.dns.as_deref()),
        ("PostUp", left.post_up.as_deref(), right.post_up.as_deref()),
        ("PostDown", left.post_down.as_deref(), right.post_down.as_deref()),
    ];
    for (field, left_value, right_value) in scalars {
        if normalize_scalar(left_value) != normalize_scalar(right_value) {
            changes.push(change(field, left_value, right_value));
        }
    }

    if normalize_scalar(left.private_key.as_deref()) != normalize_scalar(right.private_key.as_deref()) {
        let redact = |r: &InterfaceRecord| present(r.private_key.as_deref()).map(|_| REDACTED.to_string());
        changes.push(InterfaceFieldChange {
            field: "PrivateKey".to_string(),
            left_value: redact(left),
            right_value: redact(right),
        });
    }

    if left.extra != right.extra {
        changes.push(InterfaceFieldChange {
            field: "Extra".to_string(),
            left_value: render_extra(&left.extra),
            right_value: render_extra(&right.extra),
        });
    }

    changes
}

fn change(field: &str, left: Option<&str>, right: Option<&str>) -> InterfaceFieldChange {
    InterfaceFieldChange {
        field: field.to_string(),
        left_value: present(left),
        right_value: present(right),
    }
}

fn render_extra(extra: &[(String, String)]) -> Option<String> {
    if extra.is_empty() {
        return None;
    }
    Some(
        extra
            .iter()
            .map(|(k, v)| format!("{} = {}", k, v))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
