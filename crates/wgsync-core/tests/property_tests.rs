use proptest::prelude::*;
use wgsync_core::diff::diff_peers;
use wgsync_core::normalize::normalize_allowed_ips;
use wgsync_core::{FieldChange, Matcher, PeerDiff, PeerRecord, PeerStatus};

/// Peers with distinct keys and distinct /32s.
fn peer_set() -> impl Strategy<Value = Vec<PeerRecord>> {
    prop::collection::btree_set(1u8..250, 0..12).prop_map(|hosts| {
        hosts
            .into_iter()
            .map(|host| PeerRecord::new(format!("key-{host}"), format!("10.0.0.{host}/32")))
            .collect()
    })
}

/// Two sets over the same hosts: each host is unchanged, re-addressed,
/// roaming, only on the left, or only on the right.
fn paired_sets() -> impl Strategy<Value = (Vec<PeerRecord>, Vec<PeerRecord>)> {
    prop::collection::btree_map(1u8..250, 0u8..5, 0..12).prop_map(|hosts| {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (host, change) in hosts {
            let peer = PeerRecord::new(format!("key-{host}"), format!("10.0.0.{host}/32"));
            match change {
                0 => {
                    left.push(peer.clone());
                    right.push(peer);
                }
                1 => {
                    let mut moved = peer.clone();
                    moved.allowed_ips = format!("10.1.0.{host}/32");
                    left.push(peer);
                    right.push(moved);
                }
                2 => {
                    let mut roaming = peer.clone();
                    roaming.endpoint = Some(format!("198.51.100.{host}:51820"));
                    left.push(peer);
                    right.push(roaming);
                }
                3 => left.push(peer),
                _ => right.push(peer),
            }
        }
        (left, right)
    })
}

fn swapped(changes: &[FieldChange]) -> Vec<FieldChange> {
    changes
        .iter()
        .map(|c| FieldChange {
            field: c.field,
            left_value: c.right_value.clone(),
            right_value: c.left_value.clone(),
        })
        .collect()
}

fn mirrored(status: PeerStatus) -> PeerStatus {
    match status {
        PeerStatus::Added => PeerStatus::Removed,
        PeerStatus::Removed => PeerStatus::Added,
        other => other,
    }
}

fn find<'a>(diffs: &'a [PeerDiff], identity: &str) -> Option<&'a PeerDiff> {
    diffs.iter().find(|d| d.identity == identity)
}

proptest! {
    #[test]
    fn test_diff_of_a_set_with_itself_is_empty(peers in peer_set()) {
        prop_assert!(diff_peers(&peers, &peers).is_empty());
    }

    #[test]
    fn test_reversed_diff_mirrors_direction((left, right) in paired_sets()) {
        let forward = diff_peers(&left, &right);
        let backward = diff_peers(&right, &left);
        prop_assert_eq!(forward.len(), backward.len());

        for entry in &forward {
            let reverse = find(&backward, &entry.identity);
            prop_assert!(reverse.is_some(), "{} missing from reversed diff", entry.identity);
            let reverse = reverse.unwrap();
            prop_assert_eq!(reverse.status, mirrored(entry.status));
            prop_assert_eq!(reverse.is_strict, entry.is_strict);
            prop_assert_eq!(&reverse.changed_fields, &swapped(&entry.changed_fields));
        }
    }

    #[test]
    fn test_diff_never_drops_a_record(left in peer_set(), right in peer_set()) {
        let diffs = diff_peers(&left, &right);
        let added = diffs.iter().filter(|d| d.status == PeerStatus::Added).count();
        let removed = diffs.iter().filter(|d| d.status == PeerStatus::Removed).count();
        let pairs = Matcher::default().pair(&right, &left).pairs().count();

        prop_assert_eq!(added + pairs, right.len());
        prop_assert_eq!(removed + pairs, left.len());
    }

    #[test]
    fn test_allowed_ips_order_is_irrelevant(mut hosts in prop::collection::vec(1u8..250, 1..6)) {
        let forward: Vec<String> = hosts.iter().map(|h| format!("10.0.0.{h}/32")).collect();
        hosts.reverse();
        let backward: Vec<String> = hosts.iter().map(|h| format!("10.0.0.{h}")).collect();

        prop_assert_eq!(
            normalize_allowed_ips(&forward.join(",")),
            normalize_allowed_ips(&backward.join(" , "))
        );
    }

    #[test]
    fn test_normalization_is_idempotent(list in "[0-9./, ]{0,40}") {
        let once = normalize_allowed_ips(&list);
        prop_assert_eq!(normalize_allowed_ips(&once), once);
    }
}
