//! Tests for apply, reset and the apply preview

mod common;

use common::{FakeControl, INTERFACE_FILE, populated, store};
use pretty_assertions::assert_eq;
use wgsync_core::diff::PeerStatus;
use wgsync_core::{
    ConfigSynchronizer, Error, ErrorKind, MatchTier, ReloadOutcome, SyncOptions, SyncStatus,
};
use wgsync_test_utils::TestWireGuard;
use wgsync_test_utils::keys::{KEY_A, KEY_B, KEY_C, PRIVATE_P, PRIVATE_Q};

fn synchronizer(wg: &TestWireGuard, control: FakeControl) -> ConfigSynchronizer {
    ConfigSynchronizer::new(store(wg), control.arc())
}

#[tokio::test]
async fn apply_writes_merged_config_in_file_name_order() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.apply("wg0").await.unwrap();
    assert!(report.changed);
    assert_eq!(report.reload, ReloadOutcome::Skipped);

    let merged = wg.read("wg0.conf");
    assert!(merged.contains(PRIVATE_P), "interface key belongs in the merged config");
    assert!(!merged.contains(PRIVATE_Q), "peer private keys never reach the merged config");
    assert!(!merged.contains("laptop"));
    let laptop = merged.find(KEY_A).unwrap();
    let phone = merged.find(KEY_B).unwrap();
    assert!(laptop < phone);
}

#[tokio::test]
async fn apply_twice_reports_no_change() {
    let wg = populated();
    let control = std::sync::Arc::new(FakeControl::active(Vec::new()));
    let sync = ConfigSynchronizer::new(store(&wg), control.clone());

    sync.apply("wg0").await.unwrap();
    let second = sync.apply("wg0").await.unwrap();

    assert!(!second.changed);
    assert_eq!(second.diff.status, SyncStatus::InSync);
    assert_eq!(second.diff.text_diff, "");
    assert_eq!(second.reload, ReloadOutcome::Reloaded);
    assert_eq!(control.reload_count(), 2);
}

#[tokio::test]
async fn apply_rejects_duplicate_keys_and_keeps_previous_file() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());
    sync.apply("wg0").await.unwrap();
    let before = wg.read("wg0.conf");

    wg.peer_file(
        "wg0",
        "tablet",
        &format!("[Peer]\nPublicKey = {KEY_A}\nAllowedIPs = 10.0.0.9/32\n"),
    );
    let err = sync.apply("wg0").await.unwrap_err();

    assert!(matches!(err, Error::DuplicatePeer { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(wg.read("wg0.conf"), before);
}

#[tokio::test]
async fn apply_rejects_duplicate_allowed_ips() {
    let wg = populated();
    wg.peer_file(
        "wg0",
        "tablet",
        &format!("[Peer]\nPublicKey = {KEY_C}\nAllowedIPs = 10.0.0.3/32\n"),
    );
    let sync = synchronizer(&wg, FakeControl::inactive());

    let err = sync.apply("wg0").await.unwrap_err();
    assert!(err.to_string().contains("allowed IPs"), "got {err}");
    wg.assert_file_not_exists("wg0.conf");
}

#[tokio::test]
async fn dry_run_apply_writes_nothing() {
    let wg = populated();
    let control = std::sync::Arc::new(FakeControl::inactive());
    let sync = ConfigSynchronizer::new(store(&wg), control.clone());

    let report = sync.apply_with_options("wg0", SyncOptions::dry_run()).await.unwrap();

    assert!(report.dry_run);
    assert!(report.changed);
    assert_eq!(report.reload, ReloadOutcome::NotAttempted);
    assert_eq!(control.reload_count(), 0);
    wg.assert_file_not_exists("wg0.conf");
}

#[tokio::test]
async fn failed_reload_keeps_written_file() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::active(Vec::new()).failing_reload("syncconf exited 1"));

    let report = sync.apply("wg0").await.unwrap();

    assert!(report.reload.is_failure());
    assert!(report.changed);
    wg.assert_file_contains("wg0.conf", KEY_A);
}

#[tokio::test]
async fn apply_holds_the_interface_lock() {
    let wg = populated();
    let store = store(&wg);
    let sync = ConfigSynchronizer::new(store.clone(), FakeControl::inactive().arc());

    let _held = store.lock("wg0").unwrap();
    let err = sync.apply("wg0").await.unwrap_err();

    assert!(matches!(err, Error::Conflict { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn dry_run_ignores_the_lock() {
    let wg = populated();
    let store = store(&wg);
    let sync = ConfigSynchronizer::new(store.clone(), FakeControl::inactive().arc());

    let _held = store.lock("wg0").unwrap();
    assert!(sync.apply_with_options("wg0", SyncOptions::dry_run()).await.is_ok());
}

#[test]
fn diff_without_merged_config_lists_every_peer_as_added() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.diff("wg0").unwrap();

    assert_eq!(report.status, SyncStatus::OutOfSync);
    assert_eq!(report.peers.len(), 2);
    assert!(report.peers.iter().all(|p| p.status == PeerStatus::Added));
    assert!(!report.interface_changes.is_empty());
    assert!(report.text_diff.contains("+[Peer]"));
    assert!(!report.text_diff.contains(PRIVATE_P));
    assert!(report.text_diff.contains("[redacted]"));
}

#[tokio::test]
async fn apply_replaces_unreadable_merged_config() {
    let wg = populated();
    wg.canonical("wg0", "[Interface]\n[Bogus]\nstray line\n");
    let sync = synchronizer(&wg, FakeControl::inactive());

    let preview = sync.diff("wg0").unwrap();
    assert_eq!(preview.status, SyncStatus::OutOfSync);
    assert!(preview.text_diff.contains("-[Bogus]"));

    let report = sync.apply("wg0").await.unwrap();
    assert!(report.changed);

    let merged = wg.read("wg0.conf");
    assert!(!merged.contains("Bogus"));
    assert!(merged.contains(KEY_A));
    assert!(sync.diff("wg0").unwrap().is_in_sync());
}

#[tokio::test]
async fn endpoint_change_is_minor_drift() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());
    sync.apply("wg0").await.unwrap();

    wg.peer_file(
        "wg0",
        "phone",
        &format!("[Peer]\nPublicKey = {KEY_B}\nAllowedIPs = 10.0.0.3/32\nEndpoint = 192.0.2.1:51820\n"),
    );
    let report = sync.diff("wg0").unwrap();

    assert_eq!(report.status, SyncStatus::MinorDrift);
    assert_eq!(report.peers.len(), 1);
    assert_eq!(report.peers[0].name.as_deref(), Some("phone"));
    assert_eq!(report.peers[0].status, PeerStatus::Modified);
}

#[test]
fn reset_keeps_names_and_private_keys() {
    let wg = populated();
    wg.canonical(
        "wg0",
        &format!(
            "{INTERFACE_FILE}\n[Peer]\nPublicKey = {KEY_A}\nAllowedIPs = 10.0.0.20/32\n\n\
             [Peer]\nPublicKey = {KEY_B}\nAllowedIPs = 10.0.0.3/32\n\n\
             [Peer]\nPublicKey = {KEY_C}\nAllowedIPs = 10.0.0.4/32\n"
        ),
    );
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.reset("wg0").unwrap();

    assert!(report.changed);
    assert_eq!(
        wg.folder_files("wg0"),
        vec!["laptop.conf", "peer1.conf", "phone.conf", "wg0.conf"]
    );
    wg.assert_file_contains("wg0/laptop.conf", PRIVATE_Q);
    wg.assert_file_contains("wg0/laptop.conf", "10.0.0.20/32");
    wg.assert_file_contains("wg0/peer1.conf", KEY_C);

    let laptop = &report.assignments[0];
    assert_eq!(laptop.name, "laptop");
    assert_eq!(laptop.matched_by, Some(MatchTier::PublicKey));
    assert!(laptop.kept_private_key);
    let new_peer = &report.assignments[2];
    assert_eq!(new_peer.name, "peer1");
    assert_eq!(new_peer.matched_by, None);
}

#[test]
fn reset_drops_private_key_when_public_key_changed() {
    let wg = populated();
    // Same allowed IPs as laptop, new key pair
    wg.canonical(
        "wg0",
        &format!(
            "{INTERFACE_FILE}\n[Peer]\nPublicKey = {KEY_C}\nAllowedIPs = 10.0.0.2/32\nPersistentKeepalive = 25\n\n\
             [Peer]\nPublicKey = {KEY_B}\nAllowedIPs = 10.0.0.3/32\n"
        ),
    );
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.reset("wg0").unwrap();

    assert_eq!(report.assignments[0].name, "laptop");
    assert_eq!(report.assignments[0].matched_by, Some(MatchTier::AllowedIps));
    assert!(!report.assignments[0].kept_private_key);
    let laptop = wg.read("wg0/laptop.conf");
    assert!(laptop.contains(KEY_C));
    assert!(!laptop.contains(PRIVATE_Q));
}

#[tokio::test]
async fn reset_after_apply_is_a_no_op() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());
    sync.apply("wg0").await.unwrap();
    let laptop_before = wg.read("wg0/laptop.conf");

    let report = sync.reset("wg0").unwrap();

    assert!(!report.changed);
    assert!(report.diff.peers.is_empty());
    assert_eq!(wg.read("wg0/laptop.conf"), laptop_before);
    assert_eq!(wg.folder_files("wg0"), vec!["laptop.conf", "phone.conf", "wg0.conf"]);
}

#[tokio::test]
async fn apply_after_reset_reproduces_merged_config() {
    let wg = TestWireGuard::from_fixtures();
    let sync = synchronizer(&wg, FakeControl::inactive());

    sync.reset("wg0").unwrap();
    sync.apply("wg0").await.unwrap();

    let report = sync.diff("wg0").unwrap();
    assert!(report.is_in_sync(), "{report:#?}");
    wg.assert_file_contains("wg0.conf", KEY_C);
    wg.assert_file_contains("wg0.conf", "fd00::4/128");
}

#[test]
fn reset_keeps_operator_files_in_the_folder() {
    let wg = TestWireGuard::from_fixtures();
    std::fs::write(wg.path("wg0/NOTES.md"), "rotation schedule").unwrap();
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.reset("wg0").unwrap();

    assert!(report.changed);
    assert_eq!(wg.read("wg0/NOTES.md"), "rotation schedule");
    assert!(!wg.folder_files("wg0").contains(&"phone.conf".to_string()));
}

#[test]
fn reset_creates_missing_folder() {
    let wg = TestWireGuard::new();
    wg.canonical(
        "wg1",
        &format!("[Interface]\nAddress = 10.1.0.1/24\n\n[Peer]\nPublicKey = {KEY_A}\nAllowedIPs = 10.1.0.2/32\n"),
    );
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.reset("wg1").unwrap();

    assert!(report.changed);
    assert_eq!(wg.folder_files("wg1"), vec!["peer1.conf", "wg1.conf"]);
}

#[test]
fn dry_run_reset_writes_nothing() {
    let wg = TestWireGuard::new();
    wg.canonical(
        "wg1",
        &format!("[Interface]\nAddress = 10.1.0.1/24\n\n[Peer]\nPublicKey = {KEY_A}\nAllowedIPs = 10.1.0.2/32\n"),
    );
    let sync = synchronizer(&wg, FakeControl::inactive());

    let report = sync.reset_with_options("wg1", SyncOptions::dry_run()).unwrap();

    assert!(report.changed);
    assert!(report.dry_run);
    wg.assert_file_not_exists("wg1");
}

#[test]
fn reset_without_merged_config_is_not_found() {
    let wg = populated();
    let sync = synchronizer(&wg, FakeControl::inactive());

    let err = sync.reset("wg0").unwrap_err();

    assert!(matches!(err, Error::CanonicalNotFound { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
