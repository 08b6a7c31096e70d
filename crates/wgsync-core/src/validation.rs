//! Write-time validation
//!
//! The diff engine tolerates anything; these checks run before a write
//! (apply, reset, CRUD) and reject data the daemon would choke on.

use std::collections::HashMap;
use std::sync::LazyLock;

use ipnetwork::IpNetwork;
use regex::Regex;

use crate::keys::is_valid_key;
use crate::model::{InterfaceRecord, PeerRecord};
use crate::normalize::{allowed_ip_tokens, normalize_allowed_ips};
use crate::{Error, Result};

static INTERFACE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("Invalid interface name regex")
});

static PEER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("Invalid peer name regex")
});

/// Kernel limit on interface names.
pub const MAX_INTERFACE_NAME: usize = 15;

pub const MAX_PEER_NAME: usize = 64;

pub fn validate_interface_name(name: &str) -> Result<()> {
    if name.len() > MAX_INTERFACE_NAME {
        return Err(Error::validation(format!(
            "interface name '{}' is longer than {} characters",
            name, MAX_INTERFACE_NAME
        )));
    }
    if !INTERFACE_NAME.is_match(name) {
        return Err(Error::validation(format!(
            "interface name '{}' must start with a letter and contain only letters, digits, '_' or '-'",
            name
        )));
    }
    Ok(())
}

/// Peer names are file stems in the interface folder.
pub fn validate_peer_name(interface: &str, name: &str) -> Result<()> {
    if name.len() > MAX_PEER_NAME || !PEER_NAME.is_match(name) {
        return Err(Error::validation(format!(
            "peer name '{}' must be 1-{} letters, digits, '_', '.' or '-' and not start with a symbol",
            name, MAX_PEER_NAME
        )));
    }
    if name == interface {
        return Err(Error::validation(format!(
            "peer name '{}' collides with the interface file",
            name
        )));
    }
    Ok(())
}

pub fn validate_listen_port(port: &str) -> Result<()> {
    match port.trim().parse::<u32>() {
        Ok(value) if (1..=65535).contains(&value) => Ok(()),
        _ => Err(Error::validation(format!(
            "listen port '{}' must be an integer in 1..=65535",
            port
        ))),
    }
}

pub fn validate_keepalive(keepalive: &str) -> Result<()> {
    match keepalive.trim().parse::<u32>() {
        Ok(value) if value <= 65535 => Ok(()),
        _ => Err(Error::validation(format!(
            "persistent keepalive '{}' must be an integer in 0..=65535",
            keepalive
        ))),
    }
}

/// Every token must be a CIDR or a bare address.
pub fn validate_cidr_list(what: &str, list: &str) -> Result<()> {
    for token in allowed_ip_tokens(list) {
        token.parse::<IpNetwork>().map_err(|e| {
            Error::validation(format!("{} entry '{}' is not a valid CIDR: {}", what, token, e))
        })?;
    }
    Ok(())
}

pub fn validate_public_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("public key is missing"));
    }
    if !is_valid_key(key) {
        return Err(Error::validation(format!(
            "public key '{}' is not base64 of 32 bytes",
            key
        )));
    }
    Ok(())
}

/// Field-level checks of one peer.
pub fn validate_peer(peer: &PeerRecord) -> Result<()> {
    let label = peer.name.as_deref().unwrap_or(&peer.public_key);
    let in_peer = |e: Error| match e {
        Error::Validation { message } => Error::validation(format!("peer {}: {}", label, message)),
        other => other,
    };

    validate_public_key(&peer.public_key).map_err(in_peer)?;
    validate_cidr_list("allowed IPs", &peer.allowed_ips).map_err(in_peer)?;
    if let Some(keepalive) = peer.persistent_keepalive.as_deref().filter(|k| !k.trim().is_empty()) {
        validate_keepalive(keepalive).map_err(in_peer)?;
    }
    if let Some(private_key) = peer.private_key.as_deref().filter(|k| !k.trim().is_empty())
        && !is_valid_key(private_key)
    {
        return Err(in_peer(Error::validation("private key is not base64 of 32 bytes")));
    }
    Ok(())
}

pub fn validate_interface(interface: &InterfaceRecord) -> Result<()> {
    validate_interface_name(&interface.name)?;
    if let Some(address) = interface.address.as_deref() {
        validate_cidr_list("address", address)?;
    }
    if let Some(port) = interface.listen_port.as_deref().filter(|p| !p.trim().is_empty()) {
        validate_listen_port(port)?;
    }
    if let Some(private_key) = interface.private_key.as_deref().filter(|k| !k.trim().is_empty())
        && !is_valid_key(private_key)
    {
        return Err(Error::validation("interface private key is not base64 of 32 bytes"));
    }
    Ok(())
}

/// Field checks on every peer, then uniqueness of public keys and of
/// non-empty allowed-IP sets.
pub fn validate_peer_set(interface: &str, peers: &[PeerRecord]) -> Result<()> {
    let mut keys: HashMap<&str, usize> = HashMap::new();
    let mut ip_sets: HashMap<String, usize> = HashMap::new();

    for (index, peer) in peers.iter().enumerate() {
        validate_peer(peer)?;

        if let Some(first) = keys.insert(peer.public_key.as_str(), index) {
            return Err(duplicate(interface, peers, first, index, "public key"));
        }

        let ips = normalize_allowed_ips(&peer.allowed_ips);
        if !ips.is_empty()
            && let Some(first) = ip_sets.insert(ips, index)
        {
            return Err(duplicate(interface, peers, first, index, "allowed IPs"));
        }
    }
    Ok(())
}

fn duplicate(interface: &str, peers: &[PeerRecord], first: usize, second: usize, what: &str) -> Error {
    let label = |i: usize| {
        peers[i]
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", i + 1))
    };
    Error::DuplicatePeer {
        interface: interface.to_string(),
        message: format!("{} and {} share the same {}", label(first), label(second), what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const KEY_A: &str = "YWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWE=";
    const KEY_B: &str = "YmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmI=";

    #[rstest]
    #[case("wg0", true)]
    #[case("wg_office-1", true)]
    #[case("0wg", false)]
    #[case("wg 0", false)]
    #[case("", false)]
    #[case("averyveryverylong", false)]
    fn interface_names(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(validate_interface_name(name).is_ok(), ok);
    }

    #[rstest]
    #[case("laptop", true)]
    #[case("alice.phone", true)]
    #[case("peer1", true)]
    #[case(".hidden", false)]
    #[case("a/b", false)]
    #[case("wg0", false)]
    fn peer_names(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(validate_peer_name("wg0", name).is_ok(), ok);
    }

    #[rstest]
    #[case("51820", true)]
    #[case("0", false)]
    #[case("65536", false)]
    #[case("abc", false)]
    fn listen_ports(#[case] port: &str, #[case] ok: bool) {
        assert_eq!(validate_listen_port(port).is_ok(), ok);
    }

    #[test]
    fn keepalive_range() {
        assert!(validate_keepalive("0").is_ok());
        assert!(validate_keepalive("25").is_ok());
        assert!(validate_keepalive("-1").is_err());
        assert!(validate_keepalive("70000").is_err());
    }

    #[test]
    fn cidr_lists() {
        assert!(validate_cidr_list("allowed IPs", "10.0.0.2, 10.0.0.0/24, fd00::/64").is_ok());
        assert!(validate_cidr_list("allowed IPs", "10.0.0.0/33").is_err());
        assert!(validate_cidr_list("allowed IPs", "example.com").is_err());
    }

    #[test]
    fn rejects_duplicate_public_keys() {
        let peers = vec![
            PeerRecord::new(KEY_A, "10.0.0.2/32").named("a"),
            PeerRecord::new(KEY_A, "10.0.0.3/32").named("b"),
        ];
        let err = validate_peer_set("wg0", &peers).unwrap_err();
        assert!(matches!(err, Error::DuplicatePeer { .. }));
        assert!(err.to_string().contains("public key"));
    }

    #[test]
    fn rejects_duplicate_allowed_ip_sets() {
        let peers = vec![
            PeerRecord::new(KEY_A, "10.0.0.2").named("a"),
            PeerRecord::new(KEY_B, "10.0.0.2/32").named("b"),
        ];
        let err = validate_peer_set("wg0", &peers).unwrap_err();
        assert!(err.to_string().contains("allowed IPs"));
    }

    #[test]
    fn empty_allowed_ips_may_repeat() {
        let peers = vec![PeerRecord::new(KEY_A, ""), PeerRecord::new(KEY_B, "")];
        assert!(validate_peer_set("wg0", &peers).is_ok());
    }

    #[test]
    fn peer_errors_name_the_peer() {
        let peer = PeerRecord::new("garbage", "10.0.0.2/32").named("laptop");
        let err = validate_peer(&peer).unwrap_err();
        assert!(err.to_string().contains("peer laptop"));
    }
}
