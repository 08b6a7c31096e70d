//! WireGuard config file codec
//!
//! Three file shapes share one syntax:
//! - the merged config: one `[Interface]`, any number of `[Peer]` sections
//! - the managed interface file: one `[Interface]`
//! - a managed peer file: an optional `[Interface]` holding only the peer's
//!   own `PrivateKey`, then exactly one `[Peer]`
//!
//! Keys are matched case-insensitively. Unknown keys are kept in `extra` so a
//! read/write cycle loses nothing.

mod parser;
mod writer;

use std::path::Path;

pub use parser::{ConfDocument, ConfSection, SectionKind, parse};
pub use writer::{render_config, render_interface_file, render_peer_file};

use crate::Result;

/// Keys whose values are secret wherever they appear.
pub const SECRET_KEYS: [&str; 2] = ["PrivateKey", "PresharedKey"];

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|s| s.eq_ignore_ascii_case(key.trim()))
}
use crate::model::{InterfaceRecord, PeerRecord, WireGuardConfig};
use parser::invalid;

/// Keys whose repeated occurrences are concatenated into one list.
const LIST_KEYS: [&str; 3] = ["Address", "AllowedIPs", "DNS"];

/// Parse a merged config. Peers carry no name.
pub fn parse_config(interface: &str, text: &str, source: &Path) -> Result<WireGuardConfig> {
    let document = parse(text, source)?;
    let interface = interface_from_sections(interface, &document, source)?;
    let peers = document
        .sections_of(SectionKind::Peer)
        .map(peer_from_section)
        .collect();
    Ok(WireGuardConfig::new(interface, peers))
}

/// Parse a managed interface file.
pub fn parse_interface_file(interface: &str, text: &str, source: &Path) -> Result<InterfaceRecord> {
    let document = parse(text, source)?;
    if let Some(peer) = document.sections_of(SectionKind::Peer).next() {
        return Err(invalid(
            source,
            peer.line,
            "interface file must not contain [Peer] sections",
        ));
    }
    interface_from_sections(interface, &document, source)
}

/// Parse a managed peer file named `name`.
pub fn parse_peer_file(name: &str, text: &str, source: &Path) -> Result<PeerRecord> {
    let document = parse(text, source)?;

    let mut peers = document.sections_of(SectionKind::Peer);
    let section = peers
        .next()
        .ok_or_else(|| invalid(source, 0, "peer file has no [Peer] section"))?;
    if let Some(extra) = peers.next() {
        return Err(invalid(source, extra.line, "peer file holds more than one [Peer] section"));
    }

    let mut peer = peer_from_section(section);
    peer.name = Some(name.to_string());

    for own in document.sections_of(SectionKind::Interface) {
        for (key, value) in &own.entries {
            if key.eq_ignore_ascii_case("PrivateKey") {
                if !value.is_empty() {
                    peer.private_key = Some(value.clone());
                }
            } else {
                return Err(invalid(
                    source,
                    own.line,
                    format!("peer file [Interface] section may only hold PrivateKey, found {}", key),
                ));
            }
        }
    }

    Ok(peer)
}

fn interface_from_sections(name: &str, document: &ConfDocument, source: &Path) -> Result<InterfaceRecord> {
    let mut sections = document.sections_of(SectionKind::Interface);
    let mut record = InterfaceRecord::new(name);
    let Some(section) = sections.next() else {
        return Ok(record);
    };
    if let Some(second) = sections.next() {
        return Err(invalid(source, second.line, "more than one [Interface] section"));
    }

    for (key, value) in &section.entries {
        let slot = match canonical_key(key) {
            Some("Address") => &mut record.address,
            Some("ListenPort") => &mut record.listen_port,
            Some("PrivateKey") => &mut record.private_key,
            Some("DNS") => &mut record.dns,
            Some("PostUp") => &mut record.post_up,
            Some("PostDown") => &mut record.post_down,
            _ => {
                record.extra.push((key.clone(), value.clone()));
                continue;
            }
        };
        if !assign(slot, key, value) {
            record.extra.push((key.clone(), value.clone()));
        }
    }
    Ok(record)
}

fn peer_from_section(section: &ConfSection) -> PeerRecord {
    let mut peer = PeerRecord::default();
    let mut public_key = None;
    let mut allowed_ips = None;

    for (key, value) in &section.entries {
        let slot = match canonical_key(key) {
            Some("PublicKey") => &mut public_key,
            Some("AllowedIPs") => &mut allowed_ips,
            Some("Endpoint") => &mut peer.endpoint,
            Some("PersistentKeepalive") => &mut peer.persistent_keepalive,
            _ => {
                peer.extra.push((key.clone(), value.clone()));
                continue;
            }
        };
        if !assign(slot, key, value) {
            peer.extra.push((key.clone(), value.clone()));
        }
    }

    peer.public_key = public_key.unwrap_or_default();
    peer.allowed_ips = allowed_ips.unwrap_or_default();
    peer
}

/// Store `value` into `slot`. List keys append; a repeated scalar key is
/// refused so the caller can keep it verbatim.
fn assign(slot: &mut Option<String>, key: &str, value: &str) -> bool {
    match slot {
        None => {
            *slot = Some(value.to_string());
            true
        }
        Some(existing) if is_list_key(key) => {
            if existing.is_empty() {
                *existing = value.to_string();
            } else if !value.is_empty() {
                existing.push_str(", ");
                existing.push_str(value);
            }
            true
        }
        Some(_) => false,
    }
}

fn is_list_key(key: &str) -> bool {
    LIST_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn canonical_key(key: &str) -> Option<&'static str> {
    [
        "Address",
        "ListenPort",
        "PrivateKey",
        "DNS",
        "PostUp",
        "PostDown",
        "PublicKey",
        "AllowedIPs",
        "Endpoint",
        "PersistentKeepalive",
    ]
    .into_iter()
    .find(|known| known.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MERGED: &str = "\
[Interface]
Address = 10.0.0.1/24
ListenPort = 51820
PrivateKey = SERVERKEY
MTU = 1420

[Peer]
PublicKey = PUB1
AllowedIPs = 10.0.0.2/32
PresharedKey = PSK

[Peer]
PublicKey = PUB2
AllowedIPs = 10.0.0.3/32
AllowedIPs = fd00::3/128
Endpoint = 203.0.113.9:51820
";

    #[test]
    fn parses_merged_config() {
        let config = parse_config("wg0", MERGED, Path::new("wg0.conf")).unwrap();

        assert_eq!(config.interface.name, "wg0");
        assert_eq!(config.interface.address.as_deref(), Some("10.0.0.1/24"));
        assert_eq!(config.interface.private_key.as_deref(), Some("SERVERKEY"));
        assert_eq!(config.interface.extra, vec![("MTU".to_string(), "1420".to_string())]);

        assert_eq!(config.peers.len(), 2);
        assert_eq!(config.peers[0].name, None);
        assert_eq!(config.peers[0].extra, vec![("PresharedKey".to_string(), "PSK".to_string())]);
        assert_eq!(config.peers[1].allowed_ips, "10.0.0.3/32, fd00::3/128");
        assert_eq!(config.peers[1].endpoint.as_deref(), Some("203.0.113.9:51820"));
    }

    #[test]
    fn merged_config_survives_render_and_parse() {
        let config = parse_config("wg0", MERGED, Path::new("wg0.conf")).unwrap();
        let reparsed = parse_config("wg0", &render_config(&config), Path::new("wg0.conf")).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn parses_peer_file_with_own_key() {
        let text = "[Interface]\nPrivateKey = PEERKEY\n\n[Peer]\nPublicKey = PUB\nAllowedIPs = 10.0.0.2/32\n";
        let peer = parse_peer_file("laptop", text, Path::new("laptop.conf")).unwrap();
        assert_eq!(peer.name.as_deref(), Some("laptop"));
        assert_eq!(peer.private_key.as_deref(), Some("PEERKEY"));
        assert_eq!(peer.public_key, "PUB");
    }

    #[test]
    fn peer_file_needs_exactly_one_peer() {
        let none = parse_peer_file("x", "[Interface]\nPrivateKey = K\n", Path::new("x.conf"));
        assert!(none.is_err());

        let two = parse_peer_file(
            "x",
            "[Peer]\nPublicKey = A\n[Peer]\nPublicKey = B\n",
            Path::new("x.conf"),
        );
        assert!(two.is_err());
    }

    #[test]
    fn peer_file_rejects_foreign_interface_keys() {
        let text = "[Interface]\nAddress = 10.0.0.2/32\n[Peer]\nPublicKey = PUB\n";
        assert!(parse_peer_file("x", text, Path::new("x.conf")).is_err());
    }

    #[test]
    fn interface_file_rejects_peers() {
        let text = "[Interface]\nListenPort = 51820\n[Peer]\nPublicKey = PUB\n";
        assert!(parse_interface_file("wg0", text, Path::new("wg0.conf")).is_err());
    }

    #[test]
    fn repeated_scalar_keys_are_kept_verbatim() {
        let text = "[Interface]\nPostUp = a\nPostUp = b\n";
        let interface = parse_interface_file("wg0", text, Path::new("wg0.conf")).unwrap();
        assert_eq!(interface.post_up.as_deref(), Some("a"));
        assert_eq!(interface.extra, vec![("PostUp".to_string(), "b".to_string())]);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let text = "[peer]\npublickey = PUB\nallowedips = 10.0.0.2\n";
        let config = parse_config("wg0", text, Path::new("wg0.conf")).unwrap();
        assert_eq!(config.peers[0].public_key, "PUB");
        assert_eq!(config.peers[0].allowed_ips, "10.0.0.2");
    }
}
