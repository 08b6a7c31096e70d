//! Rendering of config sections
//!
//! Entries with an empty value are not written.

use crate::model::{InterfaceRecord, PeerRecord, WireGuardConfig};

use super::SectionKind;

/// Text of a merged config: the interface section, then every peer.
///
/// Peer names and peer private keys never appear in the output.
pub fn render_config(config: &WireGuardConfig) -> String {
    let mut out = String::new();
    push_section(&mut out, SectionKind::Interface, &interface_entries(&config.interface));
    for peer in &config.peers {
        out.push('\n');
        push_section(&mut out, SectionKind::Peer, &peer_entries(peer));
    }
    out
}

/// Text of a managed interface file.
pub fn render_interface_file(interface: &InterfaceRecord) -> String {
    let mut out = String::new();
    push_section(&mut out, SectionKind::Interface, &interface_entries(interface));
    out
}

/// Text of a managed peer file. A server-generated private key is kept in a
/// leading `[Interface]` section.
pub fn render_peer_file(peer: &PeerRecord) -> String {
    let mut out = String::new();
    if let Some(private_key) = non_empty(peer.private_key.as_deref()) {
        push_section(&mut out, SectionKind::Interface, &[("PrivateKey", private_key)]);
        out.push('\n');
    }
    push_section(&mut out, SectionKind::Peer, &peer_entries(peer));
    out
}

fn interface_entries(interface: &InterfaceRecord) -> Vec<(&str, &str)> {
    let mut entries = Vec::new();
    let known = [
        ("Address", interface.address.as_deref()),
        ("ListenPort", interface.listen_port.as_deref()),
        ("PrivateKey", interface.private_key.as_deref()),
        ("DNS", interface.dns.as_deref()),
        ("PostUp", interface.post_up.as_deref()),
        ("PostDown", interface.post_down.as_deref()),
    ];
    for (key, value) in known {
        if let Some(value) = non_empty(value) {
            entries.push((key, value));
        }
    }
    push_extra(&mut entries, &interface.extra);
    entries
}

fn peer_entries(peer: &PeerRecord) -> Vec<(&str, &str)> {
    let mut entries = Vec::new();
    let known = [
        ("PublicKey", Some(peer.public_key.as_str())),
        ("AllowedIPs", Some(peer.allowed_ips.as_str())),
        ("Endpoint", peer.endpoint.as_deref()),
        ("PersistentKeepalive", peer.persistent_keepalive.as_deref()),
    ];
    for (key, value) in known {
        if let Some(value) = non_empty(value) {
            entries.push((key, value));
        }
    }
    push_extra(&mut entries, &peer.extra);
    entries
}

fn push_extra<'a>(entries: &mut Vec<(&'a str, &'a str)>, extra: &'a [(String, String)]) {
    for (key, value) in extra {
        if !value.trim().is_empty() {
            entries.push((key.as_str(), value.as_str()));
        }
    }
}

fn push_section(out: &mut String, kind: SectionKind, entries: &[(&str, &str)]) {
    out.push_str(kind.header());
    out.push('\n');
    for (key, value) in entries {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(value.trim());
        out.push('\n');
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_merged_config_without_peer_secrets() {
        let mut interface = InterfaceRecord::new("wg0");
        interface.address = Some("10.0.0.1/24".into());
        interface.listen_port = Some("51820".into());
        interface.private_key = Some("SERVERKEY".into());

        let peer = PeerRecord::new("PUB", "10.0.0.2/32")
            .named("laptop")
            .with_private_key("PEERKEY")
            .with_keepalive("25");

        let text = render_config(&WireGuardConfig::new(interface, vec![peer]));
        assert_eq!(
            text,
            "[Interface]\nAddress = 10.0.0.1/24\nListenPort = 51820\nPrivateKey = SERVERKEY\n\n\
             [Peer]\nPublicKey = PUB\nAllowedIPs = 10.0.0.2/32\nPersistentKeepalive = 25\n"
        );
        assert!(!text.contains("PEERKEY"));
        assert!(!text.contains("laptop"));
    }

    #[test]
    fn peer_file_keeps_private_key_in_interface_section() {
        let peer = PeerRecord::new("PUB", "10.0.0.2/32").with_private_key("PEERKEY");
        assert_eq!(
            render_peer_file(&peer),
            "[Interface]\nPrivateKey = PEERKEY\n\n[Peer]\nPublicKey = PUB\nAllowedIPs = 10.0.0.2/32\n"
        );
    }

    #[test]
    fn empty_values_are_skipped() {
        let mut peer = PeerRecord::new("PUB", "10.0.0.2/32").with_endpoint("");
        peer.extra.push(("PresharedKey".into(), "PSK".into()));
        peer.extra.push(("Comment".into(), " ".into()));
        assert_eq!(
            render_peer_file(&peer),
            "[Peer]\nPublicKey = PUB\nAllowedIPs = 10.0.0.2/32\nPresharedKey = PSK\n"
        );
    }
}
