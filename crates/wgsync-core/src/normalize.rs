//! Canonical forms of comparable peer fields
//!
//! Normalization is pure and total: malformed input is passed through
//! trimmed, never rejected. Validation lives in [`crate::validation`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A comparable peer field, in diff order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeerField {
    #[serde(rename = "allowedIPs")]
    AllowedIps,
    PublicKey,
    PersistentKeepalive,
    Endpoint,
}

impl PeerField {
    /// Every compared field, in the order diffs report them.
    pub const ALL: [PeerField; 4] = [
        PeerField::AllowedIps,
        PeerField::PublicKey,
        PeerField::PersistentKeepalive,
        PeerField::Endpoint,
    ];

    /// Whether a change to this field alone makes a diff strict.
    pub fn is_strict(self) -> bool {
        !matches!(self, PeerField::Endpoint)
    }

    /// Key used for this field in WireGuard config files.
    pub fn conf_key(self) -> &'static str {
        match self {
            PeerField::AllowedIps => "AllowedIPs",
            PeerField::PublicKey => "PublicKey",
            PeerField::PersistentKeepalive => "PersistentKeepalive",
            PeerField::Endpoint => "Endpoint",
        }
    }
}

impl std::fmt::Display for PeerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.conf_key())
    }
}

/// Normalize a raw field value.
///
/// The public key is returned untouched: key identity is compared raw.
pub fn normalize(field: PeerField, raw: Option<&str>) -> String {
    match field {
        PeerField::AllowedIps => normalize_allowed_ips(raw.unwrap_or("")),
        PeerField::PublicKey => raw.unwrap_or("").to_string(),
        PeerField::PersistentKeepalive => normalize_keepalive(raw),
        PeerField::Endpoint => normalize_scalar(raw),
    }
}

/// Canonical allowed-IP set: host prefixes made explicit, sorted, deduplicated,
/// joined with `,`.
pub fn normalize_allowed_ips(raw: &str) -> String {
    allowed_ip_tokens(raw)
        .map(with_host_prefix)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}

/// Split an allowed-IP list on commas and whitespace, dropping empties.
pub fn allowed_ip_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

fn with_host_prefix(token: &str) -> String {
    if token.contains('/') {
        token.to_string()
    } else if token.contains(':') {
        format!("{}/128", token)
    } else {
        format!("{}/32", token)
    }
}

/// Absent and empty both become `""`; everything else is trimmed.
pub fn normalize_scalar(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or("").to_string()
}

/// `0` and `off` disable keepalive, the same as leaving it unset.
pub fn normalize_keepalive(raw: Option<&str>) -> String {
    match normalize_scalar(raw).as_str() {
        "0" | "off" => String::new(),
        value => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10.0.0.2", "10.0.0.2/32")]
    #[case("10.0.0.5, 10.0.0.2/32", "10.0.0.2/32,10.0.0.5/32")]
    #[case("fd00::2", "fd00::2/128")]
    #[case("  10.0.0.0/24 ,, fd00::/64\n", "10.0.0.0/24,fd00::/64")]
    #[case("", "")]
    #[case(" , ", "")]
    #[case("10.0.0.2, 10.0.0.2/32", "10.0.0.2/32")]
    fn allowed_ips(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_allowed_ips(raw), expected);
    }

    #[test]
    fn bare_and_prefixed_hosts_are_equal() {
        assert_eq!(
            normalize(PeerField::AllowedIps, Some("10.0.0.2")),
            normalize(PeerField::AllowedIps, Some("10.0.0.2/32"))
        );
        assert_eq!(
            normalize(PeerField::AllowedIps, Some("10.0.0.5, 10.0.0.2/32")),
            normalize(PeerField::AllowedIps, Some("10.0.0.2,10.0.0.5"))
        );
    }

    #[test]
    fn malformed_tokens_pass_through() {
        assert_eq!(normalize_allowed_ips("not-an-ip"), "not-an-ip/32");
        assert_eq!(normalize_allowed_ips("10.0.0.0/99"), "10.0.0.0/99");
    }

    #[rstest]
    #[case(None, "")]
    #[case(Some(""), "")]
    #[case(Some("   "), "")]
    #[case(Some(" 203.0.113.5:51820 "), "203.0.113.5:51820")]
    #[case(Some("25"), "25")]
    fn scalars(#[case] raw: Option<&str>, #[case] expected: &str) {
        assert_eq!(normalize(PeerField::Endpoint, raw), expected);
        assert_eq!(normalize(PeerField::PersistentKeepalive, raw), expected);
    }

    #[rstest]
    #[case(Some("0"), "")]
    #[case(Some(" 0 "), "")]
    #[case(Some("off"), "")]
    #[case(Some("25"), "25")]
    fn keepalive_zero_means_unset(#[case] raw: Option<&str>, #[case] expected: &str) {
        assert_eq!(normalize(PeerField::PersistentKeepalive, raw), expected);
    }

    #[test]
    fn endpoint_zero_is_kept() {
        assert_eq!(normalize(PeerField::Endpoint, Some("0")), "0");
    }

    #[test]
    fn public_key_is_not_normalized() {
        assert_eq!(normalize(PeerField::PublicKey, Some(" abc ")), " abc ");
    }

    #[test]
    fn only_endpoint_is_cosmetic() {
        let cosmetic: Vec<_> = PeerField::ALL.iter().filter(|f| !f.is_strict()).collect();
        assert_eq!(cosmetic, vec![&PeerField::Endpoint]);
    }
}
