//! Parser for `wg show <iface> dump`
//!
//! The first line describes the interface:
//! `private-key public-key listen-port fwmark`.
//! Every further line is a peer:
//! `public-key preshared-key endpoint allowed-ips latest-handshake transfer-rx transfer-tx persistent-keepalive`.
//!
//! Sentinels are mapped here so the rest of the crate never sees them:
//! `(none)` endpoints become `None`, `(none)` allowed IPs become `""`,
//! keepalive `off` becomes `None` and a zero handshake becomes `None`.

use chrono::{DateTime, Utc};

use crate::model::{RuntimePeerRecord, RuntimeState};
use crate::{Error, Result};

const NONE: &str = "(none)";
const INTERFACE_FIELDS: usize = 4;
const PEER_FIELDS: usize = 8;

pub fn parse_dump(interface: &str, output: &str) -> Result<RuntimeState> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());

    let mut state = RuntimeState {
        interface: interface.to_string(),
        ..RuntimeState::default()
    };

    let Some(header) = lines.next() else {
        return Err(malformed(interface, 1, "empty output"));
    };
    let fields: Vec<&str> = header.split('\t').collect();
    if fields.len() != INTERFACE_FIELDS {
        return Err(malformed(interface, 1, "expected 4 interface fields"));
    }
    state.public_key = sentinel(fields[1]).map(str::to_string);
    state.listen_port = fields[2].parse().ok().filter(|port| *port != 0);

    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != PEER_FIELDS {
            return Err(malformed(interface, line_no, "expected 8 peer fields"));
        }

        let number = |value: &str, what: &str| {
            value
                .parse::<u64>()
                .map_err(|_| malformed(interface, line_no, &format!("invalid {} '{}'", what, value)))
        };

        let handshake = number(fields[4], "latest handshake")?;
        state.peers.push(RuntimePeerRecord {
            public_key: fields[0].to_string(),
            endpoint: sentinel(fields[2]).map(str::to_string),
            allowed_ips: sentinel(fields[3]).unwrap_or("").replace(',', ", "),
            latest_handshake: handshake_time(handshake),
            transfer_rx: number(fields[5], "transfer rx")?,
            transfer_tx: number(fields[6], "transfer tx")?,
            persistent_keepalive: match fields[7] {
                "off" | "0" | "" => None,
                seconds => Some(seconds.to_string()),
            },
        });
    }

    Ok(state)
}

fn sentinel(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value == NONE {
        None
    } else {
        Some(value)
    }
}

fn handshake_time(seconds: u64) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn malformed(interface: &str, line: usize, message: &str) -> Error {
    Error::upstream(format!(
        "unexpected `wg show {} dump` output at line {}: {}",
        interface, line, message
    ))
}
