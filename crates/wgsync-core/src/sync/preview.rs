//! Text previews of merged configs

use similar::TextDiff;

use crate::conf::is_secret_key;
use crate::diff::REDACTED;

/// Replace secret values in config text with a placeholder.
///
/// Commented-out assignments (`# PrivateKey = ...`) are redacted too.
pub fn redact_secrets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        match line.split_once('=') {
            Some((key, _)) if is_secret_key(key.trim_start().trim_start_matches(['#', ';'])) => {
                out.push_str(key.trim_end());
                out.push_str(" = ");
                out.push_str(REDACTED);
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Unified diff between two config texts, secrets redacted. Empty when equal.
pub fn unified_diff(interface: &str, current: &str, pending: &str) -> String {
    let current = redact_secrets(current);
    let pending = redact_secrets(pending);
    if current == pending {
        return String::new();
    }

    TextDiff::from_lines(&current, &pending)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{}.conf (current)", interface), &format!("{}.conf (pending)", interface))
        .to_string()
}
