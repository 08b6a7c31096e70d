//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` format. The synchronizer uses
//! them to tell whether a merged config write actually changed the file.

use sha2::{Digest, Sha256};

use crate::{NormalizedPath, Result, io};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
pub fn compute_content_checksum(content: &str) -> String {
    digest(content.as_bytes())
}

/// Compute the checksum of a file, or `None` when the file does not exist.
pub fn compute_file_checksum(path: &NormalizedPath) -> Result<Option<String>> {
    Ok(io::read_text_opt(path)?.map(|content| compute_content_checksum(&content)))
}

/// True when the file at `path` already holds exactly `content`.
pub fn content_matches(path: &NormalizedPath, content: &str) -> Result<bool> {
    Ok(compute_file_checksum(path)?.as_deref() == Some(compute_content_checksum(content).as_str()))
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_checksum_known_value() {
        assert_eq!(
            compute_content_checksum("hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn missing_file_has_no_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("wg0.conf"));
        assert_eq!(compute_file_checksum(&path).unwrap(), None);
        assert!(!content_matches(&path, "").unwrap());
    }

    #[test]
    fn content_matches_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("wg0.conf"));
        std::fs::write(path.to_native(), "[Interface]\n").unwrap();

        assert!(content_matches(&path, "[Interface]\n").unwrap());
        assert!(!content_matches(&path, "[Interface]\nListenPort = 1\n").unwrap());
    }
}
