//! Line parser for WireGuard config files

use std::path::Path;

use crate::{Error, Result};

/// Section header kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Interface,
    Peer,
}

impl SectionKind {
    pub fn header(self) -> &'static str {
        match self {
            Self::Interface => "[Interface]",
            Self::Peer => "[Peer]",
        }
    }
}

/// One `[Interface]` or `[Peer]` block with its entries in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfSection {
    pub kind: SectionKind,
    /// 1-based line of the header.
    pub line: usize,
    pub entries: Vec<(String, String)>,
}

impl ConfSection {
    pub fn new(kind: SectionKind, line: usize) -> Self {
        Self {
            kind,
            line,
            entries: Vec::new(),
        }
    }
}

/// A parsed config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfDocument {
    pub sections: Vec<ConfSection>,
}

impl ConfDocument {
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &ConfSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }
}

/// Parse config text.
///
/// Blank lines and `#` comments are skipped. Every other line is a section
/// header or a `Key = Value` pair split on the first `=`. `source` is only
/// used in error messages.
pub fn parse(text: &str, source: &Path) -> Result<ConfDocument> {
    let mut document = ConfDocument::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let kind = parse_header(line)
                .ok_or_else(|| invalid(source, line_no, format!("unknown section {}", line)))?;
            document.sections.push(ConfSection::new(kind, line_no));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(invalid(source, line_no, "expected 'Key = Value'"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid(source, line_no, "empty key"));
        }

        let Some(section) = document.sections.last_mut() else {
            return Err(invalid(source, line_no, format!("'{}' appears before any section", key)));
        };
        section.entries.push((key.to_string(), value.trim().to_string()));
    }

    Ok(document)
}

fn parse_header(line: &str) -> Option<SectionKind> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if name.eq_ignore_ascii_case("interface") {
        Some(SectionKind::Interface)
    } else if name.eq_ignore_ascii_case("peer") {
        Some(SectionKind::Peer)
    } else {
        None
    }
}

pub(crate) fn invalid(source: &Path, line: usize, message: impl Into<String>) -> Error {
    Error::InvalidConf {
        path: source.to_path_buf(),
        line,
        message: message.into(),
    }
}
