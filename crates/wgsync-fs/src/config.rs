//! Settings file loading and saving
//!
//! The format follows the file extension: `.toml`, `.json`, `.yaml`/`.yml`.

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{Error, FileMode, NormalizedPath, Result, io};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn of(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("").to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    fn decode<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn encode<T: Serialize>(self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}

/// Loads and saves serde types as settings files.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = Format::of(path)?;
        let content = io::read_text(path)?;
        decode(path, format, &content)
    }

    /// Like [`load`](Self::load), but a missing file yields `T::default()`.
    ///
    /// The extension is checked first, so an unsupported path fails even
    /// when the file does not exist.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, path: &NormalizedPath) -> Result<T> {
        let format = Format::of(path)?;
        match io::read_text_opt(path)? {
            Some(content) => decode(path, format, &content),
            None => {
                debug!(path = %path, "settings file not found, using defaults");
                Ok(T::default())
            }
        }
    }

    /// Write atomically, replacing any existing file.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = Format::of(path)?;
        let content = format.encode(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.label().into(),
            message,
        })?;
        io::write_atomic(path, content.as_bytes(), FileMode::Shared)
    }
}

fn decode<T: DeserializeOwned>(path: &NormalizedPath, format: Format, content: &str) -> Result<T> {
    format.decode(content).map_err(|message| Error::ConfigParse {
        path: path.to_native(),
        format: format.label().into(),
        message,
    })
}
