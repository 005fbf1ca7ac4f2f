use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default separator class: whitespace, period, comma and semicolon.
pub const DEFAULT_SEPARATORS: &str = r"[.,;\s]";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read emoticon catalog at {catalog_path}: {source}")]
    CatalogReadError {
        catalog_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse emoticon catalog at {catalog_path}: {source}")]
    CatalogParseError {
        catalog_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Regex character class of characters allowed around a match
    pub separators: String,
    /// TOML table of `text = "unified-id"` entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoticon_catalog: Option<PathBuf>,
    /// Link patterns, tried in order. Empty means the built-in URL matcher.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkPattern>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separators: DEFAULT_SEPARATORS.to_string(),
            emoticon_catalog: None,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPattern {
    pub pattern: String,
    /// Prepended to the matched text to form the URL, e.g. `mailto:`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl LinkPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            url_prefix: None,
            rel: None,
            target: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the catalog path
        config.emoticon_catalog = config
            .emoticon_catalog
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/autolinker");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Load the configured emoticon catalog, if any
    pub fn emoticons(&self) -> Result<Option<EmoticonCatalog>, ConfigError> {
        self.emoticon_catalog
            .as_deref()
            .map(EmoticonCatalog::load_from_path)
            .transpose()
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Emoticon text to unified emoji id, e.g. `":)" = "1f642"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmoticonCatalog {
    pub entries: BTreeMap<String, String>,
}

impl EmoticonCatalog {
    pub fn load_from_path<P: AsRef<Path>>(catalog_path: P) -> Result<Self, ConfigError> {
        let catalog_path = catalog_path.as_ref();
        let content = std::fs::read_to_string(catalog_path).map_err(|source| {
            ConfigError::CatalogReadError {
                catalog_path: catalog_path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::CatalogParseError {
            catalog_path: catalog_path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
