//! Configuration for the commission tracker

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Which backend holds staff and entries
#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Hosted backend settings (required when backend = "rest")
    #[serde(default)]
    pub rest: Option<RestConfig>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local SQLite file in the data directory
    #[default]
    Sqlite,
    /// Hosted PostgREST backend
    Rest,
}

/// Hosted backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    /// Project URL, e.g. https://abc.example.co
    pub url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Signed-in user's access token (falls back to the API key)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Owner id stamped on inserted rows
    #[serde(default)]
    pub user_id: Option<String>,
}

/// CSV export settings
#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_file_prefix() -> String {
    constants::EXPORT_FILE_PREFIX.to_string()
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - backend values other than \"sqlite\" or \"rest\"\n\
             - A [store.rest] section missing url or api_key\n\n\
             See config.toml.example for the expected format."
        })
    }

    /// Load the file if it exists, otherwise use local defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Resolved settings the CLI runs with
#[derive(Debug)]
pub struct Config {
    pub backend: Backend,
    pub rest: Option<RestConfig>,
    /// SQLite ledger path (used when backend = sqlite)
    pub ledger_path: PathBuf,
    pub export_prefix: String,
}

impl Config {
    /// Combine the file config with the data directory from the command line
    pub fn from_file(file_config: FileConfig, data_dir: &Path) -> Result<Self> {
        let backend = file_config.store.backend;

        if backend == Backend::Rest && file_config.store.rest.is_none() {
            anyhow::bail!(
                "backend = \"rest\" requires a [store.rest] section with url and api_key"
            );
        }

        Ok(Self {
            backend,
            rest: file_config.store.rest,
            ledger_path: data_dir.join(constants::LEDGER_FILENAME),
            export_prefix: file_config.export.file_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults_to_sqlite() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config.store.backend, Backend::Sqlite);
        assert!(config.store.rest.is_none());
        assert_eq!(config.export.file_prefix, "commissions");
    }

    #[test]
    fn test_rest_config() {
        let config = FileConfig::parse(
            r#"
            [store]
            backend = "rest"

            [store.rest]
            url = "https://salon.example.co"
            api_key = "anon-key"
            user_id = "owner-1"

            [export]
            file_prefix = "kimmys_commissions"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, Backend::Rest);
        let rest = config.store.rest.as_ref().unwrap();
        assert_eq!(rest.url, "https://salon.example.co");
        assert_eq!(rest.access_token, None);
        assert_eq!(rest.user_id.as_deref(), Some("owner-1"));

        let runtime = Config::from_file(config, Path::new("./data")).unwrap();
        assert_eq!(runtime.export_prefix, "kimmys_commissions");
        assert_eq!(runtime.ledger_path, Path::new("./data").join("ledger.sqlite"));
    }

    #[test]
    fn test_rest_backend_requires_section() {
        let config = FileConfig::parse("[store]\nbackend = \"rest\"\n").unwrap();
        assert!(Config::from_file(config, Path::new("./data")).is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(FileConfig::parse("[store]\nbackend = \"mongo\"\n").is_err());
    }
}
