//! `certum.toml`: node configuration with a default for every field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use certum_core::Identity;
use certum_metadata::ResolverConfig;

/// Full configuration for the Certum node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CertumConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Metadata resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Request authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; the registry database lives in `<data_dir>/registry`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryConfig {
    /// Identity allowed to issue and revoke. Fixed once the registry exists.
    #[serde(default)]
    pub authority: Option<Identity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Maximum distance between a signed request's timestamp and server time.
    #[serde(default = "default_max_clock_skew_secs")]
    pub max_clock_skew_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9001
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_clock_skew_secs() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_clock_skew_secs: default_max_clock_skew_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CertumConfig {
    /// Read `path`, or return the defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CertumConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Directory holding the registry database.
    pub fn registry_path(&self) -> PathBuf {
        self.storage.data_dir.join("registry")
    }

    /// The configured authority, which must be set before the node starts.
    pub fn authority(&self) -> anyhow::Result<Identity> {
        self.registry.authority.ok_or_else(|| {
            anyhow::anyhow!(
                "registry.authority is not set; generate a key with `certum keygen` and put its address in the config"
            )
        })
    }

    /// The API listen address as `host:port`.
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }
}
