//! Configuration management
//!
//! Loads the optional `musefed.toml`, fills gaps from `defaults.rs`, and
//! resolves where each adapter keeps its raw dump and its built store.

mod defaults;

pub use defaults::*;

use crate::adapters::AdapterKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File name looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "musefed.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding raw dumps and built stores
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Per-institution settings
    #[serde(default)]
    pub museums: MuseumsConfig,

    /// Loader settings
    #[serde(default)]
    pub etl: EtlConfig,

    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Image URL validator settings
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Where this config was read from, if anywhere
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

/// Settings for every known institution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuseumsConfig {
    #[serde(default)]
    pub aic: MuseumConfig,

    #[serde(default)]
    pub cleveland: MuseumConfig,

    #[serde(default)]
    pub nga: MuseumConfig,
}

impl MuseumsConfig {
    pub fn get(&self, kind: AdapterKind) -> &MuseumConfig {
        match kind {
            AdapterKind::Aic => &self.aic,
            AdapterKind::Cleveland => &self.cleveland,
            AdapterKind::Nga => &self.nga,
        }
    }

    pub fn get_mut(&mut self, kind: AdapterKind) -> &mut MuseumConfig {
        match kind {
            AdapterKind::Aic => &mut self.aic,
            AdapterKind::Cleveland => &mut self.cleveland,
            AdapterKind::Nga => &mut self.nga,
        }
    }
}

/// Settings for one institution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuseumConfig {
    /// Whether the adapter is registered for federated search
    #[serde(default = "default_museum_enabled")]
    pub enabled: bool,

    /// Explicit store location (overrides the data_dir layout)
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Explicit raw dump location (overrides the data_dir layout)
    #[serde(default)]
    pub source_path: Option<PathBuf>,
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Records committed per transaction
    #[serde(default = "default_etl_batch_size")]
    pub batch_size: usize,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size used when the command line gives none
    #[serde(default = "default_search_limit")]
    pub default_limit: u32,

    /// Largest page size accepted from the command line
    #[serde(default = "default_search_max_limit")]
    pub max_limit: u32,
}

/// Image URL validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// HEAD requests in flight per chunk
    #[serde(default = "default_validator_concurrency")]
    pub concurrency: usize,

    /// Pause between chunks in milliseconds
    #[serde(default = "default_validator_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_validator_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_validator_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            museums: MuseumsConfig::default(),
            etl: EtlConfig::default(),
            search: SearchConfig::default(),
            validator: ValidatorConfig::default(),
            config_file: None,
        }
    }
}

impl Default for MuseumConfig {
    fn default() -> Self {
        Self {
            enabled: default_museum_enabled(),
            db_path: None,
            source_path: None,
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_etl_batch_size(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_search_max_limit(),
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_validator_concurrency(),
            delay_ms: default_validator_delay_ms(),
            timeout_ms: default_validator_timeout_ms(),
            user_agent: default_validator_user_agent(),
        }
    }
}

impl ValidatorConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, else `musefed.toml` if present, else defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::load(fallback)
        } else {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Store location for an adapter: `MUSEFED_<ID>_DB`, then config, then
    /// `<data_dir>/<id>/<id>.sqlite`
    pub fn db_path(&self, kind: AdapterKind) -> PathBuf {
        self.db_path_with(kind, |name| std::env::var(name).ok())
    }

    /// Raw dump location for an adapter: `MUSEFED_<ID>_SOURCE`, then config,
    /// then the adapter's conventional layout under `<data_dir>/<id>/`
    pub fn source_path(&self, kind: AdapterKind) -> PathBuf {
        self.source_path_with(kind, |name| std::env::var(name).ok())
    }

    fn db_path_with(&self, kind: AdapterKind, env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(path) = env(&format!("MUSEFED_{}_DB", kind.env_key())) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.museums.get(kind).db_path {
            return path.clone();
        }
        self.data_dir
            .join(kind.id())
            .join(format!("{}.sqlite", kind.id()))
    }

    fn source_path_with(
        &self,
        kind: AdapterKind,
        env: impl Fn(&str) -> Option<String>,
    ) -> PathBuf {
        if let Some(path) = env(&format!("MUSEFED_{}_SOURCE", kind.env_key())) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.museums.get(kind).source_path {
            return path.clone();
        }
        self.data_dir
            .join(kind.id())
            .join(kind.default_source_layout())
    }

    /// Adapters switched on in `[museums]`
    pub fn enabled_adapters(&self) -> Vec<AdapterKind> {
        AdapterKind::ALL
            .into_iter()
            .filter(|kind| self.museums.get(*kind).enabled)
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.etl.batch_size == 0 {
            return Err(Error::Config("etl.batch_size must be positive".to_string()));
        }

        if self.search.max_limit == 0 {
            return Err(Error::Config(
                "search.max_limit must be positive".to_string(),
            ));
        }

        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(Error::Config(
                "search.default_limit must be between 1 and search.max_limit".to_string(),
            ));
        }

        if self.validator.concurrency == 0 {
            return Err(Error::Config(
                "validator.concurrency must be positive".to_string(),
            ));
        }

        if self.validator.timeout_ms == 0 {
            return Err(Error::Config(
                "validator.timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
