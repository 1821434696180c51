//! Layered configuration.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults,
//! 2. `config.toml`, `config.yaml` and `config.json` in the platform config
//!    directory (e.g. `~/.config/vela/` on Linux),
//! 3. an explicit file passed on the command line,
//! 4. `VELA_`-prefixed environment variables, with `__` separating nested
//!    keys (`VELA_RETRY__MAX_RETRIES=5`).

pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use vela_storage::{DEFAULT_BASE_URL, RetryPolicy, S3Location};

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "VELA_";
const ENV_SEPARATOR: &str = "__";
/// Upper bound on `retry.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub retry: RetryConfig,
    pub resources: ResourcesConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_url: String,
    /// Key prefix applied to every asset path.
    pub prefix: Option<String>,
}
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            prefix: None,
        }
    }
}
impl StorageConfig {
    pub fn location(&self) -> Result<S3Location> {
        S3Location::new(&self.base_url, self.prefix.clone())
            .or_raise(|| ErrorKind::Invalid(format!("storage.base_url: {}", self.base_url)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}
impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}
impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(config.max_retries, Duration::from_millis(config.initial_delay_ms))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Directory of `book{b}-unit{u}-resources.json` modules registered at
    /// start. Without it, modules are read from the bucket.
    pub data_dir: Option<PathBuf>,
    /// Bucket directory holding resource modules.
    pub bucket_prefix: Option<String>,
}

/// A `tracing` filter directive, e.g. `info` or `vela_library=debug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);
impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}
impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Config {
    /// Load from every layer. `explicit`, when given, must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_dir = ProjectDirs::from("com", "Visual English", "vela").map(|dirs| dirs.config_dir().to_path_buf());
        Self::load_layered(user_dir.as_deref(), explicit)
    }

    fn load_layered(user_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = user_dir {
            tracing::debug!(dir = %dir.display(), "Reading user configuration directory");
            figment = figment
                .merge(Toml::file(dir.join("config.toml")))
                .merge(Yaml::file(dir.join("config.yaml")))
                .merge(Json::file(dir.join("config.json")));
        }
        if let Some(path) = explicit {
            figment = merge_file(figment, path)?;
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));

        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            exn::bail!(ErrorKind::Invalid(format!(
                "retry.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.retry.max_retries
            )));
        }
        if self.retry.initial_delay_ms == 0 {
            exn::bail!(ErrorKind::Invalid("retry.initial_delay_ms must be positive".to_string()));
        }
        self.storage.location()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.is_file() {
        exn::bail!(ErrorKind::MissingFile(path.display().to_string()));
    }
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
    };
    Ok(figment)
}
