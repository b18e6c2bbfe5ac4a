//! Configuration file support and credential snapshot.
//!
//! Settings are read from `~/.crewgen/config.toml`, then `./.crewgenrc`
//! (local overrides global), then `CREWGEN_*` environment variables.

use crewgen_models::{ProviderKind, BASELINE_MODEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the default provider.
pub const ENV_PROVIDER: &str = "CREWGEN_PROVIDER";
/// Environment variable overriding the default model.
pub const ENV_MODEL: &str = "CREWGEN_MODEL";
/// Environment variable overriding the output directory.
pub const ENV_OUTPUT_DIR: &str = "CREWGEN_OUTPUT_DIR";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Generation defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider used when a request names none.
    #[serde(default)]
    pub default_provider: Option<String>,

    /// Model used when a request names none.
    #[serde(default)]
    pub default_model: Option<String>,

    /// Root of the per-session output trees.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Session retention bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Maximum number of sessions kept.
    #[serde(default)]
    pub capacity: Option<usize>,

    /// How long a finished session stays queryable, in seconds.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

/// crewgen configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewgenConfig {
    /// Generation defaults.
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Session retention.
    #[serde(default)]
    pub registry: RegistrySettings,
}

impl CrewgenConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".crewgen").join("config.toml")
    }

    /// Default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".crewgenrc")
    }

    /// Discover and load configuration files, then apply environment overrides.
    ///
    /// Missing files are skipped; a file that exists but cannot be parsed is
    /// an error.
    pub fn discover_and_load() -> ConfigResult<Self> {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(layer) => config.merge(&layer),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        let generation = &other.generation;
        if let Some(ref provider) = generation.default_provider {
            self.generation.default_provider = Some(provider.clone());
        }
        if let Some(ref model) = generation.default_model {
            self.generation.default_model = Some(model.clone());
        }
        if let Some(ref output_dir) = generation.output_dir {
            self.generation.output_dir = Some(output_dir.clone());
        }
        if let Some(capacity) = other.registry.capacity {
            self.registry.capacity = Some(capacity);
        }
        if let Some(ttl_secs) = other.registry.ttl_secs {
            self.registry.ttl_secs = Some(ttl_secs);
        }
    }

    /// Applies `CREWGEN_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(provider) = lookup(ENV_PROVIDER) {
            self.generation.default_provider = Some(provider);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.generation.default_model = Some(model);
        }
        if let Some(output_dir) = lookup(ENV_OUTPUT_DIR) {
            self.generation.output_dir = Some(PathBuf::from(output_dir));
        }
    }

    /// The configured default provider.
    pub fn provider(&self) -> ConfigResult<ProviderKind> {
        self.generation.default_provider.as_deref().map_or(Ok(ProviderKind::Gemini), |id| {
            id.parse().map_err(|e| ConfigError::InvalidValue(format!("default_provider: {e}")))
        })
    }

    /// The configured default model.
    pub fn model(&self) -> &str {
        self.generation.default_model.as_deref().unwrap_or(BASELINE_MODEL)
    }

    /// Root of the per-session output trees.
    pub fn output_dir(&self) -> PathBuf {
        self.generation.output_dir.clone().unwrap_or_else(|| std::env::temp_dir().join("crewgen"))
    }

    /// Retention time for finished sessions.
    pub fn ttl(&self) -> Option<Duration> {
        self.registry.ttl_secs.map(Duration::from_secs)
    }
}

/// Immutable snapshot of provider credentials.
///
/// Taken once at start-up; nothing in the pipeline reads the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every provider's credential from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads every provider's credential through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        ProviderKind::ALL.into_iter().fold(Self::new(), |credentials, kind| {
            match lookup(kind.spec().credential_env) {
                Some(key) => credentials.with(kind, key),
                None => credentials,
            }
        })
    }

    /// Returns a snapshot that also holds `key` for `kind`. Blank keys are ignored.
    #[must_use]
    pub fn with(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.keys.insert(kind, key);
        }
        self
    }

    /// The credential for `kind`, if configured.
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    /// Whether a credential for `kind` is configured.
    pub fn has(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let configured: Vec<&str> =
            ProviderKind::ALL.iter().filter(|kind| self.has(**kind)).map(|kind| kind.id()).collect();
        f.debug_struct("Credentials").field("configured", &configured).finish()
    }
}
