//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/codetree/codetree.toml`
//! 3. Local config: `<dir>/.codetree.toml` (working directory by default)
//! 4. Environment variables: `CODETREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Root-code cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of cached entries
    pub capacity: usize,
    /// Seconds an entry lives after its last write
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 500,
            ttl_secs: 600,
        }
    }
}

/// Raw cache config for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCacheSettings {
    pub capacity: Option<usize>,
    pub ttl_secs: Option<u64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub page_size: Option<usize>,
    #[serde(default)]
    pub cache: RawCacheSettings,
}

/// Unified configuration for codetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// TOML file holding the code store (default: ~/.codetree/codes.toml)
    pub data_file: PathBuf,
    /// Page size for list commands when none is given
    pub page_size: usize,
    /// Cache bounds
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            page_size: 10,
            cache: CacheSettings::default(),
        }
    }
}

/// Get the default data file (~/.codetree/codes.toml).
fn default_data_file() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".codetree").join("codes.toml"))
        .unwrap_or_else(|| PathBuf::from("~/.codetree/codes.toml"))
}

/// Get the XDG config directory for codetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "codetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("codetree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".codetree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in the data file path.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_file.to_string_lossy().as_ref());
        self.data_file = PathBuf::from(expanded);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            page_size: overlay.page_size.unwrap_or(self.page_size),
            cache: CacheSettings {
                capacity: overlay.cache.capacity.unwrap_or(self.cache.capacity),
                ttl_secs: overlay.cache.ttl_secs.unwrap_or(self.cache.ttl_secs),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.codetree.toml` (None skips the local layer)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply CODETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CODETREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("page_size") {
            settings.page_size = to_usize("page_size", val)?;
        }
        if let Ok(val) = config.get_int("cache.capacity") {
            settings.cache.capacity = to_usize("cache.capacity", val)?;
        }
        if let Ok(val) = config.get_int("cache.ttl_secs") {
            settings.cache.ttl_secs = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("cache.ttl_secs must not be negative: {val}"),
            })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.page_size == 0 {
            return Err(ApplicationError::Config {
                message: "page_size must be at least 1".into(),
            });
        }
        if self.cache.capacity == 0 {
            return Err(ApplicationError::Config {
                message: "cache.capacity must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# codetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/codetree/codetree.toml
#   Local:  ./.codetree.toml
#   Env:    CODETREE_* environment variables (CODETREE_CACHE__TTL_SECS=60)

# Code store file
# data_file = "~/.codetree/codes.toml"

# Default page size for `codetree list`
# page_size = 10

[cache]
# Maximum number of cached root codes
# capacity = 500

# Seconds a cached root lives after it was last written
# ttl_secs = 600
"#
        .to_string()
    }
}

fn to_usize(field: &str, val: i64) -> Result<usize, ApplicationError> {
    usize::try_from(val).map_err(|_| ApplicationError::Config {
        message: format!("{field} must not be negative: {val}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
