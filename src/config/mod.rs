//! Engine configuration with layered resolution.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied by the binaries via [`CliOverrides`])
//! 2. Environment variables (`RECOMMEND_TOP_N`, `RECOMMEND_CURRENT_YEAR`)
//! 3. An explicit config file passed on the command line
//! 4. User config (`<config_dir>/researcher-recommend/config.toml`)
//! 5. Compiled defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::scoring::ScoringWeights;
use crate::similarity::SimilarityConfig;

/// Default number of researchers returned per query.
pub const DEFAULT_TOP_N: usize = 5;

const ENV_TOP_N: &str = "RECOMMEND_TOP_N";
const ENV_CURRENT_YEAR: &str = "RECOMMEND_CURRENT_YEAR";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Request defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommendDefaults {
    pub default_top_n: usize,

    /// Reference year for recency; `None` means the wall-clock year
    pub current_year: Option<i32>,
}

impl Default for RecommendDefaults {
    fn default() -> Self {
        Self {
            default_top_n: DEFAULT_TOP_N,
            current_year: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub similarity: SimilarityConfig,
    pub recommend: RecommendDefaults,
}

/// Values the command line may override.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub top_n: Option<usize>,
    pub current_year: Option<i32>,
}

impl EngineConfig {
    /// Resolve configuration from every layer and validate the result.
    pub fn load(explicit: Option<&Path>, cli: &CliOverrides) -> ConfigResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::user_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env_overrides();

        if let Some(top_n) = cli.top_n {
            config.recommend.default_top_n = top_n;
        }
        if let Some(year) = cli.current_year {
            config.recommend.current_year = Some(year);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a TOML string. Unknown keys are ignored.
    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// `<config_dir>/researcher-recommend/config.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("researcher-recommend").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(ENV_TOP_N) {
            match raw.parse() {
                Ok(n) => self.recommend.default_top_n = n,
                Err(_) => warn!(value = %raw, "ignoring unparsable {}", ENV_TOP_N),
            }
        }
        if let Ok(raw) = std::env::var(ENV_CURRENT_YEAR) {
            match raw.parse() {
                Ok(y) => self.recommend.current_year = Some(y),
                Err(_) => warn!(value = %raw, "ignoring unparsable {}", ENV_CURRENT_YEAR),
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(field) = self.scoring.invalid_field() {
            return Err(ConfigError::Validation {
                field: format!("scoring.{}", field),
                message: "must be finite and non-negative".to_string(),
            });
        }
        if self.similarity.max_features == 0 {
            return Err(ConfigError::Validation {
                field: "similarity.max_features".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.recommend.default_top_n == 0 {
            return Err(ConfigError::Validation {
                field: "recommend.default_top_n".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
