//! Engine and session configuration.
//!
//! `EngineConfig` is loaded from YAML (every key optional), then adjusted by
//! `EQCOACH_*` environment overrides, then validated:
//!
//! ```yaml
//! scoring:
//!   passing_threshold: 70
//!   weights: { warmth: 1.5, empathy: 1.5 }
//! blend: { primary: 0.7, secondary: 0.3 }
//! correction: { max_attempts: 3, min_score: 70, rewrite_timeout_ms: 15000 }
//! signals: { refiner_timeout_ms: 5000 }
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionalState;
use crate::errors::{ConfigError, ValidationError};
use crate::quality::{CorrectionConfig, ScoringConfig};
use crate::tone::BlendWeights;

/// Path of a YAML file to load before applying overrides.
pub const ENV_CONFIG_PATH: &str = "EQCOACH_CONFIG";
pub const ENV_MIN_SCORE: &str = "EQCOACH_MIN_SCORE";
pub const ENV_MAX_ATTEMPTS: &str = "EQCOACH_MAX_ATTEMPTS";
pub const ENV_PASSING_THRESHOLD: &str = "EQCOACH_PASSING_THRESHOLD";
pub const ENV_REWRITE_TIMEOUT_MS: &str = "EQCOACH_REWRITE_TIMEOUT_MS";
pub const ENV_REFINER_TIMEOUT_MS: &str = "EQCOACH_REFINER_TIMEOUT_MS";

pub const DEFAULT_REFINER_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub refiner_timeout_ms: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            refiner_timeout_ms: DEFAULT_REFINER_TIMEOUT_MS,
        }
    }
}

impl SignalConfig {
    pub fn refiner_timeout(&self) -> Duration {
        Duration::from_millis(self.refiner_timeout_ms)
    }
}

/// Everything the coaching engine needs besides its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub blend: BlendWeights,
    pub correction: CorrectionConfig,
    pub signals: SignalConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Defaults with `EQCOACH_*` overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// YAML from `EQCOACH_CONFIG` (when set), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG_PATH) {
            Some(path) => {
                log::info!("[Config] loading engine config from {path}");
                serde_yaml::from_str(&std::fs::read_to_string(&path)?)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_env(&lookup, ENV_MIN_SCORE)? {
            self.correction.min_score = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_MAX_ATTEMPTS)? {
            self.correction.max_attempts = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_PASSING_THRESHOLD)? {
            self.scoring.passing_threshold = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_REWRITE_TIMEOUT_MS)? {
            self.correction.rewrite_timeout_ms = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_REFINER_TIMEOUT_MS)? {
            self.signals.refiner_timeout_ms = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.scoring.validate()?;
        self.correction.validate()?;
        for (name, weight) in [
            ("primary", self.blend.primary),
            ("secondary", self.blend.secondary),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::InvalidConfig {
                    message: format!("blend.{name} must be within 0..=1, got {weight}"),
                });
            }
        }
        Ok(())
    }
}

fn parse_env<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { name, value: raw }),
    }
}

/// Options for starting a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Generated (UUID v4) when absent.
    pub session_id: Option<String>,
    pub coach_id: Option<String>,
    pub student_id: Option<String>,
    pub initial_emotional: Option<EmotionalState>,
    /// Defaults to the catalog's entry step.
    pub start_step: Option<String>,
}

impl SessionConfig {
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_participants(
        mut self,
        coach_id: impl Into<String>,
        student_id: impl Into<String>,
    ) -> Self {
        self.coach_id = Some(coach_id.into());
        self.student_id = Some(student_id.into());
        self
    }
}
