//! Configuration loading and validation for Conductor.
//!
//! Loads engine configuration from a TOML file with environment variable
//! overrides. All settings are validated at load time: a misconfigured
//! engine fails fast rather than silently defaulting required values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Agent identity settings
    pub agent: AgentSettings,

    /// Generation defaults
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Memory settings
    #[serde(default)]
    pub memory: MemorySettings,

    /// Timeline event bus settings
    #[serde(default)]
    pub events: EventSettings,
}

/// Identity of the agent this engine hosts. There are no defaults for the
/// name and instructions: a missing identity is a configuration failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Agent display name
    pub name: String,

    /// System instructions (always the first assembled message)
    pub instructions: String,

    /// Model identifier handed to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { temperature: default_temperature(), max_tokens: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// How many prior messages to fetch per operation
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_context_limit() -> usize {
    10
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { context_limit: default_context_limit() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Broadcast channel capacity for the timeline bus
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_bus_capacity() -> usize {
    256
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { bus_capacity: default_bus_capacity() }
    }
}

impl EngineConfig {
    /// Load configuration from a file, then apply environment overrides:
    /// - `CONDUCTOR_MODEL` overrides `agent.model`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(model) = std::env::var("CONDUCTOR_MODEL") {
            config.agent.model = Some(model);
        }

        Ok(config)
    }

    /// Load and validate configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Called on every load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("agent.name must not be empty".into()));
        }

        if self.agent.instructions.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.instructions must not be empty".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.context_limit == 0 {
            return Err(ConfigError::ValidationError(
                "memory.context_limit must be at least 1".into(),
            ));
        }

        if self.events.bus_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "events.bus_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Initialize tracing with an env-filter.
///
/// `RUST_LOG` (or `CONDUCTOR_LOG`) takes priority; otherwise `info`, or
/// `debug` when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = std::env::var("CONDUCTOR_LOG")
        .ok()
        .map(tracing_subscriber::EnvFilter::new)
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> EngineConfig {
        EngineConfig {
            agent: AgentSettings {
                name: "assistant".into(),
                instructions: "You are a helpful assistant.".into(),
                model: None,
            },
            generation: GenerationSettings::default(),
            memory: MemorySettings::default(),
            events: EventSettings::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.memory.context_limit, 10);
        assert_eq!(config.events.bus_capacity, 256);
    }

    #[test]
    fn empty_name_fails_validation() {
        let mut config = base_config();
        config.agent.name = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn empty_instructions_fail_validation() {
        let mut config = base_config();
        config.agent.instructions = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_context_limit_fails_validation() {
        let mut config = base_config();
        config.memory.context_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_temperature_fails_validation() {
        let mut config = base_config();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
name = "support-bot"
instructions = "Answer support questions."

[memory]
context_limit = 2
"#
        )
        .unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.agent.name, "support-bot");
        assert_eq!(config.memory.context_limit, 2);
        // Unspecified sections fall back to defaults
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_file_fails_to_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml {{").unwrap();

        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = EngineConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = base_config();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.agent.name, config.agent.name);
    }
}
