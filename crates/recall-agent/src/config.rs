//! Agent configuration loading from file and environment variables.

use recall_memory::MemoryConfig;
use recall_voice::{CoordinatorConfig, PipelineConfig, DEFAULT_GREETING, DEFAULT_INSTRUCTIONS};
use serde::Deserialize;
use thiserror::Error;

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Session identity and engine selection.
    #[serde(default)]
    pub session: SessionConfig,

    /// Remote memory store.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Memory refresh tunables.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// STT/LLM/TTS/VAD providers.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How session events reach the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Interactive text session on stdin/stdout, replies from the LLM provider.
    #[default]
    Console,
    /// JSON-lines events from an external session engine on stdin;
    /// instruction updates written to stdout.
    Bridge,
}

/// Session identity and behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: SessionMode,

    /// Room name. Used as the user id; empty means `default_user`.
    #[serde(default)]
    pub room: String,

    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Base system prompt, before memories are appended.
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Instructions for the opening reply. Empty disables the greeting.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// How long to wait for the final memory submission on shutdown.
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "recall_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_agent_id() -> String {
    "voice_assistant_001".to_string()
}

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_shutdown_grace_seconds() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::default(),
            room: String::new(),
            agent_id: default_agent_id(),
            instructions: default_instructions(),
            greeting: default_greeting(),
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Checks values that would make the coordinator misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.flush_threshold == 0 {
            return Err(ConfigError::Invalid(
                "coordinator.flush_threshold must be at least 1".to_string(),
            ));
        }
        if self.coordinator.retrieve_attempts == 0 {
            return Err(ConfigError::Invalid(
                "coordinator.retrieve_attempts must be at least 1".to_string(),
            ));
        }
        if self.memory.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "memory.request_timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.session.agent_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "session.agent_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `OPENAI_APIKEY` overrides `pipeline.llm.api_key`
/// - `BASE_URL` overrides `pipeline.llm.base_url`
/// - `MEMU_API_KEY` overrides `memory.api_key`
/// - `MEMU_BASE_URL` overrides `memory.base_url`
/// - `DEEPGRAM_API_KEY` overrides `pipeline.stt.api_key`
/// - `RECALL_ROOM` overrides `session.room`
/// - `RECALL_AGENT_ID` overrides `session.agent_id`
/// - `RECALL_SESSION_MODE` overrides `session.mode` (`console` or `bridge`)
/// - `RECALL_LOG_LEVEL` overrides `logging.level`
/// - `RECALL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Applies environment overrides read through `var`.
pub fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(key) = var("OPENAI_APIKEY") {
        config.pipeline.llm.api_key = key;
    }
    if let Some(url) = var("BASE_URL").filter(|v| !v.trim().is_empty()) {
        config.pipeline.llm.base_url = url;
    }
    if let Some(key) = var("MEMU_API_KEY") {
        config.memory.api_key = key;
    }
    if let Some(url) = var("MEMU_BASE_URL").filter(|v| !v.trim().is_empty()) {
        config.memory.base_url = url;
    }
    if let Some(key) = var("DEEPGRAM_API_KEY") {
        config.pipeline.stt.api_key = key;
    }
    if let Some(room) = var("RECALL_ROOM") {
        config.session.room = room;
    }
    if let Some(agent_id) = var("RECALL_AGENT_ID") {
        config.session.agent_id = agent_id;
    }
    if let Some(mode) = var("RECALL_SESSION_MODE") {
        match mode.trim().to_ascii_lowercase().as_str() {
            "console" => config.session.mode = SessionMode::Console,
            "bridge" => config.session.mode = SessionMode::Bridge,
            other => tracing::warn!(mode = other, "unknown RECALL_SESSION_MODE, ignoring"),
        }
    }
    if let Some(level) = var("RECALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("RECALL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
