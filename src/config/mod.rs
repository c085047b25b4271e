//! Configuration management
//!
//! Layered sources, lowest to highest priority: `config/default`,
//! `config/{ENV}`, `config/local`, then `AEGIS__*` environment variables
//! with `__` as the section separator (e.g. `AEGIS__SERVER__PORT=3000`).

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub audit: AuditConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Timeout applied to request handling, not to job bodies
    pub request_timeout_seconds: u64,
    pub allowed_origins: Vec<String>,
    /// Expose Swagger UI at /docs
    pub enable_docs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_seconds: 30,
            allowed_origins: vec!["*".to_string()],
            enable_docs: true,
        }
    }
}

/// Audit job execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of jobs simultaneously in PROCESSING
    pub max_concurrent_jobs: usize,
    /// Deadline for one agent run; the run is abandoned past this
    pub timeout_seconds: u64,
    /// Step budget handed to the agent
    pub max_agent_steps: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 5,
            timeout_seconds: 300,
            max_agent_steps: 40,
        }
    }
}

/// Agent runtime endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the agent runtime service
    pub endpoint: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4000".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("AEGIS").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on nonsensical settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.audit.max_concurrent_jobs == 0 {
            return Err(ValidationError::new("audit.max_concurrent_jobs must be > 0"));
        }
        if self.audit.timeout_seconds == 0 {
            return Err(ValidationError::new("audit.timeout_seconds must be > 0"));
        }
        if self.audit.max_agent_steps == 0 {
            return Err(ValidationError::new("audit.max_agent_steps must be > 0"));
        }
        if self.agent.endpoint.is_empty() {
            return Err(ValidationError::new("agent.endpoint must not be empty"));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ValidationError::new("logging.format must be 'json' or 'pretty'"));
        }
        Ok(())
    }
}

/// Error type for configuration validation
#[derive(Debug, thiserror::Error)]
#[error("Configuration validation error: {0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
