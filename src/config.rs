//! Configuration management for chatrelay
//!
//! Configuration comes from an optional TOML file plus the process environment
//! and is resolved exactly once at startup. A missing provider credential is a
//! startup failure, never a per-request one.

use crate::error::{AppError, AppResult};
use crate::telemetry::LOG_LEVELS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

/// Environment variable that overrides `server.port`
pub const PORT_VAR: &str = "PORT";

/// Hosted completion API the relay forwards to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    #[value(name = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    /// Stable lowercase name used in config files, logs, and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// OpenAI-compatible base URL (without the `/chat/completions` suffix)
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.1-8b-instant",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::OpenRouter => "meta-llama/llama-3.1-8b-instruct",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider API key
///
/// `Debug` is redacted so the key never ends up in logs or panic output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key for building the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// `[provider]` table as written in the config file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSection {
    #[serde(default)]
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Overrides the credential variable name implied by `kind`
    pub api_key_env: Option<String>,
}

/// Resolved upstream provider settings
///
/// Fields are private so the settings cannot change after startup validation.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    kind: ProviderKind,
    base_url: String,
    model: String,
    api_key: ApiKey,
}

impl ProviderConfig {
    pub fn new(
        kind: ProviderKind,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: ApiKey,
    ) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model identifier sent with every completion request
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Config file layout; every section may be omitted
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Root configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from an optional file and the process environment
    pub fn load(path: Option<&Path>, kind_override: Option<ProviderKind>) -> AppResult<Self> {
        Self::load_with(path, kind_override, |name| std::env::var(name).ok())
    }

    /// Load configuration reading environment variables through `lookup`
    pub fn load_with<F>(
        path: Option<&Path>,
        kind_override: Option<ProviderKind>,
        lookup: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(path) = path else {
            return Self::resolve(ConfigFile::default(), kind_override, &lookup);
        };
        let path_display = path.display().to_string();

        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let file: ConfigFile =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        Self::resolve(file, kind_override, &lookup).map_err(|e| match e {
            AppError::Config(reason) => AppError::ConfigValidationFailed {
                path: path_display,
                reason,
            },
            other => other,
        })
    }

    /// Parse TOML text and resolve it against `lookup`
    pub fn from_toml_str<F>(toml_str: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: ConfigFile =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;
        Self::resolve(file, None, &lookup)
    }

    fn resolve<F>(
        file: ConfigFile,
        kind_override: Option<ProviderKind>,
        lookup: &F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ConfigFile {
            mut server,
            provider,
            observability,
        } = file;

        let kind = kind_override.unwrap_or(provider.kind);
        let variable = provider
            .api_key_env
            .unwrap_or_else(|| kind.api_key_var().to_string());
        let api_key = lookup(&variable)
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingCredential { variable })?;

        if let Some(port) = lookup(PORT_VAR) {
            server.port = port.trim().parse::<u16>().map_err(|e| {
                AppError::Config(format!(
                    "{} must be a port number between 1 and 65535, got '{}': {}",
                    PORT_VAR, port, e
                ))
            })?;
        }

        let config = Config {
            server,
            provider: ProviderConfig::new(
                kind,
                provider
                    .base_url
                    .unwrap_or_else(|| kind.default_base_url().to_string()),
                provider
                    .model
                    .unwrap_or_else(|| kind.default_model().to_string()),
                ApiKey::new(api_key),
            ),
            observability,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate resolved values
    ///
    /// Called by every constructor; errors are `AppError::Config`.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(AppError::Config(format!(
                "server.host '{}' is not an IP address (e.g. 0.0.0.0 or 127.0.0.1)",
                self.server.host
            )));
        }

        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        let base_url = &self.provider.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "provider.base_url '{}' must start with 'http://' or 'https://'",
                base_url
            )));
        }

        if self.provider.model.trim().is_empty() {
            return Err(AppError::Config(
                "provider.model cannot be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.observability.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' must be one of {}",
                self.observability.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn listen_addr(&self) -> AppResult<SocketAddr> {
        let ip: IpAddr = self.server.host.parse().map_err(|e| {
            AppError::Config(format!("server.host '{}': {}", self.server.host, e))
        })?;
        Ok(SocketAddr::from((ip, self.server.port)))
    }
}
