//! Command-line interface for chatrelay
//!
//! Provides argument parsing and subcommand handling for the chatrelay binary.

use crate::config::ProviderKind;
use clap::{Parser, Subcommand};

/// Relay chat messages to a hosted LLM completion API
#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version)]
#[command(about = "Relay chat messages to a hosted LLM completion API")]
#[command(
    long_about = "chatrelay serves a small chat page and forwards each message to a hosted \
    OpenAI-compatible completion API (Groq, OpenAI, or OpenRouter). The API key is read \
    from the environment; PORT selects the listening port."
)]
pub struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Upstream provider, overriding `[provider] kind` from the config file
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chatrelay Configuration
# ========================
#
# Every section is optional. The API key is never stored here: it is read
# from the environment variable for the selected provider (GROQ_API_KEY,
# OPENAI_API_KEY, or OPENROUTER_API_KEY), or from a .env file.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on. The PORT environment variable takes precedence.
port = 5000

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDER
# ─────────────────────────────────────────────────────────────────────────────
#
#   - groq:       https://api.groq.com/openai/v1  (default model llama-3.1-8b-instant)
#   - openai:     https://api.openai.com/v1       (default model gpt-4o-mini)
#   - openrouter: https://openrouter.ai/api/v1    (default model meta-llama/llama-3.1-8b-instruct)

[provider]
kind = "groq"

# Override the base URL or model (defaults depend on kind):
# base_url = "https://api.groq.com/openai/v1"
# model = "llama-3.1-8b-instant"

# Read the API key from a differently named variable:
# api_key_env = "MY_GROQ_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG overrides this when set.
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
