//! Completion providers
//!
//! A provider turns one user message into generated text. The relay only ever
//! sends a single user-role turn; there is no history or streaming.

use crate::config::ProviderKind;
use async_trait::async_trait;
use thiserror::Error;

pub mod openai_compat;

pub use openai_compat::OpenAiCompatibleProvider;

/// Errors from a single completion attempt
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Success status with a body that is not a completion response
    #[error("upstream response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx status; `body` is truncated to 1 KiB
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream response contained no choices")]
    NoChoices,

    #[error("upstream choice contained no text content")]
    EmptyContent,

    #[error("API key cannot be sent as an HTTP header: {0}")]
    InvalidCredential(String),
}

/// Upstream chat-completion API
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply to `message` using `model`
    async fn complete(&self, message: &str, model: &str) -> Result<String, ProviderError>;

    /// Which hosted API this provider talks to
    fn kind(&self) -> ProviderKind;
}
