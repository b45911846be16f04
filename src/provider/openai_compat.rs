//! OpenAI-compatible chat completion client
//!
//! Groq, OpenAI, and OpenRouter all expose `POST {base_url}/chat/completions`
//! with the same request and response shapes, so one client covers them.
//! The only per-provider difference is OpenRouter's attribution headers.

use super::{CompletionProvider, ProviderError};
use crate::config::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Sent as `X-Title` to OpenRouter
const OPENROUTER_TITLE: &str = "chatrelay";
/// Sent as `HTTP-Referer` to OpenRouter
const OPENROUTER_REFERER: &str = "https://github.com/chatrelay/chatrelay";
/// Upstream error bodies are cut to this many bytes before logging
const MAX_ERROR_BODY_BYTES: usize = 1024;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible completion endpoint
///
/// Holds one pooled `reqwest::Client` with the credential baked into its
/// default headers. No client-side timeout is set.
pub struct OpenAiCompatibleProvider {
    http: Client,
    kind: ProviderKind,
    completions_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key().expose()))
                .map_err(|e| ProviderError::InvalidCredential(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        if config.kind() == ProviderKind::OpenRouter {
            headers.insert("http-referer", HeaderValue::from_static(OPENROUTER_REFERER));
            headers.insert("x-title", HeaderValue::from_static(OPENROUTER_TITLE));
        }

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            kind: config.kind(),
            completions_url: completions_url(config.base_url()),
        })
    }

    /// Full URL requests are posted to
    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, message: &str, model: &str) -> Result<String, ProviderError> {
        let body = CompletionRequest {
            model,
            messages: [RequestMessage {
                role: "user",
                content: message,
            }],
        };

        tracing::debug!(
            provider = %self.kind,
            model = %model,
            url = %self.completions_url,
            "Sending completion request"
        );

        let response = self
            .http
            .post(&self.completions_url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => truncate_body(text),
                Err(e) => format!("<unreadable body: {}>", e),
            };
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::NoChoices)?;

        choice.message.content.ok_or(ProviderError::EmptyContent)
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }
}
