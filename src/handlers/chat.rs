//! Chat endpoint handler
//!
//! Handles POST /chat: one message in, one reply out. Creator-identity
//! questions are answered locally; everything else goes to the configured
//! completion provider exactly once.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use crate::timestamp;
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Lowercased phrases that trigger the attribution reply
pub const ATTRIBUTION_TRIGGERS: [&str; 3] = ["who made you", "who created you", "who develop you"];

/// Fixed reply to creator-identity questions
pub const ATTRIBUTION_REPLY: &str = "Jomer John Valmoria Alvarado, a Bachelor Of Science In Information Technology who graduated at St. Vincent's College Incorporated.";

/// Body of every failed response
pub const APOLOGY: &str = "Sorry, I'm having trouble processing your request.";

/// Chat request from client
///
/// Must be a JSON object with a string `message`; extra fields are ignored.
/// Arrays and other non-object bodies are rejected.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ChatRequestVisitor)
    }
}

struct ChatRequestVisitor;

impl<'de> Visitor<'de> for ChatRequestVisitor {
    type Value = ChatRequest;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with a string `message` field")
    }

    fn visit_map<A>(self, mut map: A) -> Result<ChatRequest, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut message: Option<String> = None;
        while let Some(key) = map.next_key::<String>()? {
            // Last occurrence wins on duplicate keys
            if key == "message" {
                message = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        let message =
            message.ok_or_else(|| <A::Error as de::Error>::missing_field("message"))?;
        Ok(ChatRequest { message })
    }
}

/// Chat response to client, used for both success and failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Wall-clock time the response was produced, `hh:mm AM|PM`
    pub timestamp: String,
}

impl ChatResponse {
    /// Success envelope stamped with the current time
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            timestamp: timestamp::now(),
        }
    }

    /// Failure envelope stamped with the current time
    pub fn apology() -> Self {
        Self::reply(APOLOGY)
    }
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Attribution,
    Provider,
}

impl ReplySource {
    fn outcome(self) -> Outcome {
        match self {
            ReplySource::Attribution => Outcome::Attribution,
            ReplySource::Provider => Outcome::Completion,
        }
    }
}

/// Reply text plus its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Attribution reply if `message` asks who made the assistant
///
/// Plain substring match on the lowercased message, no word boundaries:
/// "Who made youtube?" matches too.
pub fn attribution_reply(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    ATTRIBUTION_TRIGGERS
        .iter()
        .any(|trigger| lowered.contains(trigger))
        .then_some(ATTRIBUTION_REPLY)
}

/// Produce the reply for one message
///
/// The provider sees the original message, not the lowercased copy, and its
/// text is returned unmodified.
pub async fn relay(state: &AppState, message: &str) -> AppResult<Reply> {
    if let Some(text) = attribution_reply(message) {
        return Ok(Reply {
            text: text.to_string(),
            source: ReplySource::Attribution,
        });
    }

    let provider = state.provider();
    let model = state.config().provider.model();

    let started = Instant::now();
    let result = provider.complete(message, model).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    state
        .metrics()
        .record_provider_call(provider.kind().as_str(), result.is_ok(), duration_ms);

    Ok(Reply {
        text: result?,
        source: ReplySource::Provider,
    })
}

/// POST /chat handler
///
/// Returns 200 with the reply, or 500 with the apology text for any failure:
/// unreadable body, missing `message`, or provider error. The failure detail
/// is logged with the request id and never sent to the client.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let result = match payload {
        Ok(Json(request)) => {
            tracing::debug!(
                request_id = %request_id,
                message_length = request.message.len(),
                "Received chat request"
            );
            relay(&state, &request.message).await
        }
        Err(rejection) => Err(AppError::InvalidRequest(rejection.body_text())),
    };

    match result {
        Ok(reply) => {
            tracing::info!(
                request_id = %request_id,
                source = ?reply.source,
                response_length = reply.text.len(),
                "Chat request answered"
            );
            state.metrics().record_outcome(reply.source.outcome());
            Ok(Json(ChatResponse::reply(reply.text)))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                "Chat request failed"
            );
            state.metrics().record_outcome(Outcome::Failure);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ProviderKind};
    use crate::provider::{CompletionProvider, ProviderError};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    /// Provider that records every call and answers from a fixed result
    struct ScriptedProvider {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl ScriptedProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, message: &str, model: &str) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((message.to_string(), model.to_string()));
            if self.fail {
                Err(ProviderError::NoChoices)
            } else {
                Ok(format!("echo: {message}"))
            }
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Groq
        }
    }

    fn state_with(provider: Arc<ScriptedProvider>) -> AppState {
        let config = Config::from_toml_str("", |name| {
            (name == "GROQ_API_KEY").then(|| "gsk_test".to_string())
        })
        .expect("should build config");
        AppState::with_provider(config, provider).expect("should build state")
    }

    #[test]
    fn test_attribution_matches_each_trigger() {
        assert_eq!(attribution_reply("who made you"), Some(ATTRIBUTION_REPLY));
        assert_eq!(attribution_reply("who created you"), Some(ATTRIBUTION_REPLY));
        assert_eq!(attribution_reply("who develop you"), Some(ATTRIBUTION_REPLY));
    }

    #[test]
    fn test_attribution_is_case_insensitive() {
        assert_eq!(attribution_reply("Who MADE you??"), Some(ATTRIBUTION_REPLY));
    }

    #[test]
    fn test_attribution_matches_mid_sentence_without_word_boundaries() {
        assert!(attribution_reply("Tell me, who made youtube videos first?").is_some());
        assert!(attribution_reply("xxwho created youxx").is_some());
    }

    #[test]
    fn test_attribution_ignores_near_misses() {
        assert!(attribution_reply("who developed you").is_none());
        assert!(attribution_reply("who  made you").is_none());
        assert!(attribution_reply("somewhohomadeyourcar").is_none());
        assert!(attribution_reply("what made you").is_none());
        assert!(attribution_reply("").is_none());
    }

    #[test]
    fn test_chat_response_apology_text() {
        let response = ChatResponse::apology();
        assert_eq!(response.response, APOLOGY);
        assert!(!response.timestamp.is_empty());
    }

    #[test]
    fn test_chat_request_ignores_extra_fields() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message": "hi", "history": []}"#).expect("should parse");
        assert_eq!(request.message, "hi");
    }

    #[test]
    fn test_chat_request_requires_string_message() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{}"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{"message": 42}"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{"message": null}"#).is_err());
    }

    #[test]
    fn test_chat_request_rejects_non_object_bodies() {
        assert!(serde_json::from_str::<ChatRequest>(r#"["hi"]"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"["who made you"]"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#""hi""#).is_err());
        assert!(serde_json::from_str::<ChatRequest>("42").is_err());
    }

    #[test]
    fn test_chat_request_duplicate_message_keeps_last() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message": "a", "message": "b"}"#).expect("should parse");
        assert_eq!(request.message, "b");
    }

    #[tokio::test]
    async fn test_relay_bypasses_provider_for_attribution() {
        let provider = ScriptedProvider::new(false);
        let state = state_with(provider.clone());

        let reply = relay(&state, "So WHO CREATED YOU anyway?")
            .await
            .expect("should reply");

        assert_eq!(reply.text, ATTRIBUTION_REPLY);
        assert_eq!(reply.source, ReplySource::Attribution);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_relay_forwards_original_case_with_configured_model() {
        let provider = ScriptedProvider::new(false);
        let state = state_with(provider.clone());

        let reply = relay(&state, "Hello There").await.expect("should reply");

        assert_eq!(reply.text, "echo: Hello There");
        assert_eq!(reply.source, ReplySource::Provider);
        assert_eq!(
            provider.calls(),
            vec![(
                "Hello There".to_string(),
                "llama-3.1-8b-instant".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_relay_propagates_provider_error_after_one_attempt() {
        let provider = ScriptedProvider::new(true);
        let state = state_with(provider.clone());

        let err = relay(&state, "hello").await.unwrap_err();

        assert!(matches!(err, AppError::Provider(ProviderError::NoChoices)));
        assert_eq!(provider.calls().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_trigger_anywhere_in_any_case_matches(
            prefix in "[a-z0-9 ,.?!]{0,20}",
            suffix in "[a-z0-9 ,.?!]{0,20}",
            which in 0usize..3,
            upper_mask in proptest::collection::vec(any::<bool>(), 15),
        ) {
            let trigger: String = ATTRIBUTION_TRIGGERS[which]
                .chars()
                .zip(upper_mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();
            let message = format!("{prefix}{trigger}{suffix}");
            prop_assert_eq!(attribution_reply(&message), Some(ATTRIBUTION_REPLY));
        }

        #[test]
        fn prop_messages_without_you_never_match(message in "[a-xz0-9 ,.?!]{0,60}") {
            // No 'y' means none of the triggers can appear
            prop_assert_eq!(attribution_reply(&message), None);
        }
    }
}
