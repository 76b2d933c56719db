//! Remote chat-completion collaborator for explanations and intent classification.
//!
//! The remote model is used **only** for:
//! - Free-text explanations of "why" questions
//! - Classifying structural questions into one of the four graph queries
//!
//! It never sees or modifies the graph; graph answers always come from
//! [`QueryEngine`](crate::graph::QueryEngine). Calls are blocking and are not
//! retried.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::config::CollaboratorConfig;

/// Errors from the remote collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum CollaboratorError {
    #[error("API key not set: environment variable {var} is empty or missing")]
    #[diagnostic(
        code(reefer::llm::missing_api_key),
        help("Export {var}=<key> before starting the question shell. Keys are never read from the config file.")
    )]
    MissingApiKey { var: String },

    #[error("collaborator request failed: {message}")]
    #[diagnostic(
        code(reefer::llm::request_failed),
        help("Check network connectivity, the configured base_url, and that the API key is valid.")
    )]
    RequestFailed { message: String },

    #[error("unexpected collaborator response: {message}")]
    #[diagnostic(
        code(reefer::llm::malformed_response),
        help("The service answered, but not in the chat-completions shape (choices[0].message.content).")
    )]
    MalformedResponse { message: String },
}

/// System prompt for "why" questions.
pub const EXPLAIN_SYSTEM_PROMPT: &str =
    "You are a marine refrigeration expert. Explain using engineering principles.";

/// System prompt for mapping a question onto one of the graph queries.
pub const CLASSIFY_SYSTEM_PROMPT: &str = r#"
You are a query interpretation system for a ship Digital Twin.

Your task:
- Identify which graph query should be used
- Identify the target component

RULES:
- Influence or dependency → who_affects(component)
- Downstream effects → downstream_impact(component)

Available graph queries:
1. who_affects(component)
2. what_it_affects(component)
3. upstream_dependencies(component)
4. downstream_impact(component)

Return ONLY valid JSON:
{
  "query_type": "one_of_the_above",
  "component": "component_name"
}
"#;

/// An external service the question router can delegate to.
///
/// Both methods return the raw answer text; callers treat it as untrusted.
pub trait Collaborator {
    /// Answer a "why" question in free text.
    fn explain(&self, question: &str) -> Result<String, CollaboratorError>;

    /// Classify a question; the answer should be a `{query_type, component}` JSON object.
    fn classify(&self, question: &str) -> Result<String, CollaboratorError>;
}

/// Blocking client for an OpenAI-compatible chat-completions API.
pub struct ChatClient {
    config: CollaboratorConfig,
    api_key: String,
}

impl ChatClient {
    /// Create a client with an explicit API key.
    pub fn new(config: CollaboratorConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
        }
    }

    /// Create a client reading the API key from `config.api_key_env`.
    pub fn from_env(config: CollaboratorConfig) -> Result<Self, CollaboratorError> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(config, key)),
            _ => Err(CollaboratorError::MissingApiKey {
                var: config.api_key_env.clone(),
            }),
        }
    }

    /// Get the model name being used.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One system + user turn, returning the assistant's text.
    fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, CollaboratorError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build();

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": temperature,
        });

        let body_str =
            serde_json::to_string(&body).map_err(|e| CollaboratorError::RequestFailed {
                message: format!("JSON serialize error: {e}"),
            })?;

        tracing::debug!(%url, model = %self.config.model, "sending chat completion");

        let resp = agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e: ureq::Error| CollaboratorError::RequestFailed {
                message: e.to_string(),
            })?;

        let resp_str = resp
            .into_string()
            .map_err(|e| CollaboratorError::RequestFailed {
                message: e.to_string(),
            })?;

        let json: Value =
            serde_json::from_str(&resp_str).map_err(|e| CollaboratorError::MalformedResponse {
                message: e.to_string(),
            })?;

        completion_content(&json)
    }
}

impl Collaborator for ChatClient {
    fn explain(&self, question: &str) -> Result<String, CollaboratorError> {
        self.complete(
            EXPLAIN_SYSTEM_PROMPT,
            question,
            self.config.explain_temperature,
        )
    }

    fn classify(&self, question: &str) -> Result<String, CollaboratorError> {
        self.complete(
            CLASSIFY_SYSTEM_PROMPT,
            question,
            self.config.classify_temperature,
        )
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub fn completion_content(response: &Value) -> Result<String, CollaboratorError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| CollaboratorError::MalformedResponse {
            message: "missing 'choices[0].message.content' field".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> CollaboratorConfig {
        CollaboratorConfig {
            base_url: base_url.into(),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn content_is_extracted() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Because superheat." } }]
        });
        assert_eq!(completion_content(&body).unwrap(), "Because superheat.");
    }

    #[test]
    fn missing_choices_is_malformed() {
        let body = serde_json::json!({ "error": "rate limited" });
        assert!(matches!(
            completion_content(&body),
            Err(CollaboratorError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn from_env_without_key_fails() {
        let cfg = CollaboratorConfig {
            api_key_env: "REEFER_TWIN_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = ChatClient::from_env(cfg).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingApiKey { .. }));
    }

    #[test]
    fn unreachable_service_is_request_failure() {
        let client = ChatClient::new(config("http://127.0.0.1:1"), "test-key");
        let err = client.explain("why does the compressor short-cycle?").unwrap_err();
        assert!(matches!(err, CollaboratorError::RequestFailed { .. }));
    }

    #[test]
    fn debug_hides_api_key() {
        let client = ChatClient::new(config("http://localhost"), "secret-key");
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("secret-key"));
        assert_eq!(client.model(), "sonar-pro");
    }
}
