//! LLM client abstraction.
//!
//! Two narrow seams: [`TextGenerator`] produces the reply text from an
//! assembled message sequence, and [`MentionClassifier`] is the optional
//! yes/no gate consulted when an item carries too few mentions to commit
//! outright. The one real implementation of both is [`OpenAiClient`].

mod openai;
pub mod prompts;

pub use openai::OpenAiClient;

use crate::models::{Message, Role};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire-level role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instruction framing for the model.
    System,
    /// Discussion participant content.
    User,
    /// The agent's own content.
    Assistant,
}

/// One chat message in the generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: ChatRole,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Builds a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Builds a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Builds an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        match message.role {
            Role::Author => Self::user(message.content.clone()),
            Role::Agent => Self::assistant(message.content.clone()),
        }
    }
}

/// Trait for text generation providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given message sequence.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ContextRejected`] when the service refuses
    /// the sequence as oversized or malformed (the degradation protocol
    /// reacts to exactly this class), or [`crate::Error::OperationFailed`]
    /// for transport and parse failures.
    async fn generate(&self, messages: &[ChatMessage], model: &str) -> Result<String>;
}

/// Trait for the optional binary relevance gate.
#[async_trait]
pub trait MentionClassifier: Send + Sync {
    /// Whether the given text is genuinely asking about the catalog domain.
    ///
    /// # Errors
    ///
    /// Returns an error if classification fails; callers treat a failed
    /// classification as "no".
    async fn classify(&self, text: &str) -> Result<bool>;
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            connect_timeout_ms: 3_000,
        }
    }
}

/// Builds an HTTP client for LLM requests with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_serializes_lowercase() {
        let message = ChatMessage::system("you are a weapons expert");
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains(r#""role":"system""#));
    }

    #[test]
    fn test_context_message_conversion() {
        let user = Message::author("alys: which is faster?");
        let agent = Message::agent("The mace.");
        assert_eq!(ChatMessage::from(&user).role, ChatRole::User);
        assert_eq!(ChatMessage::from(&agent).role, ChatRole::Assistant);
        assert_eq!(ChatMessage::from(&user).content, "alys: which is faster?");
    }
}
