//! `OpenAI` chat-completions client.

use super::{ChatMessage, MentionClassifier, TextGenerator, prompts};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// `OpenAI` LLM client.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<SecretString>,
    /// API endpoint.
    endpoint: String,
    /// Model used for classification calls.
    classifier_model: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default classification model.
    pub const DEFAULT_CLASSIFIER_MODEL: &'static str = "gpt-4o-mini";

    /// Creates a new `OpenAI` client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            classifier_model: Self::DEFAULT_CLASSIFIER_MODEL.to_string(),
            client,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the classification model.
    #[must_use]
    pub fn with_classifier_model(mut self, model: impl Into<String>) -> Self {
        self.classifier_model = model.into();
        self
    }

    /// Makes a chat-completions request.
    async fn request(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| Error::OperationFailed {
            operation: "openai_request".to_string(),
            cause: "API key not configured".to_string(),
        })?;

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::operation("openai_request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The service reports an oversized or malformed message sequence
            // as a client error; that is the degradation protocol's signal.
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(Error::ContextRejected(body));
            }
            return Err(Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::operation("openai_response", e))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_response".to_string(),
                cause: "No choices in response".to_string(),
            })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        self.request(messages, model).await
    }
}

#[async_trait]
impl MentionClassifier for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<bool> {
        let messages = vec![
            ChatMessage::system(prompts::CLASSIFIER_PROMPT),
            ChatMessage::user(text),
        ];
        let response = self.request(&messages, &self.classifier_model).await?;
        Ok(parse_yes_no(&response))
    }
}

/// Interprets a yes/no completion; anything that does not clearly say yes
/// counts as no.
fn parse_yes_no(response: &str) -> bool {
    response
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
        .starts_with("yes")
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

/// The message payload of a choice.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_configuration() {
        let client = OpenAiClient::new(reqwest::Client::new())
            .with_endpoint("https://custom.endpoint")
            .with_classifier_model("gpt-4o");

        assert_eq!(client.name(), "openai");
        assert_eq!(client.endpoint, "https://custom.endpoint");
        assert_eq!(client.classifier_model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_request_without_key_fails() {
        let client = OpenAiClient::new(reqwest::Client::new());
        let result = client
            .generate(&[ChatMessage::user("hello")], "gpt-4o-mini")
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("yes"));
        assert!(parse_yes_no("Yes."));
        assert!(parse_yes_no("  YES, clearly"));
        assert!(!parse_yes_no("no"));
        assert!(!parse_yes_no("unsure"));
        assert!(!parse_yes_no(""));
    }
}
