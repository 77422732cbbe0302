use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::Message;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

/// A hung request would otherwise leave the conversation busy forever, so
/// every call gets a bounded wait. Expiry surfaces as a transport error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Send the whole conversation and return the generated continuation.
    ///
    /// `Ok(None)` means the body was JSON but had no reply at
    /// `choices[0].message.content` — the API reports its own errors
    /// (bad request, quota) that way, with the status ignored on purpose.
    /// `Err` means the request itself failed: network, timeout, or a body
    /// that was not JSON at all.
    pub async fn chat(&self, model: &str, messages: &[Message]) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest { model, messages };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        Ok(extract_reply(&body))
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelEntry>,
        }

        #[derive(Deserialize)]
        struct ModelEntry {
            id: String,
        }

        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("failed to list models: {}", response.status()));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

/// Pull the generated text out of a completions response body.
fn extract_reply(body: &serde_json::Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use serde_json::json;

    #[test]
    fn extracts_reply_from_well_formed_response() {
        let body = json!({"choices": [{"message": {"content": "Hello"}}]});
        assert_eq!(extract_reply(&body), Some("Hello".to_string()));
    }

    #[test]
    fn empty_object_has_no_reply() {
        let body = json!({});
        assert_eq!(extract_reply(&body), None);
    }

    #[test]
    fn api_error_payload_has_no_reply() {
        let body = json!({"error": {"message": "rate limit exceeded", "code": 429}});
        assert_eq!(extract_reply(&body), None);
    }

    #[test]
    fn non_string_content_has_no_reply() {
        let body = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(extract_reply(&body), None);
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let messages = vec![
            Message {
                role: Role::User,
                content: "oi".to_string(),
            },
            Message {
                role: Role::Assistant,
                content: "olá".to_string(),
            },
        ];
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: &messages,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert_eq!(value["messages"][1]["content"], "olá");
    }
}
