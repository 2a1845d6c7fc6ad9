// src/services/openai.rs

//! Minimal OpenAI-compatible chat completion client.
//!
//! Both the generator and the verifier go through [`ChatClient`], but each
//! call is a fresh single-turn conversation: nothing is shared between a
//! generation request and the verification of its output.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::GeneratorConfig;
use crate::utils::http;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// JSON-mode chat completion client.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Build a client; a missing API key is a configuration error.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: http::create_async_client(config.timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Send one system + user exchange and parse the reply as JSON.
    ///
    /// Errors are returned as plain messages; callers wrap them in their own
    /// adapter error variant.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> std::result::Result<T, String> {
        let content = self.complete_text(system, user).await?;
        parse_json_reply(&content)
    }

    /// Send one system + user exchange and return the raw reply content.
    pub async fn complete_text(
        &self,
        system: &str,
        user: &str,
    ) -> std::result::Result<String, String> {
        let request = ChatRequest {
            model: &self.model,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {e}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = http::error_body(response).await;
            return Err(format!("{} returned {}: {}", self.endpoint, status, body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("unreadable completion response: {e}"))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "completion response has no message content".to_string())
    }
}

/// Parse a model reply, tolerating a Markdown code fence around the JSON.
pub fn parse_json_reply<T: DeserializeOwned>(content: &str) -> std::result::Result<T, String> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim()).map_err(|e| format!("malformed JSON reply: {e}"))
}
