//! OpenAI-compatible chat completion client

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{ImproveError, Improver};
use crate::config::ProviderConfig;

/// Longest slice of a provider error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn system(content: &'a str) -> Self {
        Self { role: "system", content }
    }

    fn user(content: &'a str) -> Self {
        Self { role: "user", content }
    }
}

/// Calls `{base_url}/chat/completions` with a fixed system prompt and the
/// user's text as the only user message.
#[derive(Clone)]
pub struct OpenAiImprover {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    max_tokens: Option<u32>,
}

impl OpenAiImprover {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            max_tokens: None,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Create client from provider config; the API key must be present
    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => bail!("OPENAI_API_KEY is not set. Set it in the environment or a .env file."),
        };

        Ok(Self::new(
            &config.base_url,
            api_key,
            &config.model,
            &config.system_prompt,
            Duration::from_secs(config.timeout_secs),
        )?
        .with_max_tokens(config.max_tokens))
    }

    async fn complete(&self, text: &str) -> Result<String, ImproveError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(&self.system_prompt), ChatMessage::user(text)],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ImproveError::Api {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY).to_string(),
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            ImproveError::MalformedResponse(format!(
                "{} (body: {})",
                e,
                truncate(&body, MAX_ERROR_BODY)
            ))
        })?;

        let content = extract_content(&raw)?;
        if content.is_empty() {
            return Err(ImproveError::EmptyCompletion);
        }
        Ok(content)
    }
}

#[async_trait]
impl Improver for OpenAiImprover {
    async fn improve(&self, text: &str) -> Result<String, ImproveError> {
        self.complete(text).await
    }
}

/// Pull the first choice's message text out of a completion response.
///
/// `content` may be a plain string or an array of typed parts; only the
/// `text` parts are kept. The result is trimmed.
fn extract_content(raw: &Value) -> Result<String, ImproveError> {
    let content = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .ok_or_else(|| {
            ImproveError::MalformedResponse("missing choices[0].message.content".to_string())
        })?;

    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        Value::Null => String::new(),
        other => {
            return Err(ImproveError::MalformedResponse(format!(
                "unexpected content type: {}",
                other
            )))
        }
    };

    Ok(text.trim().to_string())
}

/// Cut `s` to at most `max` bytes without splitting a character
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
