//! Chat-completions client for any OpenAI-compatible endpoint.

use super::traits::{Generation, TextGenerator};
use crate::config::LlmConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_API_ERROR_CHARS: usize = 200;

pub struct OpenAiCompatibleGenerator {
    model: String,
    temperature: f64,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    /// Pre-computed chat completions URL.
    cached_chat_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

pub fn build_http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl OpenAiCompatibleGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/');
        let cached_chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            cached_auth_header: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            cached_chat_url,
            client: build_http_client(config.timeout_secs),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.cached_chat_url
    }
}

fn truncate_error_body(body: &str) -> String {
    if body.chars().count() <= MAX_API_ERROR_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{cut}...")
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, prompt: &str) -> anyhow::Result<Generation> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&self.cached_chat_url).json(&request);
        if let Some(auth) = &self.cached_auth_header {
            builder = builder.header("Authorization", auth);
        }

        let response = builder
            .send()
            .await
            .context("chat completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            anyhow::bail!(
                "chat completions API error ({status}): {}",
                truncate_error_body(&body)
            );
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("chat completions response JSON decode failed")?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(Generation::new)
            .ok_or_else(|| anyhow::anyhow!("chat completions returned no content"))
    }
}
