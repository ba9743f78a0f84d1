// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for an OpenAI-compatible vision chat completions API

use reqwest::{header, Client};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::describer::DescribeError;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    // Null when the model refuses
    content: Option<String>,
}

/// Result from a VLM image description
#[derive(Debug, Clone)]
pub struct VlmDescribeResult {
    pub description: String,
    pub model: String,
    pub processing_time_ms: u64,
    pub tokens_used: u32,
}

/// Connection settings for [`VlmClient`]
#[derive(Clone)]
pub struct VlmClientConfig {
    /// Base URL, without the `/v1/chat/completions` suffix
    pub endpoint: String,
    pub model_name: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Client for calling a vision language model via OpenAI-compatible API
///
/// Holds a single `reqwest::Client`, which pools connections and is safe to
/// share between concurrent requests.
pub struct VlmClient {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: String,
}

impl VlmClient {
    /// Create a new VLM client
    pub fn new(config: VlmClientConfig) -> Result<Self, DescribeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DescribeError::Transport)?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "VLM client configured: endpoint={}, model={}, timeout={:?}",
            endpoint, config.model_name, config.timeout
        );

        Ok(Self {
            client,
            endpoint,
            model_name: config.model_name,
            api_key: config.api_key,
        })
    }

    /// Describe an image supplied as a `data:` URI
    pub async fn describe(
        &self,
        data_url: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<VlmDescribeResult, DescribeError> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]),
            }],
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(DescribeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DescribeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(DescribeError::MalformedResponse)?;
        let tokens_used = chat_response
            .usage
            .as_ref()
            .map(|u| u.total_tokens)
            .unwrap_or(0);
        if let Some(usage) = &chat_response.usage {
            debug!(
                "VLM usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let description = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(DescribeError::NoChoices)?
            .message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(DescribeError::EmptyDescription)?;

        Ok(VlmDescribeResult {
            description,
            model: self.model_name.clone(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            tokens_used,
        })
    }
}
