use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::models::{AskOptions, AskRequest, AskResponse};
use crate::services::host::Assistant;

/// Direct client for an Ollama-style chat endpoint.
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: String,
}

impl LLMClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let api_url = config
            .llm_api_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434/api/chat".to_string());

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.llm_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(LLMClient {
            client: builder.build().context("building LLM HTTP client")?,
            api_url,
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
        })
    }

    fn request_body(&self, request: &AskRequest, options: AskOptions) -> serde_json::Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        messages.extend(
            request
                .messages
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content })),
        );

        json!({
            "model": self.model,
            "messages": messages,
            "stream": options.stream,
            "options": {
                "temperature": self.temperature
            }
        })
    }
}

#[async_trait]
impl Assistant for LLMClient {
    async fn ask(&self, request: &AskRequest, options: AskOptions) -> Result<AskResponse> {
        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(request, AskOptions { stream: false, ..options }));

        if let Some(key) = &self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            bail!("model endpoint returned {status}: {response_text}");
        }

        let reply: ChatReply = serde_json::from_str(&response_text)
            .with_context(|| format!("unexpected model response: {response_text}"))?;

        Ok(AskResponse {
            result: reply.message.content,
        })
    }
}
