// src/provider/openai.rs — OpenAI-compatible Chat Completions provider

use async_trait::async_trait;
use serde_json::json;

use super::{ChatRequest, ChatResponse, Message, ModelProvider, StopReason, TokenUsage, ToolCall};
use crate::infra::errors::NotebookError;

const PROVIDER: &str = "openai";

pub struct OpenAIProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com/v1".into())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from `OPENAI_API_KEY`.
    pub fn from_env(base_url: &str) -> Result<Self, NotebookError> {
        let key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(NotebookError::NoProvider)?;
        Ok(Self::with_base_url(key, base_url.to_string()))
    }
}

fn provider_error(message: impl Into<String>, retriable: bool) -> NotebookError {
    NotebookError::Provider {
        provider: PROVIDER.into(),
        message: message.into(),
        retriable,
    }
}

fn message_json(m: &Message) -> serde_json::Value {
    let mut msg = json!({
        "role": m.role.as_str(),
        "content": m.content,
    });
    if let Some(tc_id) = &m.tool_call_id {
        msg["tool_call_id"] = json!(tc_id);
    }
    if !m.tool_calls.is_empty() {
        let calls: Vec<serde_json::Value> = m
            .tool_calls
            .iter()
            .map(|tc| {
                json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        msg["tool_calls"] = json!(calls);
    }
    msg
}

/// Request body for `/chat/completions`.
pub(crate) fn request_body(request: &ChatRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request.messages.iter().map(message_json).collect();

    let mut body = json!({
        "model": request.model,
        "messages": messages,
    });

    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temp) = request.temperature {
        body["temperature"] = json!(temp);
    }
    if !request.tools.is_empty() {
        let tools: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = json!(tools);
    }
    body
}

/// Pull the first choice out of a `/chat/completions` response.
pub(crate) fn parse_response(resp: &serde_json::Value) -> Result<ChatResponse, NotebookError> {
    let choice = resp["choices"]
        .get(0)
        .ok_or_else(|| provider_error("Response contained no choices", false))?;

    let content = choice["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let tool_calls = choice["message"]["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|tc| ToolCall {
                    id: tc["id"].as_str().unwrap_or("").to_string(),
                    name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                    arguments: serde_json::from_str(
                        tc["function"]["arguments"].as_str().unwrap_or("{}"),
                    )
                    .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    let stop_reason = match choice["finish_reason"].as_str() {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls") => StopReason::ToolUse,
        _ => StopReason::Unknown,
    };

    Ok(ChatResponse {
        content,
        tool_calls,
        usage,
        stop_reason,
    })
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    fn id(&self) -> &str {
        PROVIDER
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, NotebookError> {
        let body = request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| provider_error(e.to_string(), e.is_timeout() || e.is_connect()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NotebookError::RateLimited {
                provider: PROVIDER.into(),
                retry_after_ms: 5000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(provider_error(
                format!("HTTP {}: {}", status, error_body),
                status.is_server_error(),
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| provider_error(format!("Failed to parse response: {}", e), false))?;

        parse_response(&resp)
    }

    async fn embed(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, NotebookError> {
        let body = json!({
            "model": model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| provider_error(e.to_string(), e.is_timeout()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(provider_error(
                format!("HTTP {}: {}", status, error_body),
                status.is_server_error(),
            ));
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| {
            provider_error(format!("Failed to parse embedding response: {}", e), false)
        })?;

        let embeddings: Vec<Vec<f32>> = resp["data"]
            .as_array()
            .map(|data| {
                data.iter()
                    .map(|d| {
                        d["embedding"]
                            .as_array()
                            .map(|v| v.iter().map(|x| x.as_f64().unwrap_or(0.0) as f32).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();

        if embeddings.len() != texts.len() {
            return Err(provider_error(
                format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    embeddings.len()
                ),
                false,
            ));
        }

        Ok(embeddings)
    }
}
