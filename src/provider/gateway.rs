// src/provider/gateway.rs — Single-turn text completion boundary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, Message, ModelProvider};
use crate::infra::config::ModelConfig;
use crate::infra::errors::NotebookError;

/// Text in, text out. Either returns a non-empty completion or fails.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, NotebookError>;
}

/// Gateway backed by a chat provider with a fixed model and sampling settings.
pub struct ProviderGateway {
    provider: Arc<dyn ModelProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }

    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &ModelConfig) -> Self {
        let mut gateway = Self::new(provider, config.model.clone());
        gateway.temperature = config.temperature;
        gateway.max_tokens = config.max_tokens;
        gateway.timeout = config.timeout_seconds.map(Duration::from_secs);
        gateway
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for ProviderGateway {
    async fn complete(&self, prompt: &str) -> Result<String, NotebookError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            tools: vec![],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let call = self.provider.chat(request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| NotebookError::Timeout {
                    seconds: limit.as_secs(),
                })??,
            None => call.await?,
        };

        tracing::debug!(
            model = %self.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Completion received",
        );

        if response.content.trim().is_empty() {
            return Err(NotebookError::Provider {
                provider: self.provider.id().to_string(),
                message: "Completion returned no text".into(),
                retriable: false,
            });
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, StopReason, TokenUsage};
    use std::sync::Mutex;

    struct EchoProvider {
        reply: String,
        delay: Option<Duration>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl EchoProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.into(),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn id(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, NotebookError> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.seen.lock().unwrap().push(request);
            Ok(ChatResponse {
                content: self.reply.clone(),
                tool_calls: vec![],
                usage: TokenUsage::default(),
                stop_reason: StopReason::EndTurn,
            })
        }

        async fn embed(&self, _model: &str, _texts: &[&str]) -> Result<Vec<Vec<f32>>, NotebookError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_single_user_turn_with_fixed_model() {
        let provider = Arc::new(EchoProvider::new("draft"));
        let config = ModelConfig {
            temperature: Some(0.4),
            ..ModelConfig::default()
        };
        let gateway = ProviderGateway::from_config(provider.clone(), &config);

        let out = gateway.complete("write it").await.unwrap();
        assert_eq!(out, "draft");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[0].messages[0].content, "write it");
        assert_eq!(seen[0].temperature, Some(0.4));
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let gateway = ProviderGateway::new(Arc::new(EchoProvider::new("  ")), "m");
        let err = gateway.complete("x").await.unwrap_err();
        assert!(matches!(err, NotebookError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_error() {
        let provider = EchoProvider {
            delay: Some(Duration::from_millis(200)),
            ..EchoProvider::new("late")
        };
        let gateway =
            ProviderGateway::new(Arc::new(provider), "m").with_timeout(Duration::from_millis(10));
        let err = gateway.complete("x").await.unwrap_err();
        assert!(matches!(err, NotebookError::Timeout { .. }));
    }
}
