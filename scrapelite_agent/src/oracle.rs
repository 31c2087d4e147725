//! The language-model oracle as an explicit value.
//!
//! An [`Oracle`] bundles a provider, its HTTP client, and the usage counters
//! of one invocation. The planner and the extractor borrow it; nothing about
//! the connection lives in globals.

use crate::config::{OracleConfig, UsageSnapshot, UsageStats};
use crate::error::{AgentError, AgentResult};
use crate::llm::{CompletionOptions, LLMProvider, Message, OpenAIProvider};

/// Oracle client shared by the planning and extraction adapters.
pub struct Oracle {
    provider: Box<dyn LLMProvider>,
    client: reqwest::Client,
    options: CompletionOptions,
    usage: UsageStats,
}

impl Oracle {
    /// Wrap any provider with default completion options.
    pub fn new(provider: Box<dyn LLMProvider>) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            options: CompletionOptions::default(),
            usage: UsageStats::new(),
        }
    }

    /// Build an OpenAI-compatible oracle from settings.
    pub fn from_config(cfg: &OracleConfig) -> AgentResult<Self> {
        if !cfg.is_configured() {
            return Err(AgentError::NotConfigured("oracle api key"));
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;

        Ok(Self {
            provider: Box::new(OpenAIProvider::from_config(cfg)),
            client,
            options: CompletionOptions {
                temperature: cfg.temperature,
                max_tokens: cfg.max_tokens,
            },
            usage: UsageStats::new(),
        })
    }

    /// Replace the completion options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Send messages and return the reply text.
    pub async fn complete(&self, messages: Vec<Message>) -> AgentResult<String> {
        if !self.provider.is_configured() {
            return Err(AgentError::NotConfigured("LLM provider"));
        }

        self.usage.increment_llm_calls();

        let response = self
            .provider
            .complete(messages, &self.options, &self.client)
            .await?;

        self.usage.add_tokens(
            response.usage.prompt_tokens as u64,
            response.usage.completion_tokens as u64,
        );

        Ok(response.content)
    }

    /// Usage so far.
    pub fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }
}

impl std::fmt::Debug for Oracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracle")
            .field("provider", &self.provider.provider_name())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, TokenUsage};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl LLMProvider for Echo {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _options: &CompletionOptions,
            _client: &reqwest::Client,
        ) -> AgentResult<CompletionResponse> {
            Ok(CompletionResponse {
                content: messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 2,
                    total_tokens: 12,
                },
            })
        }

        fn provider_name(&self) -> &'static str {
            "echo"
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_oracle_tracks_usage() {
        let oracle = Oracle::new(Box::new(Echo));
        let reply = oracle.complete(vec![Message::user("hi")]).await.unwrap();
        assert_eq!(reply, "hi");

        oracle.complete(vec![Message::user("again")]).await.unwrap();
        let usage = oracle.usage();
        assert_eq!(usage.llm_calls, 2);
        assert_eq!(usage.total_tokens(), 24);
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = Oracle::from_config(&OracleConfig::default()).unwrap_err();
        assert!(matches!(err, AgentError::NotConfigured(_)));
    }
}
