//! Chat-completions client for OpenAI-compatible endpoints (Groq by default).

use super::{CompletionOptions, CompletionResponse, LLMProvider, Message, TokenUsage};
use crate::config::OracleConfig;
use crate::error::{AgentError, AgentResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Provider speaking the OpenAI chat-completions wire format.
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u16,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIProvider {
    /// Create a provider from oracle settings.
    pub fn from_config(cfg: &OracleConfig) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            api_url: cfg.api_url.clone(),
            model: cfg.model.clone(),
        }
    }
}

/// Map a non-success status to an error.
fn status_error(status: StatusCode, body: String) -> AgentError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AgentError::Llm(format!("authentication rejected ({})", status))
        }
        _ => AgentError::Llm(format!("HTTP {}: {}", status, body)),
    }
}

impl ChatResponse {
    fn into_completion(self) -> AgentResult<CompletionResponse> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AgentError::MissingField("choices[0].message.content"))?;

        Ok(CompletionResponse {
            content,
            usage: self.usage.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
        client: &reqwest::Client,
    ) -> AgentResult<CompletionResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response.json::<ChatResponse>().await?.into_completion()
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let cfg = OracleConfig::new("k")
            .with_api_url("https://api.openai.com/v1/chat/completions")
            .with_model("gpt-4o-mini");
        let provider = OpenAIProvider::from_config(&cfg);
        assert!(provider.is_configured());
        assert_eq!(provider.api_url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(provider.model, "gpt-4o-mini");

        assert!(!OpenAIProvider::from_config(&OracleConfig::default()).is_configured());
    }

    #[test]
    fn test_request_body() {
        let messages = vec![Message::system("s"), Message::user("u")];
        let body = serde_json::to_value(ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.1,
            max_tokens: 16,
        })
        .unwrap();

        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 16);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}],
                      "usage": {"prompt_tokens": 7, "completion_tokens": 1, "total_tokens": 8}}"#;
        let completion = serde_json::from_str::<ChatResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.content, "[]");
        assert_eq!(completion.usage.total_tokens, 8);

        let empty = serde_json::from_str::<ChatResponse>(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            empty.into_completion(),
            Err(AgentError::MissingField(_))
        ));
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AgentError::RateLimited
        ));
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "upstream".into()).to_string(),
            "LLM error: HTTP 502 Bad Gateway: upstream"
        );
    }
}
