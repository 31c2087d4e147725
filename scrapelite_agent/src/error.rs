//! Error types for scrapelite_agent.

use crate::page::PageError;
use std::fmt;

/// Agent error types.
#[derive(Debug)]
pub enum AgentError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
    /// Missing required field in response.
    MissingField(&'static str),
    /// Feature not enabled or configured.
    NotConfigured(&'static str),
    /// LLM provider error.
    Llm(String),
    /// Browser capability error.
    Browser(PageError),
    /// IO error (persisting results).
    Io(std::io::Error),
    /// Rate limit exceeded.
    RateLimited,
    /// Timeout.
    Timeout,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::MissingField(field) => write!(f, "Missing field: {}", field),
            Self::NotConfigured(what) => write!(f, "Not configured: {}", what),
            Self::Llm(msg) => write!(f, "LLM error: {}", msg),
            Self::Browser(e) => write!(f, "Browser error: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Browser(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<PageError> for AgentError {
    fn from(e: PageError) -> Self {
        Self::Browser(e)
    }
}

impl From<std::io::Error> for AgentError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
