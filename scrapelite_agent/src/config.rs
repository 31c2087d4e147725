//! Configuration types for scrapelite_agent.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default OpenAI-compatible chat completions endpoint (Groq).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model for planning and extraction.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Settings for one `scrape` invocation.
///
/// Durations are stored as milliseconds so the config round-trips through
/// JSON; use the accessor methods to get [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Maximum observe-plan-act cycles before forcing extraction.
    pub max_iterations: usize,
    /// Actions kept from a single plan; the rest are dropped.
    pub max_actions_per_plan: usize,
    /// Bound on the initial navigation.
    pub navigation_timeout_ms: u64,
    /// Bound on the network-idle wait after the initial navigation.
    pub navigation_idle_timeout_ms: u64,
    /// Bound on a single click/fill/press/select.
    pub action_timeout_ms: u64,
    /// Bound on the network-idle wait after a click or Enter press.
    pub post_action_idle_timeout_ms: u64,
    /// Pause after every action.
    pub action_pacing_ms: u64,
    /// Pause after executing a non-empty plan.
    pub iteration_settle_ms: u64,
    /// Pixels scrolled by a scroll action.
    pub scroll_offset: i64,
    /// Seconds a wait action sleeps when the plan gives no value.
    pub default_wait_secs: u64,
    /// Upper bound on a wait action.
    pub max_wait_secs: u64,
    /// Characters of page text sent to the extraction oracle.
    pub extraction_max_chars: usize,
    /// Fields the extracted JSON object must contain.
    pub required_fields: Vec<String>,
    /// Run the browser without a window.
    pub headless: bool,
    /// Where the CLI persists the final result.
    pub output_path: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1,
            max_actions_per_plan: 3,
            navigation_timeout_ms: 30_000,
            navigation_idle_timeout_ms: 15_000,
            action_timeout_ms: 5_000,
            post_action_idle_timeout_ms: 10_000,
            action_pacing_ms: 500,
            iteration_settle_ms: 1_000,
            scroll_offset: 500,
            default_wait_secs: 2,
            max_wait_secs: 30,
            extraction_max_chars: 6_000,
            required_fields: Vec::new(),
            headless: false,
            output_path: "data.json".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration budget (at least one iteration always runs).
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n.max(1);
        self
    }

    /// Set the per-plan action cap.
    pub fn with_max_actions_per_plan(mut self, n: usize) -> Self {
        self.max_actions_per_plan = n.max(1);
        self
    }

    /// Set the fields the extracted object must contain.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Run the browser headless.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the CLI output path.
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the per-action timeout.
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the pause after each action.
    pub fn with_action_pacing(mut self, pacing: Duration) -> Self {
        self.action_pacing_ms = pacing.as_millis() as u64;
        self
    }

    /// Set the pause after each executed plan.
    pub fn with_iteration_settle(mut self, settle: Duration) -> Self {
        self.iteration_settle_ms = settle.as_millis() as u64;
        self
    }

    /// Set the navigation idle bound.
    pub fn with_navigation_idle_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the post-action idle bound.
    pub fn with_post_action_idle_timeout(mut self, timeout: Duration) -> Self {
        self.post_action_idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Effective iteration budget.
    pub fn iteration_budget(&self) -> usize {
        self.max_iterations.max(1)
    }

    /// Navigation bound.
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Navigation idle bound.
    pub fn navigation_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_idle_timeout_ms)
    }

    /// Per-action bound.
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Post-action idle bound.
    pub fn post_action_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.post_action_idle_timeout_ms)
    }

    /// Pause after each action.
    pub fn action_pacing(&self) -> Duration {
        Duration::from_millis(self.action_pacing_ms)
    }

    /// Pause after each executed plan.
    pub fn iteration_settle(&self) -> Duration {
        Duration::from_millis(self.iteration_settle_ms)
    }
}

/// Connection settings for the language-model oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API key sent as a bearer token.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// OpenAI-compatible chat completions endpoint.
    pub api_url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
    /// Max tokens for a response.
    pub max_tokens: u16,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            request_timeout_secs: 120,
        }
    }
}

impl OracleConfig {
    /// Create a config for `api_key` with default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read the oracle settings from the environment.
    ///
    /// `GROQ_API_KEY` (or `OPENAI_API_KEY`) supplies the key,
    /// `SCRAPELITE_API_URL` and `SCRAPELITE_MODEL` override the defaults.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut cfg = Self::default();
        if let Some(key) = non_empty("GROQ_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            cfg.api_key = key;
        }
        if let Some(url) = non_empty("SCRAPELITE_API_URL") {
            cfg.api_url = url;
        }
        if let Some(model) = non_empty("SCRAPELITE_MODEL") {
            cfg.model = model;
        }
        cfg
    }

    /// Use a custom endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp.clamp(0.0, 2.0);
        self
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Oracle usage counters for one invocation.
///
/// Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct UsageStats {
    /// Total prompt tokens used.
    pub prompt_tokens: AtomicU64,
    /// Total completion tokens used.
    pub completion_tokens: AtomicU64,
    /// Total oracle calls made.
    pub llm_calls: AtomicU64,
}

impl UsageStats {
    /// Create new usage stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tokens from an oracle response.
    pub fn add_tokens(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
    }

    /// Increment the oracle call count.
    pub fn increment_llm_calls(&self) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`UsageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Total prompt tokens.
    pub prompt_tokens: u64,
    /// Total completion tokens.
    pub completion_tokens: u64,
    /// Total oracle calls.
    pub llm_calls: u64,
}

impl UsageSnapshot {
    /// Get total tokens.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_config_defaults() {
        let cfg = ScrapeConfig::default();
        assert_eq!(cfg.max_iterations, 1);
        assert_eq!(cfg.max_actions_per_plan, 3);
        assert_eq!(cfg.action_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.post_action_idle_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.navigation_idle_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.action_pacing(), Duration::from_millis(500));
        assert_eq!(cfg.extraction_max_chars, 6_000);
        assert_eq!(cfg.output_path, "data.json");
    }

    #[test]
    fn test_iteration_budget_never_zero() {
        let cfg = ScrapeConfig::new().with_max_iterations(0);
        assert_eq!(cfg.iteration_budget(), 1);

        let mut cfg = ScrapeConfig::new();
        cfg.max_iterations = 0;
        assert_eq!(cfg.iteration_budget(), 1);
    }

    #[test]
    fn test_scrape_config_partial_json() {
        let cfg: ScrapeConfig =
            serde_json::from_str(r#"{"max_iterations": 4, "required_fields": ["title"]}"#)
                .unwrap();
        assert_eq!(cfg.max_iterations, 4);
        assert_eq!(cfg.required_fields, vec!["title".to_string()]);
        assert_eq!(cfg.scroll_offset, 500);
    }

    #[test]
    fn test_oracle_config_never_serializes_key() {
        let cfg = OracleConfig::new("gsk-secret").with_model("m");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("gsk-secret"));
        assert!(json.contains("\"model\":\"m\""));
        assert!(cfg.is_configured());
        assert!(!OracleConfig::default().is_configured());
    }

    #[test]
    fn test_usage_stats_snapshot() {
        let stats = UsageStats::new();
        stats.increment_llm_calls();
        stats.add_tokens(100, 20);
        stats.increment_llm_calls();
        stats.add_tokens(50, 5);

        let snap = stats.snapshot();
        assert_eq!(snap.llm_calls, 2);
        assert_eq!(snap.total_tokens(), 175);
    }
}
