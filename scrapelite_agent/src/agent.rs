//! Scrape agent: one oracle plus settings, running the loop per invocation.

use crate::automation::{LoopController, ScrapeReport};
use crate::config::{OracleConfig, ScrapeConfig, UsageSnapshot};
use crate::error::{AgentError, AgentResult};
use crate::extraction::ExtractionResult;
use crate::llm::LLMProvider;
use crate::oracle::Oracle;
use crate::page::BrowserPage;
use std::path::PathBuf;

/// Drives a browser toward a goal and extracts the result.
///
/// # Example
/// ```ignore
/// use scrapelite_agent::ScrapeAgent;
///
/// let agent = ScrapeAgent::builder()
///     .with_max_iterations(3)
///     .with_required_fields(["temperature"])
///     .build()?;
///
/// let report = agent.scrape("https://duckduckgo.com", "current weather in Oslo").await?;
/// println!("{}", serde_json::to_string_pretty(&report.result)?);
/// ```
#[derive(Debug)]
pub struct ScrapeAgent {
    oracle: Oracle,
    controller: LoopController,
}

impl ScrapeAgent {
    /// Create a new agent builder.
    pub fn builder() -> ScrapeAgentBuilder {
        ScrapeAgentBuilder::new()
    }

    /// Settings in effect.
    pub fn config(&self) -> &ScrapeConfig {
        self.controller.config()
    }

    /// Oracle usage so far.
    pub fn usage(&self) -> UsageSnapshot {
        self.oracle.usage()
    }

    /// Launch Chrome, run the loop on `url` and close the browser.
    #[cfg(feature = "chrome")]
    pub async fn scrape(&self, url: &str, goal: &str) -> AgentResult<ScrapeReport> {
        let page = crate::browser::ChromePage::launch(self.config().headless).await?;
        Ok(self.scrape_with_page(&page, url, goal).await)
    }

    /// Run the loop on an already open page. The page is closed afterwards.
    pub async fn scrape_with_page<P: BrowserPage + ?Sized>(
        &self,
        page: &P,
        url: &str,
        goal: &str,
    ) -> ScrapeReport {
        log::info!("scraping {} for goal: {}", url, goal);
        self.controller.run(page, &self.oracle, url, goal).await
    }

    /// Write `result` as JSON to the configured output path.
    pub async fn persist(&self, result: &ExtractionResult) -> AgentResult<PathBuf> {
        let path = PathBuf::from(&self.config().output_path);
        let bytes = serde_json::to_vec(result)?;
        tokio::fs::write(&path, bytes).await?;
        log::info!("saved result to {}", path.display());
        Ok(path)
    }
}

/// Builder for [`ScrapeAgent`].
pub struct ScrapeAgentBuilder {
    config: ScrapeConfig,
    oracle: Option<Oracle>,
    provider: Option<Box<dyn LLMProvider>>,
    oracle_config: Option<OracleConfig>,
}

impl Default for ScrapeAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeAgentBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: ScrapeConfig::default(),
            oracle: None,
            provider: None,
            oracle_config: None,
        }
    }

    /// Set the scrape configuration.
    pub fn with_config(mut self, config: ScrapeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a ready oracle.
    pub fn with_oracle(mut self, oracle: Oracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Use a custom LLM provider.
    pub fn with_provider(mut self, provider: Box<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Connect to an OpenAI-compatible endpoint with these settings.
    pub fn with_oracle_config(mut self, cfg: OracleConfig) -> Self {
        self.oracle_config = Some(cfg);
        self
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.config = self.config.with_max_iterations(n);
        self
    }

    /// Set the fields the extracted object must contain.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_required_fields(fields);
        self
    }

    /// Build the agent.
    ///
    /// The oracle comes from, in order: [`with_oracle`](Self::with_oracle),
    /// [`with_provider`](Self::with_provider),
    /// [`with_oracle_config`](Self::with_oracle_config), the environment.
    pub fn build(self) -> AgentResult<ScrapeAgent> {
        let oracle = match (self.oracle, self.provider) {
            (Some(oracle), _) => oracle,
            (None, Some(provider)) => Oracle::new(provider),
            (None, None) => {
                let cfg = self.oracle_config.unwrap_or_else(OracleConfig::from_env);
                if !cfg.is_configured() {
                    return Err(AgentError::NotConfigured(
                        "oracle api key (set GROQ_API_KEY)",
                    ));
                }
                Oracle::from_config(&cfg)?
            }
        };

        log::debug!("scrape agent using {} provider", oracle.provider_name());

        Ok(ScrapeAgent {
            oracle,
            controller: LoopController::new(self.config),
        })
    }
}
