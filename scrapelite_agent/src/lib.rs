//! # Scrapelite Agent
//!
//! Drives a browser toward a natural-language goal, then extracts the
//! requested data as validated JSON.
//!
//! Each invocation alternates between observing the page, asking a language
//! model for the next few actions and executing them, until the model returns
//! an empty plan or the iteration budget runs out. The final page is turned
//! into Markdown and handed back to the model for extraction.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scrapelite_agent::ScrapeAgent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GROQ_API_KEY from the environment.
//!     let agent = ScrapeAgent::builder()
//!         .with_max_iterations(2)
//!         .with_required_fields(["title"])
//!         .build()?;
//!
//!     let report = agent
//!         .scrape("https://news.ycombinator.com", "get the top 5 post titles")
//!         .await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&report.result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom browsers
//!
//! The loop only needs [`BrowserPage`]. Implement it for another engine and
//! call [`ScrapeAgent::scrape_with_page`].
//!
//! ## Feature Flags
//!
//! - `chrome` (default) - local Chrome via chromey

#![warn(missing_docs)]

mod agent;
pub mod automation;
mod config;
mod error;
mod extraction;
mod llm;
mod oracle;
mod page;

#[cfg(feature = "chrome")]
pub mod browser;

// Re-exports
pub use agent::{ScrapeAgent, ScrapeAgentBuilder};
pub use config::{
    OracleConfig, ScrapeConfig, UsageSnapshot, UsageStats, DEFAULT_API_URL, DEFAULT_MODEL,
};
pub use error::{AgentError, AgentResult};
pub use extraction::{validate_extraction, ExtractionResult, Extractor};
pub use llm::{
    CompletionOptions, CompletionResponse, LLMProvider, Message, OpenAIProvider, TokenUsage,
};
pub use oracle::Oracle;
pub use page::{
    wait_for_idle_within, within, BrowserPage, ElementHandle, PageError, PageResult, MARKER_ATTRIBUTE,
};

// Loop re-exports
pub use automation::{
    Action, ActionExecutor, ActionFailure, ActionOutcome, ActionStatus, ElementDescriptor,
    ElementKind, ExecutionReport, IndexPass, LoopController, LoopState, Plan, PlanError,
    PlanLimits, Planner, ScrapeReport, ScrollDirection, Termination,
};

#[cfg(feature = "chrome")]
pub use browser::ChromePage;
