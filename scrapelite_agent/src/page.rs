//! Browser capability interface.
//!
//! The agent never talks to a browser engine directly. Everything it needs
//! from a live page goes through [`BrowserPage`], which the Chrome backend
//! (`chrome` feature) implements and tests replace with an in-memory fake.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Attribute the indexer writes onto every element it hands out.
pub const MARKER_ATTRIBUTE: &str = "data-idx";

/// Result type for page operations.
pub type PageResult<T> = Result<T, PageError>;

/// Errors raised by a [`BrowserPage`] implementation.
#[derive(Debug, Error)]
pub enum PageError {
    /// The operation did not finish within its bound.
    #[error("operation timed out")]
    Timeout,
    /// A required node was not present.
    #[error("element not found")]
    NotFound,
    /// Script evaluation failed or returned an unexpected shape.
    #[error("script error: {0}")]
    Script(String),
    /// Navigation could not be started.
    #[error("navigation failed: {0}")]
    Navigation(String),
    /// Any other engine error.
    #[error("{0}")]
    Other(String),
}

/// Integer handle of one interactive element within a single indexing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u32);

impl ElementHandle {
    /// CSS selector matching the element carrying this handle's marker.
    pub fn selector(&self) -> String {
        format!(r#"[{}="{}"]"#, MARKER_ATTRIBUTE, self.0)
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operations the interaction loop consumes from a live page.
///
/// Implementations do not apply timeouts of their own; callers bound every
/// call with `tokio::time::timeout`.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// A located element, valid until the page mutates.
    type Element: Send + Sync;

    /// Start navigating to `url`.
    async fn goto(&self, url: &str) -> PageResult<()>;

    /// Resolve once the network has gone quiet.
    async fn wait_for_network_idle(&self) -> PageResult<()>;

    /// Evaluate a script in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> PageResult<serde_json::Value>;

    /// Find the element currently carrying `handle`'s marker.
    async fn locate(&self, handle: ElementHandle) -> PageResult<Option<Self::Element>>;

    /// Click an element.
    async fn click(&self, element: &Self::Element) -> PageResult<()>;

    /// Replace an input's value.
    async fn fill(&self, element: &Self::Element, value: &str) -> PageResult<()>;

    /// Press a key on an element, or on the page when `element` is `None`.
    async fn press(&self, element: Option<&Self::Element>, key: &str) -> PageResult<()>;

    /// Choose the option of a `<select>` whose value or label equals `value`.
    async fn select_option(&self, element: &Self::Element, value: &str) -> PageResult<()>;

    /// Full HTML of the current document.
    async fn content(&self) -> PageResult<String>;

    /// Document title.
    async fn title(&self) -> PageResult<String>;

    /// Current URL.
    async fn url(&self) -> PageResult<String>;

    /// Release the page and its browser.
    async fn close(&self) -> PageResult<()>;
}

/// Run a page operation, failing with [`PageError::Timeout`] once `timeout`
/// elapses.
pub async fn within<T, F>(timeout: Duration, op: F) -> PageResult<T>
where
    F: Future<Output = PageResult<T>>,
{
    tokio::time::timeout(timeout, op)
        .await
        .unwrap_or(Err(PageError::Timeout))
}

/// Wait for network idle, giving up silently after `timeout`.
///
/// Returns `true` when the page went idle within the bound.
pub async fn wait_for_idle_within<P: BrowserPage + ?Sized>(page: &P, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, page.wait_for_network_idle()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::debug!("network idle wait failed (non-fatal): {}", e);
            false
        }
        Err(_) => {
            log::debug!("network idle not reached within {:?} (non-fatal)", timeout);
            false
        }
    }
}
