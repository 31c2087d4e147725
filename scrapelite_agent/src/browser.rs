//! Chrome backend for [`BrowserPage`].
//!
//! Launches a local Chrome through chromey, keeps its CDP handler polled on
//! a background task and exposes a single page to the interaction loop.

use crate::page::{BrowserPage, ElementHandle, PageError, PageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;

pub use chromiumoxide::browser::{Browser, BrowserConfig};
pub use chromiumoxide::element::Element;
pub use chromiumoxide::error::CdpError;
pub use chromiumoxide::page::Page;

/// Quiet period after which the network counts as idle.
const NETWORK_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Focuses a form control, clears its value and notifies listeners.
const CLEAR_VALUE_FN: &str = r#"function() {
  this.focus();
  this.value = '';
  this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Timeout => PageError::Timeout,
            CdpError::NotFound => PageError::NotFound,
            other => PageError::Other(other.to_string()),
        }
    }
}

/// One Chrome process with one page.
pub struct ChromePage {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromePage {
    /// Launch Chrome and open a blank page.
    pub async fn launch(headless: bool) -> PageResult<Self> {
        let builder = BrowserConfig::builder();
        let builder = if headless { builder } else { builder.with_head() };
        let config = builder.build().map_err(PageError::Other)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    match e {
                        CdpError::Ws(_)
                        | CdpError::LaunchExit(_, _)
                        | CdpError::LaunchTimeout(_)
                        | CdpError::LaunchIo(_, _) => break,
                        _ => continue,
                    }
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        log::info!("launched chrome (headless: {})", headless);

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        })
    }

    /// The underlying chromey page.
    pub fn inner(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    type Element = Element;

    async fn goto(&self, url: &str) -> PageResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> PageResult<()> {
        use chromiumoxide::cdp::browser_protocol::network::EventLoadingFinished;

        let mut events = self.page.event_listener::<EventLoadingFinished>().await?;
        loop {
            match tokio::time::timeout(NETWORK_QUIET_PERIOD, events.next()).await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> PageResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn locate(&self, handle: ElementHandle) -> PageResult<Option<Element>> {
        let mut found = self.page.find_elements(handle.selector()).await?;
        if found.len() > 1 {
            log::debug!("{} elements carry marker {}", found.len(), handle);
        }
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn click(&self, element: &Element) -> PageResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn fill(&self, element: &Element, value: &str) -> PageResult<()> {
        element.call_js_fn(CLEAR_VALUE_FN, false).await?;
        if !value.is_empty() {
            element.type_str(value).await?;
        }
        Ok(())
    }

    async fn press(&self, element: Option<&Element>, key: &str) -> PageResult<()> {
        match element {
            Some(el) => {
                el.focus().await?;
                el.press_key(key).await?;
            }
            None => {
                self.page.press_key(key).await?;
            }
        }
        Ok(())
    }

    async fn select_option(&self, element: &Element, value: &str) -> PageResult<()> {
        let wanted = serde_json::to_string(value).map_err(|e| PageError::Script(e.to_string()))?;
        let decl = format!(
            r#"function() {{
  const want = {wanted};
  const opt = Array.from(this.options || []).find((o) => o.value === want || o.label === want || o.text.trim() === want);
  if (!opt) return false;
  this.value = opt.value;
  this.dispatchEvent(new Event('input', {{ bubbles: true }}));
  this.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}}"#
        );

        let ret = element.call_js_fn(decl, false).await?;
        match ret.result.value.as_ref().and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(PageError::Script(format!("no option matching {}", wanted))),
        }
    }

    async fn content(&self) -> PageResult<String> {
        Ok(self.page.content().await?)
    }

    async fn title(&self) -> PageResult<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn url(&self) -> PageResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn close(&self) -> PageResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            log::debug!("chrome did not exit cleanly: {}", e);
        }
        self.handler.abort();

        closed.map(|_| ()).map_err(PageError::from)
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
