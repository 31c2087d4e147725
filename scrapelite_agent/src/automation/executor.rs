//! Action execution against a live page.
//!
//! Every action runs on its own: a missing target, a timeout or a page error
//! is recorded for that action and execution moves on to the next one.

use super::actions::{
    Action, ActionFailure, ActionOutcome, ActionStatus, ExecutionReport, Plan,
};
use crate::config::ScrapeConfig;
use crate::page::{wait_for_idle_within, BrowserPage, ElementHandle};
use std::future::Future;
use std::time::{Duration, Instant};

/// Key pressed by `press_enter`.
pub const ENTER_KEY: &str = "Enter";

/// Script scrolling the viewport vertically by `dy` pixels.
pub fn scroll_script(dy: i64) -> String {
    format!("window.scrollBy(0, {})", dy)
}

/// Runs plans with bounded, isolated actions.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    action_timeout: Duration,
    post_action_idle_timeout: Duration,
    pacing: Duration,
    scroll_offset: i64,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default())
    }
}

impl ActionExecutor {
    /// Build an executor from scrape settings.
    pub fn from_config(cfg: &ScrapeConfig) -> Self {
        Self {
            action_timeout: cfg.action_timeout(),
            post_action_idle_timeout: cfg.post_action_idle_timeout(),
            pacing: cfg.action_pacing(),
            scroll_offset: cfg.scroll_offset,
        }
    }

    /// Execute `plan` in order. Never fails as a whole.
    pub async fn execute<P: BrowserPage + ?Sized>(&self, page: &P, plan: &Plan) -> ExecutionReport {
        let mut report = ExecutionReport {
            outcomes: Vec::with_capacity(plan.len()),
        };

        for action in plan.iter() {
            log::debug!("executing {}", action);
            let started = Instant::now();

            let status = match self.run(page, action).await {
                Ok(()) => ActionStatus::Ok,
                Err(failure) => {
                    log::warn!("{} failed: {}", action, failure);
                    ActionStatus::Failed(failure)
                }
            };

            report.outcomes.push(ActionOutcome {
                action: action.clone(),
                status,
                duration_ms: started.elapsed().as_millis() as u64,
            });

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        if report.any_failed() {
            log::info!(
                "{} of {} actions failed",
                report.failed_count(),
                report.outcomes.len()
            );
        }

        report
    }

    async fn run<P: BrowserPage + ?Sized>(&self, page: &P, action: &Action) -> Result<(), ActionFailure> {
        match action {
            Action::Click { handle } => {
                let el = self.resolve(page, *handle).await?;
                self.bounded("click", page.click(&el)).await?;
                wait_for_idle_within(page, self.post_action_idle_timeout).await;
            }
            Action::Fill { handle, value } => {
                let el = self.resolve(page, *handle).await?;
                self.bounded("fill", page.fill(&el, value)).await?;
            }
            Action::PressEnter { handle } => {
                match handle {
                    Some(h) => {
                        let el = self.resolve(page, *h).await?;
                        self.bounded("press_enter", page.press(Some(&el), ENTER_KEY))
                            .await?;
                    }
                    None => {
                        self.bounded("press_enter", page.press(None, ENTER_KEY))
                            .await?;
                    }
                }
                wait_for_idle_within(page, self.post_action_idle_timeout).await;
            }
            Action::Select { handle, value } => {
                let el = self.resolve(page, *handle).await?;
                self.bounded("select", page.select_option(&el, value))
                    .await?;
            }
            Action::Scroll { direction } => {
                let script = scroll_script(direction.signed(self.scroll_offset));
                self.bounded("scroll", page.evaluate(&script)).await?;
            }
            Action::Wait { seconds } => {
                tokio::time::sleep(Duration::from_secs(*seconds)).await;
            }
        }
        Ok(())
    }

    async fn resolve<P: BrowserPage + ?Sized>(
        &self,
        page: &P,
        handle: ElementHandle,
    ) -> Result<P::Element, ActionFailure> {
        self.bounded("locate", page.locate(handle))
            .await?
            .ok_or(ActionFailure::NotFound(handle))
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, ActionFailure>
    where
        F: Future<Output = crate::page::PageResult<T>>,
    {
        match tokio::time::timeout(self.action_timeout, fut).await {
            Ok(res) => res.map_err(ActionFailure::Page),
            Err(_) => Err(ActionFailure::Timeout {
                op,
                after: self.action_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_script() {
        assert_eq!(scroll_script(-500), "window.scrollBy(0, -500)");
        assert_eq!(scroll_script(500), "window.scrollBy(0, 500)");
    }

    #[test]
    fn test_from_config() {
        let cfg = ScrapeConfig::default().with_action_pacing(Duration::ZERO);
        let exec = ActionExecutor::from_config(&cfg);
        assert!(exec.pacing.is_zero());
        assert_eq!(exec.action_timeout, Duration::from_secs(5));
        assert_eq!(exec.scroll_offset, 500);
    }
}
