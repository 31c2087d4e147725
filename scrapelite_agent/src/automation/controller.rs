//! The goal-seeking interaction loop.
//!
//! `Navigating -> Iterating -> Extracting -> Done`, never backwards. The only
//! early exit from `Iterating` is an empty plan; everything else runs until
//! the iteration budget is spent.

use super::executor::ActionExecutor;
use super::indexer::{self, IndexPass};
use super::planner::{PlanLimits, Planner};
use crate::config::{ScrapeConfig, UsageSnapshot};
use crate::extraction::{ExtractionResult, Extractor};
use crate::oracle::Oracle;
use crate::page::{wait_for_idle_within, within, BrowserPage};
use serde::{Deserialize, Serialize};

/// Phase of one scrape invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Loading the target page.
    Navigating,
    /// Index, plan, act.
    Iterating,
    /// Normalizing the page and extracting data.
    Extracting,
    /// Page released, result ready.
    Done,
}

/// Why iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The oracle returned an empty plan.
    GoalReached,
    /// The iteration budget ran out first.
    BudgetExhausted,
}

/// Everything a scrape produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// Validated extraction result.
    pub result: ExtractionResult,
    /// Iterations started.
    pub iterations: usize,
    /// Why iteration stopped.
    pub termination: Termination,
    /// Actions that failed across all iterations.
    pub actions_failed: usize,
    /// Iterations whose planning call failed.
    pub planning_failures: usize,
    /// States entered, in order.
    pub states: Vec<LoopState>,
    /// Oracle usage of the invocation.
    pub usage: UsageSnapshot,
}

/// Drives one page toward a goal.
#[derive(Debug, Clone)]
pub struct LoopController {
    config: ScrapeConfig,
    planner: Planner,
    executor: ActionExecutor,
    extractor: Extractor,
}

impl Default for LoopController {
    fn default() -> Self {
        Self::new(ScrapeConfig::default())
    }
}

impl LoopController {
    /// Build a controller and its stages from `config`.
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            planner: Planner::new(PlanLimits::from(&config)),
            executor: ActionExecutor::from_config(&config),
            extractor: Extractor::new(config.extraction_max_chars),
            config,
        }
    }

    /// Settings in effect.
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run the loop on `page` and release it afterwards.
    pub async fn run<P: BrowserPage + ?Sized>(
        &self,
        page: &P,
        oracle: &Oracle,
        url: &str,
        goal: &str,
    ) -> ScrapeReport {
        let mut states = Vec::with_capacity(4);

        enter(&mut states, LoopState::Navigating);
        self.navigate(page, url).await;

        enter(&mut states, LoopState::Iterating);
        let budget = self.config.iteration_budget();
        let mut iterations = 0;
        let mut termination = Termination::BudgetExhausted;
        let mut actions_failed = 0;
        let mut planning_failures = 0;

        while iterations < budget {
            iterations += 1;
            log::info!("iteration {}/{}", iterations, budget);

            let pass = self.index(page).await;
            log::info!("found {} interactive elements", pass.len());

            let plan = match self.planner.plan(oracle, &pass.inventory_text(), goal).await {
                Ok(plan) => plan,
                Err(e) => {
                    log::warn!("planning failed, skipping iteration {}: {}", iterations, e);
                    planning_failures += 1;
                    self.settle().await;
                    continue;
                }
            };

            if plan.is_empty() {
                log::info!("no more actions needed, data should be visible");
                termination = Termination::GoalReached;
                break;
            }

            log::info!(
                "executing {} action(s): {}",
                plan.len(),
                plan.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
            );
            let report = self.executor.execute(page, &plan).await;
            actions_failed += report.failed_count();

            self.settle().await;
        }

        if termination == Termination::BudgetExhausted {
            log::info!("iteration budget of {} spent, extracting anyway", budget);
        }

        enter(&mut states, LoopState::Extracting);
        let result = self.extract(page, oracle, goal).await;

        enter(&mut states, LoopState::Done);
        if let Err(e) = within(self.config.navigation_timeout(), page.close()).await {
            log::warn!("failed to release page: {}", e);
        }

        ScrapeReport {
            result,
            iterations,
            termination,
            actions_failed,
            planning_failures,
            states,
            usage: oracle.usage(),
        }
    }

    async fn navigate<P: BrowserPage + ?Sized>(&self, page: &P, url: &str) {
        log::info!("opening {}", url);
        match tokio::time::timeout(self.config.navigation_timeout(), page.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("navigation to {} failed (continuing): {}", url, e),
            Err(_) => log::warn!(
                "navigation to {} exceeded {:?} (continuing)",
                url,
                self.config.navigation_timeout()
            ),
        }
        wait_for_idle_within(page, self.config.navigation_idle_timeout()).await;
    }

    async fn index<P: BrowserPage + ?Sized>(&self, page: &P) -> IndexPass {
        let bound = self.config.action_timeout();
        match indexer::index(page, bound).await {
            Ok(pass) => pass,
            Err(e) => {
                log::warn!("indexing failed, planning without elements: {}", e);
                IndexPass {
                    url: within(bound, page.url()).await.unwrap_or_default(),
                    title: within(bound, page.title()).await.unwrap_or_default(),
                    ..Default::default()
                }
            }
        }
    }

    async fn extract<P: BrowserPage + ?Sized>(
        &self,
        page: &P,
        oracle: &Oracle,
        goal: &str,
    ) -> ExtractionResult {
        let html = within(self.config.navigation_timeout(), page.content())
            .await
            .unwrap_or_else(|e| {
                log::warn!("could not read page content: {}", e);
                String::new()
            });

        let text = scrapelite_agent_html::page_to_markdown(&html);
        log::info!("extracting from {} chars of page text", text.chars().count());

        let result = self
            .extractor
            .extract_validated(oracle, &text, goal, &self.config.required_fields)
            .await;

        if !result.valid {
            log::warn!("extraction invalid: {}", result.errors.join("; "));
        }
        result
    }

    async fn settle(&self) {
        let pause = self.config.iteration_settle();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

fn enter(states: &mut Vec<LoopState>, state: LoopState) {
    log::debug!("loop state -> {:?}", state);
    states.push(state);
}
