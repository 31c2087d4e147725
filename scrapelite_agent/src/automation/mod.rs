//! The interaction loop: indexing, planning, execution and control.

mod actions;
mod controller;
mod executor;
pub(crate) mod helpers;
mod indexer;
mod planner;
pub(crate) mod prompts;

pub use actions::{
    Action, ActionFailure, ActionOutcome, ActionStatus, ExecutionReport, Plan, ScrollDirection,
};
pub use controller::{LoopController, LoopState, ScrapeReport, Termination};
pub use executor::{scroll_script, ActionExecutor, ENTER_KEY};
pub use helpers::{strip_code_fence, truncate_chars};
pub use indexer::{
    index, ElementDescriptor, ElementKind, IndexPass, RawCandidate, CLEAR_MARKERS_SCRIPT,
    SCAN_SCRIPT,
};
pub use planner::{PlanError, PlanLimits, Planner};
pub use prompts::{PLANNER_SYSTEM_PROMPT, PLANNER_USER_TEMPLATE, EXTRACTION_USER_TEMPLATE};
