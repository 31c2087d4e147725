//! Action types and per-action results.

use crate::page::{ElementHandle, PageError};
use std::time::Duration;

/// Direction of a scroll action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Towards the top of the page.
    Up,
    /// Towards the bottom of the page.
    #[default]
    Down,
}

impl ScrollDirection {
    /// Parse a direction; anything but `up` scrolls down.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("up") {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Signed vertical offset for a step of `offset` pixels.
    pub fn signed(self, offset: i64) -> i64 {
        match self {
            Self::Up => -offset.abs(),
            Self::Down => offset.abs(),
        }
    }
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Click an element.
    Click {
        /// Target element.
        handle: ElementHandle,
    },
    /// Replace an input's text.
    Fill {
        /// Target element.
        handle: ElementHandle,
        /// Text to enter.
        value: String,
    },
    /// Press Enter on an element, or on the page without a handle.
    PressEnter {
        /// Target element, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handle: Option<ElementHandle>,
    },
    /// Choose an option of a dropdown.
    Select {
        /// Target element.
        handle: ElementHandle,
        /// Option value or label.
        value: String,
    },
    /// Scroll the viewport by a fixed step.
    Scroll {
        /// Scroll direction.
        #[serde(default)]
        direction: ScrollDirection,
    },
    /// Sleep without touching the page.
    Wait {
        /// Seconds to wait.
        seconds: u64,
    },
}

impl Action {
    /// Lowercase verb name as the oracle spells it.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::PressEnter { .. } => "press_enter",
            Self::Select { .. } => "select",
            Self::Scroll { .. } => "scroll",
            Self::Wait { .. } => "wait",
        }
    }

    /// Element the action targets, if any.
    pub fn handle(&self) -> Option<ElementHandle> {
        match self {
            Self::Click { handle } | Self::Fill { handle, .. } | Self::Select { handle, .. } => {
                Some(*handle)
            }
            Self::PressEnter { handle } => *handle,
            Self::Scroll { .. } | Self::Wait { .. } => None,
        }
    }

    /// Whether a network-idle wait follows the action.
    pub fn may_navigate(&self) -> bool {
        matches!(self, Self::Click { .. } | Self::PressEnter { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Click { handle } => write!(f, "click [{}]", handle),
            Self::Fill { handle, value } => write!(f, "fill [{}] {:?}", handle, value),
            Self::PressEnter { handle: Some(h) } => write!(f, "press_enter [{}]", h),
            Self::PressEnter { handle: None } => write!(f, "press_enter"),
            Self::Select { handle, value } => write!(f, "select [{}] {:?}", handle, value),
            Self::Scroll { direction } => write!(f, "scroll {:?}", direction),
            Self::Wait { seconds } => write!(f, "wait {}s", seconds),
        }
    }
}

/// Ordered actions for one iteration. Empty means the goal is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Plan {
    /// Actions in oracle order.
    pub actions: Vec<Action>,
}

impl Plan {
    /// Create a plan from actions.
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// The termination signal.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the plan has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Iterate the actions.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }
}

/// Why a single action failed.
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    /// No element carries the handle's marker.
    #[error("element [{0}] not found")]
    NotFound(ElementHandle),
    /// The operation exceeded its bound.
    #[error("{op} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Operation that timed out.
        op: &'static str,
        /// Bound that was exceeded.
        after: Duration,
    },
    /// The page reported an error.
    #[error(transparent)]
    Page(#[from] PageError),
}

/// Typed per-action status.
#[derive(Debug)]
pub enum ActionStatus {
    /// The action completed.
    Ok,
    /// The action failed; later actions still ran.
    Failed(ActionFailure),
}

impl ActionStatus {
    /// Whether the action completed.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Result of executing one action.
#[derive(Debug)]
pub struct ActionOutcome {
    /// The action attempted.
    pub action: Action,
    /// How it ended.
    pub status: ActionStatus,
    /// Wall time spent, pacing excluded.
    pub duration_ms: u64,
}

/// Outcome of executing a whole plan.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// One entry per action, in execution order.
    pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    /// Whether every action completed.
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_ok())
    }

    /// Whether any action failed.
    pub fn any_failed(&self) -> bool {
        !self.success()
    }

    /// Number of failed actions.
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.status.is_ok()).count()
    }

    /// Per-action executed flags.
    pub fn executed(&self) -> Vec<bool> {
        self.outcomes.iter().map(|o| o.status.is_ok()).collect()
    }
}
