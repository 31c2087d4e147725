//! Planning oracle adapter.
//!
//! Turns an inventory and a goal into a [`Plan`]. Replies the planner cannot
//! make sense of are logged and become the empty plan; only a failed oracle
//! round trip surfaces as an error.

use super::actions::{Action, Plan, ScrollDirection};
use super::helpers::{log_preview, strip_code_fence};
use super::prompts::{planner_prompt, PLANNER_SYSTEM_PROMPT};
use crate::config::ScrapeConfig;
use crate::error::AgentResult;
use crate::llm::Message;
use crate::oracle::Oracle;
use crate::page::ElementHandle;
use serde_json::{Map, Value};

/// Why an oracle reply was rejected as a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The reply is not JSON.
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The reply is JSON but not an array.
    #[error("expected a JSON array of commands, got {0}")]
    NotAnArray(&'static str),
    /// An array entry is not an object.
    #[error("command {0} is not an object")]
    NotAnObject(usize),
    /// The verb is missing or not in the vocabulary.
    #[error("command {index} has unknown action {verb:?}")]
    UnknownVerb {
        /// Position in the reply.
        index: usize,
        /// Verb as given.
        verb: String,
    },
    /// A verb that needs a target came without one.
    #[error("command {index} ({verb}) requires an index")]
    MissingHandle {
        /// Position in the reply.
        index: usize,
        /// Normalized verb.
        verb: &'static str,
    },
    /// The target is not a non-negative integer.
    #[error("command {index} has invalid index {value}")]
    InvalidHandle {
        /// Position in the reply.
        index: usize,
        /// Offending value.
        value: String,
    },
}

/// Parsing limits applied to every plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Actions kept per plan.
    pub max_actions: usize,
    /// Seconds a wait without a usable value sleeps.
    pub default_wait_secs: u64,
    /// Upper bound on a wait.
    pub max_wait_secs: u64,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self::from(&ScrapeConfig::default())
    }
}

impl From<&ScrapeConfig> for PlanLimits {
    fn from(cfg: &ScrapeConfig) -> Self {
        Self {
            max_actions: cfg.max_actions_per_plan.max(1),
            default_wait_secs: cfg.default_wait_secs,
            max_wait_secs: cfg.max_wait_secs,
        }
    }
}

/// Asks the oracle for the next actions.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    limits: PlanLimits,
}

impl Planner {
    /// Create a planner with the given limits.
    pub fn new(limits: PlanLimits) -> Self {
        Self { limits }
    }

    /// Limits in effect.
    pub fn limits(&self) -> &PlanLimits {
        &self.limits
    }

    /// Ask the oracle what to do next.
    ///
    /// Malformed replies yield an empty plan. Errors are transport failures
    /// only.
    pub async fn plan(&self, oracle: &Oracle, inventory: &str, goal: &str) -> AgentResult<Plan> {
        let messages = vec![
            Message::system(PLANNER_SYSTEM_PROMPT),
            Message::user(planner_prompt(inventory, goal, self.limits.max_actions)),
        ];

        let reply = oracle.complete(messages).await?;
        log::debug!("planner reply: {}", log_preview(&reply));

        Ok(self.parse_or_empty(&reply))
    }

    /// Parse a reply, logging and discarding it when it is malformed.
    pub fn parse_or_empty(&self, reply: &str) -> Plan {
        match self.parse_plan(reply) {
            Ok(plan) => plan,
            Err(e) => {
                log::warn!("discarding malformed plan ({}): {}", e, log_preview(reply));
                Plan::empty()
            }
        }
    }

    /// Parse a reply into a plan, truncated to the action cap.
    pub fn parse_plan(&self, reply: &str) -> Result<Plan, PlanError> {
        let body = strip_code_fence(reply);
        let value: Value = serde_json::from_str(body)?;

        let mut items = match value {
            Value::Array(items) => items,
            other => return Err(PlanError::NotAnArray(json_kind(&other))),
        };

        // Commands past the cap are dropped unread.
        if items.len() > self.limits.max_actions {
            log::warn!(
                "plan had {} actions, keeping the first {}",
                items.len(),
                self.limits.max_actions
            );
            items.truncate(self.limits.max_actions);
        }

        let mut actions = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let obj = item.as_object().ok_or(PlanError::NotAnObject(index))?;
            actions.push(self.parse_command(index, obj)?);
        }

        Ok(Plan::new(actions))
    }

    fn parse_command(&self, index: usize, obj: &Map<String, Value>) -> Result<Action, PlanError> {
        let verb_raw = obj.get("action").and_then(Value::as_str).unwrap_or_default();
        let verb = normalize_verb(verb_raw);

        let handle = parse_handle(index, obj.get("index"))?;
        let value = obj.get("value").filter(|v| !v.is_null());

        let require = |verb: &'static str| handle.ok_or(PlanError::MissingHandle { index, verb });

        let action = match verb.as_str() {
            "click" => Action::Click {
                handle: require("click")?,
            },
            "fill" => Action::Fill {
                handle: require("fill")?,
                value: value_text(value),
            },
            "press_enter" => Action::PressEnter { handle },
            "select" => Action::Select {
                handle: require("select")?,
                value: value_text(value),
            },
            "scroll" => Action::Scroll {
                direction: value
                    .map(|v| ScrollDirection::parse(&value_text(Some(v))))
                    .unwrap_or_default(),
            },
            "wait" => Action::Wait {
                seconds: self.wait_seconds(value),
            },
            _ => {
                return Err(PlanError::UnknownVerb {
                    index,
                    verb: verb_raw.to_string(),
                })
            }
        };

        Ok(action)
    }

    fn wait_seconds(&self, value: Option<&Value>) -> u64 {
        let parsed = match value {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            }
            _ => None,
        };

        parsed
            .unwrap_or(self.limits.default_wait_secs)
            .min(self.limits.max_wait_secs)
    }
}

fn normalize_verb(verb: &str) -> String {
    verb.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn parse_handle(index: usize, value: Option<&Value>) -> Result<Option<ElementHandle>, PlanError> {
    let Some(v) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let parsed = match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    parsed
        .map(|n| Some(ElementHandle(n)))
        .ok_or_else(|| PlanError::InvalidHandle {
            index,
            value: v.to_string(),
        })
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> Planner {
        Planner::default()
    }

    #[test]
    fn test_parse_search_plan() {
        let plan = planner()
            .parse_plan(
                r#"[{"action": "fill", "index": 0, "value": "weather"},
                    {"action": "press_enter", "index": 0}]"#,
            )
            .unwrap();

        assert_eq!(
            plan.actions,
            vec![
                Action::Fill {
                    handle: ElementHandle(0),
                    value: "weather".into()
                },
                Action::PressEnter {
                    handle: Some(ElementHandle(0))
                },
            ]
        );
    }

    #[test]
    fn test_fenced_reply_parses_like_unfenced() {
        let bare = r#"[{"action": "click", "index": 3}]"#;
        let fenced = format!("```json\n{}\n```", bare);
        let p = planner();
        assert_eq!(p.parse_plan(bare).unwrap(), p.parse_plan(&fenced).unwrap());
    }

    #[test]
    fn test_empty_array_is_empty_plan() {
        assert!(planner().parse_plan("[]").unwrap().is_empty());
        assert!(planner().parse_plan("```\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_replies_become_empty_plans() {
        let p = planner();
        for reply in [
            "I think you should click the button",
            r#"{"action": "click", "index": 1}"#,
            r#"[{"action": "hover", "index": 1}]"#,
            r#"[{"action": "click"}]"#,
            r#"[{"action": "fill", "value": "x"}]"#,
            r#"[{"action": "click", "index": -1}]"#,
            r#"[{"action": "click", "index": "first"}]"#,
            r#"["click"]"#,
            "",
        ] {
            assert!(p.parse_plan(reply).is_err(), "accepted {:?}", reply);
            assert!(p.parse_or_empty(reply).is_empty());
        }
    }

    #[test]
    fn test_error_kinds() {
        let p = planner();
        assert!(matches!(p.parse_plan("nope"), Err(PlanError::Json(_))));
        assert!(matches!(p.parse_plan("{}"), Err(PlanError::NotAnArray("an object"))));
        assert!(matches!(
            p.parse_plan(r#"[{"action": "jump"}]"#),
            Err(PlanError::UnknownVerb { index: 0, .. })
        ));
        assert!(matches!(
            p.parse_plan(r#"[{"action": "wait"}, {"action": "select", "value": "x"}]"#),
            Err(PlanError::MissingHandle { index: 1, verb: "select" })
        ));
    }

    #[test]
    fn test_lenient_fields() {
        let plan = planner()
            .parse_plan(
                r#"[{"action": "Press-Enter"},
                    {"action": "CLICK", "index": "4"},
                    {"action": "fill", "index": 2, "value": 12345}]"#,
            )
            .unwrap();

        assert_eq!(plan.actions[0], Action::PressEnter { handle: None });
        assert_eq!(
            plan.actions[1],
            Action::Click {
                handle: ElementHandle(4)
            }
        );
        assert_eq!(
            plan.actions[2],
            Action::Fill {
                handle: ElementHandle(2),
                value: "12345".into()
            }
        );
    }

    #[test]
    fn test_scroll_and_wait_values() {
        let plan = planner()
            .parse_plan(
                r#"[{"action": "scroll", "value": "up"},
                    {"action": "scroll"},
                    {"action": "wait", "value": "5"}]"#,
            )
            .unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::Scroll {
                    direction: ScrollDirection::Up
                },
                Action::Scroll {
                    direction: ScrollDirection::Down
                },
                Action::Wait { seconds: 5 },
            ]
        );

        let p = planner();
        assert_eq!(p.wait_seconds(None), 2);
        assert_eq!(p.wait_seconds(Some(&serde_json::json!("soon"))), 2);
        assert_eq!(p.wait_seconds(Some(&serde_json::json!(1.6))), 2);
        assert_eq!(p.wait_seconds(Some(&serde_json::json!(600))), 30);
    }

    #[test]
    fn test_plan_is_capped() {
        let reply = r#"[{"action": "wait", "value": 0}, {"action": "wait", "value": 0},
                        {"action": "wait", "value": 0}, {"action": "wait", "value": 0},
                        {"action": "wait", "value": 0}]"#;
        assert_eq!(planner().parse_plan(reply).unwrap().len(), 3);
    }

    #[test]
    fn test_commands_past_the_cap_are_not_validated() {
        let reply = r#"[{"action": "click", "index": 0}, {"action": "click", "index": 1},
                        {"action": "click", "index": 2}, {"action": "hover", "index": 3},
                        "garbage"]"#;
        let plan = planner().parse_plan(reply).unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|a| a.verb() == "click"));

        // A bad command inside the cap still rejects the reply.
        let reply = r#"[{"action": "click", "index": 0}, {"action": "hover", "index": 1}]"#;
        assert!(matches!(
            planner().parse_plan(reply),
            Err(PlanError::UnknownVerb { index: 1, .. })
        ));
    }

    #[test]
    fn test_unindexed_handle_is_not_rejected() {
        // Out-of-range handles are left for the executor to report.
        let plan = planner()
            .parse_plan(r#"[{"action": "click", "index": 999}]"#)
            .unwrap();
        assert_eq!(plan.actions[0].handle(), Some(ElementHandle(999)));
    }
}
