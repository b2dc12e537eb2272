//! Rule and action declarations: the data a rule file deserializes into.

use crate::error::EngineError;
use crate::event::EventKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResultKind {
    #[default]
    Ok,
    Warn,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyOp {
    Set,
    Append,
    Prepend,
    Replace,
}

fn default_true() -> bool {
    true
}

/// One action a rule may perform. Exactly one variant per declaration,
/// tagged by `kind` in TOML/JSON (e.g. `kind = "deny"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Log {
        #[serde(default = "default_log_level")]
        level: LogLevel,
    },
    Deny {
        #[serde(default)]
        message: Option<String>,
        #[serde(default = "default_true")]
        interrupt: bool,
    },
    Allow {
        #[serde(default)]
        message: Option<String>,
    },
    Warn {
        #[serde(default)]
        message: Option<String>,
    },
    Suggest {
        message: String,
    },
    Inject {
        content: String,
    },
    Shell {
        #[serde(default)]
        command: Option<String>,
        #[serde(default)]
        script: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Native {
        entrypoint: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Modify {
        field: String,
        op: ModifyOp,
        #[serde(default)]
        value: Option<Value>,
        #[serde(default)]
        pattern: Option<String>,
    },
    Transform {
        entrypoint: String,
    },
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Action {
    /// A short tag for logging/diagnostics, e.g. "deny", "shell".
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Log { .. } => "log",
            Action::Deny { .. } => "deny",
            Action::Allow { .. } => "allow",
            Action::Warn { .. } => "warn",
            Action::Suggest { .. } => "suggest",
            Action::Inject { .. } => "inject",
            Action::Shell { .. } => "shell",
            Action::Native { .. } => "native",
            Action::Modify { .. } => "modify",
            Action::Transform { .. } => "transform",
        }
    }
}

/// A declarative rule: when it applies, what it tests, what it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub events: HashSet<EventKind>,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub priority: RulePriority,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub result: RuleResultKind,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::InvalidRule {
                id: self.id.clone(),
                reason: "id must not be empty".into(),
            });
        }
        if self.events.is_empty() {
            return Err(EngineError::InvalidRule {
                id: self.id.clone(),
                reason: "events set must not be empty".into(),
            });
        }
        for action in &self.actions {
            if let Action::Shell {
                command, script, ..
            } = action
                && command.is_some() == script.is_some()
            {
                return Err(EngineError::InvalidRule {
                    id: self.id.clone(),
                    reason: "shell action needs exactly one of command or script".into(),
                });
            }
        }
        Ok(())
    }

    pub fn applies_to(&self, kind: EventKind) -> bool {
        self.events.contains(&EventKind::All) || self.events.contains(&kind)
    }
}

/// Merge several rule lists, lowest precedence first, keyed by rule id.
/// The highest-precedence body for an id wins, but the id's position in the
/// output preserves first-seen insertion order across all input lists.
pub fn merge_rules(lists_low_to_high: &[Vec<Rule>]) -> Vec<Rule> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: std::collections::HashMap<String, Rule> = std::collections::HashMap::new();

    for list in lists_low_to_high {
        for rule in list {
            if !by_id.contains_key(&rule.id) {
                order.push(rule.id.clone());
            }
            by_id.insert(rule.id.clone(), rule.clone());
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}
