//! Event model: the lifecycle events the engine is asked to judge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The ten lifecycle events the host may hand to the engine, plus a reserved
/// `All` sentinel used only inside a rule's event set (never on a real event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    PermissionRequest,
    Notification,
    SessionStart,
    SessionEnd,
    Stop,
    SubagentStop,
    PreCompaction,
    /// Sentinel: matches every real event kind. Only legal inside a rule's
    /// `events` set, never as the kind of an actual event.
    #[serde(rename = "all")]
    All,
}

impl EventKind {
    /// The key used both on the wire (`hook_event_name`) and in rule files.
    pub fn as_config_key(&self) -> &'static str {
        match self {
            EventKind::PreToolUse => "PreToolUse",
            EventKind::PostToolUse => "PostToolUse",
            EventKind::UserPromptSubmit => "UserPromptSubmit",
            EventKind::PermissionRequest => "PermissionRequest",
            EventKind::Notification => "Notification",
            EventKind::SessionStart => "SessionStart",
            EventKind::SessionEnd => "SessionEnd",
            EventKind::Stop => "Stop",
            EventKind::SubagentStop => "SubagentStop",
            EventKind::PreCompaction => "PreCompaction",
            EventKind::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    Plan,
    AcceptEdits,
    BypassPermissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSource {
    Startup,
    Resume,
    Clear,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionTrigger {
    Manual,
    Auto,
}

/// Fields shared by every event variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCommon {
    pub session_id: String,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub permission_mode: PermissionMode,
}

/// A single governed lifecycle event. Exactly one variant, matching the
/// `hook_event_name` discriminant on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "hook_event_name")]
pub enum Event {
    PreToolUse {
        #[serde(flatten)]
        common: EventCommon,
        tool_name: String,
        #[serde(default)]
        tool_input: Map<String, Value>,
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    PostToolUse {
        #[serde(flatten)]
        common: EventCommon,
        tool_name: String,
        #[serde(default)]
        tool_input: Map<String, Value>,
        #[serde(default)]
        tool_response: Option<Value>,
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    UserPromptSubmit {
        #[serde(flatten)]
        common: EventCommon,
        prompt: String,
    },
    PermissionRequest {
        #[serde(flatten)]
        common: EventCommon,
        tool_name: String,
        #[serde(default)]
        tool_input: Map<String, Value>,
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    Notification {
        #[serde(flatten)]
        common: EventCommon,
        message: String,
        #[serde(default)]
        kind: Option<String>,
    },
    SessionStart {
        #[serde(flatten)]
        common: EventCommon,
        source: StartSource,
    },
    SessionEnd {
        #[serde(flatten)]
        common: EventCommon,
    },
    Stop {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default)]
        stop_hook_active: bool,
    },
    SubagentStop {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default)]
        stop_hook_active: bool,
    },
    PreCompaction {
        #[serde(flatten)]
        common: EventCommon,
        trigger: CompactionTrigger,
        #[serde(default)]
        custom_instructions: Option<String>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PreToolUse { .. } => EventKind::PreToolUse,
            Event::PostToolUse { .. } => EventKind::PostToolUse,
            Event::UserPromptSubmit { .. } => EventKind::UserPromptSubmit,
            Event::PermissionRequest { .. } => EventKind::PermissionRequest,
            Event::Notification { .. } => EventKind::Notification,
            Event::SessionStart { .. } => EventKind::SessionStart,
            Event::SessionEnd { .. } => EventKind::SessionEnd,
            Event::Stop { .. } => EventKind::Stop,
            Event::SubagentStop { .. } => EventKind::SubagentStop,
            Event::PreCompaction { .. } => EventKind::PreCompaction,
        }
    }

    pub fn common(&self) -> &EventCommon {
        match self {
            Event::PreToolUse { common, .. }
            | Event::PostToolUse { common, .. }
            | Event::UserPromptSubmit { common, .. }
            | Event::PermissionRequest { common, .. }
            | Event::Notification { common, .. }
            | Event::SessionStart { common, .. }
            | Event::SessionEnd { common, .. }
            | Event::Stop { common, .. }
            | Event::SubagentStop { common, .. }
            | Event::PreCompaction { common, .. } => common,
        }
    }

    /// Flatten the event into a single JSON object, the representation the
    /// condition evaluator walks field paths over.
    pub fn as_value(&self) -> Value {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(m)) => m,
            _ => Map::new(),
        };
        map.insert(
            "hook_event_name".to_string(),
            Value::String(self.kind().as_config_key().to_string()),
        );
        Value::Object(map)
    }
}
