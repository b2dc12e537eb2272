//! Error taxonomy for the hook rule engine.

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("rule '{id}' is invalid: {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("condition parse error at position {pos}: {reason}")]
    ConditionParse { pos: usize, reason: String },

    #[error("condition nesting exceeds max depth {max}")]
    ConditionTooDeep { max: usize },

    #[error("action for rule '{rule_id}' failed: {reason}")]
    ActionFailed { rule_id: String, reason: String },

    #[error("action references unknown field '{field}'")]
    UnknownField { field: String },

    #[error("no native entrypoint registered for '{entrypoint}'")]
    UnknownEntrypoint { entrypoint: String },

    #[error("event payload is missing required field '{field}'")]
    MalformedEvent { field: String },

    #[error("subprocess for rule '{rule_id}' timed out after {timeout_ms}ms")]
    ActionTimeout { rule_id: String, timeout_ms: u64 },

    #[error("failed to spawn subprocess: {0}")]
    Spawn(#[source] std::io::Error),
}
