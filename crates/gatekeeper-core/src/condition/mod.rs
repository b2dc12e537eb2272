//! A small boolean expression language for rule conditions.
//!
//! Conditions test fields of the current event: `tool_name == "Bash"`,
//! `tool_input["command"] =~ "rm\\s+-rf"`, `"ci" in tags`. An empty
//! condition string always matches. A condition that fails to parse never
//! matches (and is logged once) rather than raising — the engine is
//! defensive by default.

mod eval;
mod lexer;
mod parser;

use serde_json::Value;

/// Evaluate `condition` against `event_value`. Empty string is always true.
/// A syntactically invalid condition evaluates to `false` and logs a warning.
pub fn evaluate(condition: &str, event_value: &Value) -> bool {
    if condition.trim().is_empty() {
        return true;
    }
    let tokens = match lexer::lex(condition) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(condition, error = %e, "condition failed to tokenize; rule will not match");
            return false;
        }
    };
    let expr = match parser::parse(&tokens) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(condition, error = %e, "condition failed to parse; rule will not match");
            return false;
        }
    };
    eval::eval(&expr, event_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_condition_is_always_true() {
        assert!(evaluate("", &json!({})));
        assert!(evaluate("   ", &json!({})));
    }

    #[test]
    fn test_valid_condition_matches() {
        let root = json!({"tool_name": "Bash"});
        assert!(evaluate(r#"tool_name == "Bash""#, &root));
    }

    #[test]
    fn test_invalid_condition_never_matches() {
        let root = json!({"tool_name": "Bash"});
        assert!(!evaluate(r#"tool_name === "Bash""#, &root));
    }
}
