//! Evaluation of a parsed condition expression against an event payload.

use super::parser::{CompareOp, Expr, Literal, PathSegment};
use serde_json::Value;

/// Evaluate `expr` against `root` (an event's [`crate::event::Event::as_value`]).
/// Never panics; unresolved fields and type mismatches simply evaluate to `false`.
pub fn eval(expr: &Expr, root: &Value) -> bool {
    match expr {
        Expr::Or(a, b) => eval(a, root) || eval(b, root),
        Expr::And(a, b) => eval(a, root) && eval(b, root),
        Expr::Not(a) => !eval(a, root),
        Expr::Compare(left, op, right) => {
            let l = resolve_operand(left, root);
            let r = resolve_operand(right, root);
            eval_compare(&l, *op, &r)
        }
        Expr::Literal(lit) => truthy(&literal_to_value(lit)),
        Expr::Field(path) => truthy(&resolve_path(path, root)),
    }
}

fn resolve_operand(expr: &Expr, root: &Value) -> Value {
    match expr {
        Expr::Field(path) => resolve_path(path, root),
        Expr::Literal(lit) => literal_to_value(lit),
        // Nested boolean subexpressions on either side of a comparison are
        // unusual but not forbidden; fold to a JSON bool.
        other => Value::Bool(eval(other, root)),
    }
}

fn resolve_path(path: &[PathSegment], root: &Value) -> Value {
    let mut current = root.clone();
    for segment in path {
        let key = match segment {
            PathSegment::Name(n) => n,
            PathSegment::Index(n) => n,
        };
        current = match current.get(key) {
            Some(v) => v.clone(),
            None => return Value::Null,
        };
    }
    current
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Str(s) => Value::String(s.clone()),
        Literal::Int(n) => Value::Number((*n).into()),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn eval_compare(l: &Value, op: CompareOp, r: &Value) -> bool {
    // Null never legitimately compares true to anything, regardless of op.
    if matches!(l, Value::Null) || matches!(r, Value::Null) {
        return false;
    }
    match op {
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::RegexMatch => match (l.as_str(), r.as_str()) {
            (Some(s), Some(pattern)) => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(s),
                Err(e) => {
                    tracing::warn!(
                        pattern,
                        error = %e,
                        "invalid regex pattern in condition; treating as no match"
                    );
                    false
                }
            },
            _ => false,
        },
        CompareOp::In => contains(r, l),
        CompareOp::NotIn => !contains(r, l),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            ordered_compare(l, op, r)
        }
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
        Value::Array(arr) => arr.contains(needle),
        Value::Object(map) => needle.as_str().map(|k| map.contains_key(k)).unwrap_or(false),
        _ => false,
    }
}

fn ordered_compare(l: &Value, op: CompareOp, r: &Value) -> bool {
    if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
        return match op {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            _ => unreachable!(),
        };
    }
    if let (Some(a), Some(b)) = (l.as_str(), r.as_str()) {
        return match op {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            _ => unreachable!(),
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::lexer::lex;
    use crate::condition::parser::parse;
    use serde_json::json;

    fn run(condition: &str, root: &Value) -> bool {
        let toks = lex(condition).unwrap();
        let expr = parse(&toks).unwrap();
        eval(&expr, root)
    }

    #[test]
    fn test_equality_true_and_false() {
        let root = json!({"tool_name": "Bash"});
        assert!(run(r#"tool_name == "Bash""#, &root));
        assert!(!run(r#"tool_name == "Edit""#, &root));
    }

    #[test]
    fn test_missing_field_is_null_and_false() {
        let root = json!({});
        assert!(!run(r#"tool_name == "Bash""#, &root));
        assert!(!run("tool_name", &root));
    }

    #[test]
    fn test_incompatible_types_yield_false() {
        let root = json!({"count": "three"});
        assert!(!run("count > 1", &root));
    }

    #[test]
    fn test_regex_match() {
        let root = json!({"tool_input": {"command": "rm -rf /"}});
        assert!(run(r#"tool_input["command"] =~ "rm\\s+-rf""#, &root));
        assert!(!run(r#"tool_input["command"] =~ "^ls""#, &root));
    }

    #[test]
    fn test_invalid_regex_pattern_yields_false() {
        let root = json!({"prompt": "hello"});
        assert!(!run(r#"prompt =~ "(unclosed""#, &root));
    }

    #[test]
    fn test_in_substring_and_membership() {
        let root = json!({"prompt": "please run tests", "tags": ["ci", "fast"]});
        assert!(run(r#""run" in prompt"#, &root));
        assert!(run(r#""ci" in tags"#, &root));
        assert!(!run(r#""slow" in tags"#, &root));
    }

    #[test]
    fn test_not_in() {
        let root = json!({"tool_name": "Bash"});
        assert!(run(r#"tool_name not in "Edit,Write""#, &root));
        assert!(!run(r#"tool_name not in "has Bash inside""#, &root));
    }

    #[test]
    fn test_and_or_not_combination() {
        let root = json!({"tool_name": "Bash", "permission_mode": "default"});
        assert!(run(
            r#"tool_name == "Bash" and not (permission_mode == "plan")"#,
            &root
        ));
    }

    #[test]
    fn test_empty_condition_constant_true_is_handled_by_caller() {
        // The evaluator itself just evaluates expressions; callers treat ""
        // specially before invoking the lexer/parser (see matcher.rs).
        let root = json!({});
        assert!(run("true", &root));
    }
}
