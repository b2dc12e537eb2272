//! `Modify` action: mutate the outbound event payload through a narrow,
//! explicit field whitelist (see DESIGN.md's Open Question on this).

use crate::error::EngineError;
use crate::rule::ModifyOp;
use serde_json::{Map, Value};

/// Fields a `Modify`/`Transform` action may touch: the prompt text, or a key
/// inside `tool_input`/`tool_response`. Anything else is rejected.
fn split_field(field: &str) -> Result<(&str, Option<&str>), EngineError> {
    if field == "prompt" {
        return Ok(("prompt", None));
    }
    if let Some((root, nested)) = field.split_once('.')
        && (root == "tool_input" || root == "tool_response")
    {
        return Ok((root, Some(nested)));
    }
    Err(EngineError::UnknownField {
        field: field.to_string(),
    })
}

fn get_target<'a>(payload: &'a mut Value, root: &str, nested: Option<&str>) -> Option<&'a mut Value> {
    let obj = payload.as_object_mut()?;
    match nested {
        None => Some(obj.entry(root).or_insert(Value::Null)),
        Some(key) => {
            let inner = obj
                .entry(root)
                .or_insert_with(|| Value::Object(Map::new()));
            inner.as_object_mut()?.entry(key).or_insert(Value::Null);
            inner.as_object_mut()?.get_mut(key)
        }
    }
}

pub fn apply(
    payload: &mut Value,
    field: &str,
    op: ModifyOp,
    value: Option<&Value>,
    pattern: Option<&str>,
) -> Result<(), EngineError> {
    let (root, nested) = split_field(field)?;
    let target = get_target(payload, root, nested).ok_or_else(|| EngineError::UnknownField {
        field: field.to_string(),
    })?;

    match op {
        ModifyOp::Set => {
            *target = value.cloned().unwrap_or(Value::Null);
        }
        ModifyOp::Append => match target {
            Value::String(s) => {
                if let Some(Value::String(add)) = value {
                    s.push_str(add);
                }
            }
            Value::Array(arr) => {
                if let Some(v) = value {
                    arr.push(v.clone());
                }
            }
            Value::Null => {
                *target = value.cloned().unwrap_or(Value::Null);
            }
            _ => {
                return Err(EngineError::UnknownField {
                    field: field.to_string(),
                })
            }
        },
        ModifyOp::Prepend => match target {
            Value::String(s) => {
                if let Some(Value::String(add)) = value {
                    *s = format!("{add}{s}");
                }
            }
            Value::Array(arr) => {
                if let Some(v) = value {
                    arr.insert(0, v.clone());
                }
            }
            Value::Null => {
                *target = value.cloned().unwrap_or(Value::Null);
            }
            _ => {
                return Err(EngineError::UnknownField {
                    field: field.to_string(),
                })
            }
        },
        ModifyOp::Replace => {
            let Value::String(s) = target else {
                return Err(EngineError::UnknownField {
                    field: field.to_string(),
                });
            };
            let Some(pattern) = pattern else {
                return Err(EngineError::InvalidRule {
                    id: field.to_string(),
                    reason: "replace requires a pattern".into(),
                });
            };
            let re = regex::Regex::new(pattern).map_err(|e| EngineError::InvalidRule {
                id: field.to_string(),
                reason: format!("invalid regex pattern: {e}"),
            })?;
            let replacement = value.and_then(|v| v.as_str()).unwrap_or("");
            *s = re.replace_all(s, replacement).into_owned();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_prompt() {
        let mut payload = json!({"prompt": "old"});
        apply(&mut payload, "prompt", ModifyOp::Set, Some(&json!("new")), None).unwrap();
        assert_eq!(payload["prompt"], "new");
    }

    #[test]
    fn test_append_tool_input_field() {
        let mut payload = json!({"tool_input": {"command": "ls"}});
        apply(
            &mut payload,
            "tool_input.command",
            ModifyOp::Append,
            Some(&json!(" -la")),
            None,
        )
        .unwrap();
        assert_eq!(payload["tool_input"]["command"], "ls -la");
    }

    #[test]
    fn test_replace_with_regex() {
        let mut payload = json!({"tool_input": {"command": "rm -rf /tmp/x"}});
        apply(
            &mut payload,
            "tool_input.command",
            ModifyOp::Replace,
            Some(&json!("rm -i")),
            Some(r"rm -rf"),
        )
        .unwrap();
        assert_eq!(payload["tool_input"]["command"], "rm -i /tmp/x");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut payload = json!({});
        let err = apply(&mut payload, "secrets", ModifyOp::Set, Some(&json!("x")), None);
        assert!(matches!(err, Err(EngineError::UnknownField { .. })));
    }
}
