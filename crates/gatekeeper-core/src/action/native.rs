//! `Native`/`Transform` actions: in-process callables resolved by name from
//! the [`EngineContext`] registry.

use crate::accumulator::RuleAccumulator;
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::event::Event;
use serde_json::Value;

pub fn run_native(
    entrypoint: &str,
    ctx: &EngineContext,
    event: &Event,
    rule_acc: &mut RuleAccumulator,
) -> Result<Option<Value>, EngineError> {
    let f = ctx
        .native(entrypoint)
        .ok_or_else(|| EngineError::UnknownEntrypoint {
            entrypoint: entrypoint.to_string(),
        })?;
    f(event, rule_acc)
}

pub fn run_transform(
    entrypoint: &str,
    ctx: &EngineContext,
    event: &Event,
) -> Result<Value, EngineError> {
    let f = ctx
        .transform(entrypoint)
        .ok_or_else(|| EngineError::UnknownEntrypoint {
            entrypoint: entrypoint.to_string(),
        })?;
    f(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample_event() -> Event {
        serde_json::from_value(serde_json::json!({
            "hook_event_name": "SessionStart",
            "session_id": "s1",
            "source": "startup"
        }))
        .unwrap()
    }

    #[test]
    fn test_run_native_dispatches_to_registered_fn() {
        let mut ctx = EngineContext::default();
        ctx.register_native(
            "demo:warn",
            Arc::new(|_e, acc| {
                acc.warn(Some("careful".into()));
                Ok(None)
            }),
        );
        let mut acc = RuleAccumulator::default();
        run_native("demo:warn", &ctx, &sample_event(), &mut acc).unwrap();
        assert_eq!(acc.warnings, vec!["careful".to_string()]);
    }

    #[test]
    fn test_run_native_unknown_entrypoint_errors() {
        let ctx = EngineContext::default();
        let mut acc = RuleAccumulator::default();
        let result = run_native("missing:fn", &ctx, &sample_event(), &mut acc);
        assert!(matches!(result, Err(EngineError::UnknownEntrypoint { .. })));
    }

    #[test]
    fn test_run_transform_replaces_payload() {
        let mut ctx = EngineContext::default();
        ctx.register_transform(
            "demo:transform",
            Arc::new(|_e| Ok(serde_json::json!({"replaced": true}))),
        );
        let out = run_transform("demo:transform", &ctx, &sample_event()).unwrap();
        assert_eq!(out["replaced"], true);
    }
}
