//! Ambient context passed to every rule's actions for one invocation.

use crate::accumulator::RuleAccumulator;
use crate::error::EngineError;
use crate::event::Event;
use crate::git::GitSnapshot;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// An in-process callable the host registers under a name (conventionally
/// `module:function`), resolved by `Native`/`Transform` actions. This is the
/// Rust-shaped stand-in for the original config's dynamically imported
/// Python entrypoints (see DESIGN.md).
pub type NativeFn =
    Arc<dyn Fn(&Event, &mut RuleAccumulator) -> Result<Option<Value>, EngineError> + Send + Sync>;

/// A `Transform` entrypoint receives the event and returns a replacement
/// JSON payload.
pub type TransformFn = Arc<dyn Fn(&Event) -> Result<Value, EngineError> + Send + Sync>;

#[derive(Default)]
pub struct EngineContext {
    pub cwd: Option<PathBuf>,
    pub git: Option<GitSnapshot>,
    natives: HashMap<String, NativeFn>,
    transforms: HashMap<String, TransformFn>,
}

impl EngineContext {
    pub fn new(cwd: Option<PathBuf>, git: Option<GitSnapshot>) -> Self {
        EngineContext {
            cwd,
            git,
            ..Default::default()
        }
    }

    pub fn register_native(&mut self, name: impl Into<String>, f: NativeFn) {
        self.natives.insert(name.into(), f);
    }

    pub fn register_transform(&mut self, name: impl Into<String>, f: TransformFn) {
        self.transforms.insert(name.into(), f);
    }

    pub fn native(&self, name: &str) -> Option<&NativeFn> {
        self.natives.get(name)
    }

    pub fn transform(&self, name: &str) -> Option<&TransformFn> {
        self.transforms.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::InjectionTag;

    #[test]
    fn test_register_and_call_native() {
        let mut ctx = EngineContext::default();
        ctx.register_native(
            "demo:inject",
            Arc::new(|_event, acc| {
                acc.inject(InjectionTag::Context, "hello from native".into());
                Ok(None)
            }),
        );
        let event: Event = serde_json::from_value(serde_json::json!({
            "hook_event_name": "SessionStart",
            "session_id": "s1",
            "source": "startup"
        }))
        .unwrap();
        let native = ctx.native("demo:inject").expect("registered");
        let mut acc = RuleAccumulator::default();
        native(&event, &mut acc).unwrap();
        assert_eq!(acc.injections.len(), 1);
    }
}
