//! Action dispatcher: executes a rule's actions in declared order, folding
//! their effects into the rule's accumulator.

mod modify;
mod native;
mod shell;

use crate::accumulator::{InjectionTag, PerActionOutcome, RuleAccumulator};
use crate::context::EngineContext;
use crate::event::Event;
use crate::rule::{Action, LogLevel, Rule};
use serde_json::Value;
use std::time::Instant;

/// Runs every action of `rule` in order against `event`. Returns the
/// per-action outcomes and whether an interrupting `Deny` fired (which the
/// caller folds into the stop decision alongside `rule.terminal`).
pub fn execute_rule_actions(
    rule: &Rule,
    event: &Event,
    ctx: &EngineContext,
    rule_acc: &mut RuleAccumulator,
    modified_payload: &mut Option<Value>,
) -> (Vec<PerActionOutcome>, bool) {
    let mut outcomes = Vec::with_capacity(rule.actions.len());
    let mut interrupt = false;
    let event_json = serde_json::to_string(&event.as_value()).unwrap_or_default();

    for action in &rule.actions {
        let start = Instant::now();
        let (success, output, error) = run_one(
            action,
            rule,
            event,
            ctx,
            rule_acc,
            modified_payload,
            &event_json,
        );
        if let Action::Deny { interrupt: true, .. } = action
            && success
        {
            interrupt = true;
        }
        outcomes.push(PerActionOutcome {
            action: action.tag(),
            success,
            output,
            error,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    (outcomes, interrupt)
}

#[allow(clippy::too_many_arguments)]
fn run_one(
    action: &Action,
    rule: &Rule,
    event: &Event,
    ctx: &EngineContext,
    rule_acc: &mut RuleAccumulator,
    modified_payload: &mut Option<Value>,
    event_json: &str,
) -> (bool, Option<Value>, Option<String>) {
    match action {
        Action::Log { level } => {
            log_line(rule, event, *level);
            (true, None, None)
        }
        Action::Deny { message, .. } => {
            rule_acc.deny(message.clone());
            (true, None, None)
        }
        Action::Allow { message } => {
            rule_acc.allow(message.clone());
            (true, None, None)
        }
        Action::Warn { message } => {
            rule_acc.warn(message.clone());
            (true, None, None)
        }
        Action::Suggest { message } => {
            rule_acc.inject(InjectionTag::Advisory, message.clone());
            (true, None, None)
        }
        Action::Inject { content } => {
            rule_acc.inject(InjectionTag::Context, content.clone());
            (true, None, None)
        }
        Action::Shell {
            command,
            script,
            timeout_ms,
        } => match shell::run(
            &rule.id,
            command.as_deref(),
            script.as_deref(),
            *timeout_ms,
            event.common().cwd.as_deref(),
            event_json,
            rule_acc,
        ) {
            Ok(output) => (true, output, None),
            Err(e) => (false, None, Some(e.to_string())),
        },
        Action::Native {
            entrypoint,
            timeout_ms: _,
        } => match native::run_native(entrypoint, ctx, event, rule_acc) {
            Ok(output) => (true, output, None),
            Err(e) => (false, None, Some(e.to_string())),
        },
        Action::Modify {
            field,
            op,
            value,
            pattern,
        } => {
            let payload = modified_payload.get_or_insert_with(|| event.as_value());
            match modify::apply(payload, field, *op, value.as_ref(), pattern.as_deref()) {
                Ok(()) => (true, None, None),
                Err(e) => (false, None, Some(e.to_string())),
            }
        }
        Action::Transform { entrypoint } => match native::run_transform(entrypoint, ctx, event) {
            Ok(new_payload) => {
                *modified_payload = Some(new_payload.clone());
                (true, Some(new_payload), None)
            }
            Err(e) => (false, None, Some(e.to_string())),
        },
    }
}

fn log_line(rule: &Rule, event: &Event, level: LogLevel) {
    let rule_id = rule.id.as_str();
    let kind = event.kind().as_config_key();
    match level {
        LogLevel::Debug => tracing::debug!(rule_id, hook_event_name = kind, "rule log action"),
        LogLevel::Info => tracing::info!(rule_id, hook_event_name = kind, "rule log action"),
        LogLevel::Warn => tracing::warn!(rule_id, hook_event_name = kind, "rule log action"),
        LogLevel::Error => tracing::error!(rule_id, hook_event_name = kind, "rule log action"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RulePriority, RuleResultKind};
    use std::collections::HashSet;

    fn sample_event() -> Event {
        serde_json::from_value(serde_json::json!({
            "hook_event_name": "PreToolUse",
            "session_id": "s1",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"}
        }))
        .unwrap()
    }

    fn rule_with_actions(actions: Vec<Action>) -> Rule {
        Rule {
            id: "r1".into(),
            events: HashSet::from([crate::event::EventKind::PreToolUse]),
            condition: String::new(),
            priority: RulePriority::Medium,
            enabled: true,
            result: RuleResultKind::Ok,
            terminal: false,
            description: None,
            actions,
        }
    }

    #[test]
    fn test_deny_action_blocks() {
        let rule = rule_with_actions(vec![Action::Deny {
            message: Some("no".into()),
            interrupt: true,
        }]);
        let ctx = EngineContext::default();
        let mut rule_acc = RuleAccumulator::default();
        let mut payload = None;
        let (outcomes, interrupt) =
            execute_rule_actions(&rule, &sample_event(), &ctx, &mut rule_acc, &mut payload);
        assert!(rule_acc.block);
        assert!(interrupt);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
    }

    #[test]
    fn test_log_action_never_blocks_or_warns() {
        let rule = rule_with_actions(vec![Action::Log {
            level: LogLevel::Info,
        }]);
        let ctx = EngineContext::default();
        let mut rule_acc = RuleAccumulator::default();
        let mut payload = None;
        execute_rule_actions(&rule, &sample_event(), &ctx, &mut rule_acc, &mut payload);
        assert!(!rule_acc.block);
        assert!(rule_acc.warnings.is_empty());
    }

    #[test]
    fn test_modify_action_initializes_payload_lazily() {
        let rule = rule_with_actions(vec![Action::Modify {
            field: "tool_input.command".into(),
            op: crate::rule::ModifyOp::Append,
            value: Some(serde_json::json!(" -la")),
            pattern: None,
        }]);
        let ctx = EngineContext::default();
        let mut rule_acc = RuleAccumulator::default();
        let mut payload = None;
        execute_rule_actions(&rule, &sample_event(), &ctx, &mut rule_acc, &mut payload);
        let payload = payload.expect("payload should be populated");
        assert_eq!(payload["tool_input"]["command"], "ls -la");
    }

    #[test]
    fn test_action_failure_does_not_abort_remaining_actions() {
        let rule = rule_with_actions(vec![
            Action::Modify {
                field: "unknown_field".into(),
                op: crate::rule::ModifyOp::Set,
                value: Some(serde_json::json!("x")),
                pattern: None,
            },
            Action::Warn {
                message: Some("still ran".into()),
            },
        ]);
        let ctx = EngineContext::default();
        let mut rule_acc = RuleAccumulator::default();
        let mut payload = None;
        let (outcomes, _) =
            execute_rule_actions(&rule, &sample_event(), &ctx, &mut rule_acc, &mut payload);
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].success);
        assert!(outcomes[1].success);
        assert_eq!(rule_acc.warnings, vec!["still ran".to_string()]);
    }
}
