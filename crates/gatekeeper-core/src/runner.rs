//! Component H: loads configuration once per invocation, matches rules
//! against one event, and drives the dispatcher/accumulator loop.

use crate::accumulator::{ExecutionAccumulator, ExecutionResult, RuleAccumulator};
use crate::action;
use crate::config::{self, EngineSettings};
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::event::Event;
use crate::git::GitSnapshot;
use crate::rule::Rule;
use serde_json::Value;
use std::path::Path;

pub struct Runner {
    rules: Vec<Rule>,
    settings: EngineSettings,
    ctx: EngineContext,
}

impl Runner {
    /// Discover and merge rules and settings across every precedence tier
    /// rooted at `project_root`, capturing a best-effort git snapshot. In
    /// strict mode (`GATEKEEPER_STRICT_CONFIG=1` or an explicit `strict =
    /// true` setting), a malformed configuration file anywhere in the
    /// precedence chain aborts the load instead of being skipped.
    pub fn load(project_root: Option<&Path>) -> Result<Self, EngineError> {
        let settings = config::load_engine_settings(project_root)?;
        let rules = config::load_rules(project_root, settings.strict)?;
        let git = project_root.and_then(GitSnapshot::capture);
        let ctx = EngineContext::new(project_root.map(|p| p.to_path_buf()), git);
        Ok(Runner {
            rules,
            settings,
            ctx,
        })
    }

    /// Build a runner directly from an already-resolved rule set, bypassing
    /// file discovery. Used by embedders that manage their own config, and
    /// by tests.
    pub fn from_rules(rules: Vec<Rule>, settings: EngineSettings) -> Self {
        let ctx = EngineContext::new(None, None);
        Runner {
            rules,
            settings,
            ctx,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Mutable access to the engine context, for hosts registering `Native`
    /// / `Transform` entrypoints before the first `run`.
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Match and execute every applicable rule against `event`, in priority
    /// order, stopping early on a terminal rule, an interrupting deny, or a
    /// blocking rule whose `result` is `block`.
    pub fn run(&self, event: &Event) -> ExecutionResult {
        let matched = crate::matcher::match_rules(&self.rules, event);
        let mut exec = ExecutionAccumulator::default();
        let mut modified_payload: Option<Value> = None;

        for matched_rule in matched {
            let mut rule_acc = RuleAccumulator::default();
            let (outcomes, interrupt) = action::execute_rule_actions(
                matched_rule.rule,
                event,
                &self.ctx,
                &mut rule_acc,
                &mut modified_payload,
            );
            let stop = exec.promote(matched_rule.rule, rule_acc, outcomes, interrupt);
            if stop {
                break;
            }
        }

        exec.into_result(modified_payload)
    }
}
