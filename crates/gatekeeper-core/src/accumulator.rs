//! Folds per-rule action outcomes into a single execution result.

use crate::rule::{Rule, RuleResultKind};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionTag {
    Advisory,
    Context,
}

#[derive(Debug, Clone, Serialize)]
pub struct Injection {
    pub tag: InjectionTag,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    Allow,
    Deny,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::enum_variant_names)]
pub enum RuleStatus {
    Succeeded,
    Blocked,
    Warned,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerActionOutcome {
    pub action: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerRuleResult {
    pub rule_id: String,
    pub outcomes: Vec<PerActionOutcome>,
    pub status: RuleStatus,
}

/// Scratch space mutated by a single rule's actions.
#[derive(Debug, Default)]
pub struct RuleAccumulator {
    pub block: bool,
    pub block_reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub injections: Vec<Injection>,
    pub permission_decision: Option<(PermissionDecision, Option<String>)>,
}

impl RuleAccumulator {
    pub fn deny(&mut self, message: Option<String>) {
        self.block = true;
        if let Some(m) = message {
            self.block_reasons.push(m);
        }
    }

    pub fn warn(&mut self, message: Option<String>) {
        if let Some(m) = message {
            self.warnings.push(m);
        }
    }

    pub fn inject(&mut self, tag: InjectionTag, text: String) {
        self.injections.push(Injection { tag, text });
    }

    pub fn allow(&mut self, message: Option<String>) {
        self.permission_decision = Some((PermissionDecision::Allow, message));
    }

    pub fn set_permission(&mut self, decision: PermissionDecision, reason: Option<String>) {
        self.permission_decision = Some((decision, reason));
    }
}

/// Accumulates across an entire matched-rule walk for one invocation.
#[derive(Debug, Default)]
pub struct ExecutionAccumulator {
    pub rule_results: Vec<PerRuleResult>,
    pub should_block: bool,
    pub block_reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub injections: Vec<Injection>,
    pub permission_decision: Option<PermissionDecision>,
    pub permission_decision_reason: Option<String>,
    pub terminated_early: bool,
}

impl ExecutionAccumulator {
    /// Promote one rule's scratch accumulator and action outcomes into the
    /// overall execution state. Returns whether the walk should stop here.
    pub fn promote(
        &mut self,
        rule: &Rule,
        rule_acc: RuleAccumulator,
        outcomes: Vec<PerActionOutcome>,
        force_stop: bool,
    ) -> bool {
        if rule_acc.block {
            self.should_block = true;
        }
        self.block_reasons.extend(rule_acc.block_reasons.iter().cloned());
        self.warnings.extend(rule_acc.warnings.iter().cloned());
        self.injections.extend(rule_acc.injections.iter().cloned());

        if let Some((decision, reason)) = &rule_acc.permission_decision {
            // Deny is sticky: once set, nothing later clears it.
            let keep_existing = matches!(self.permission_decision, Some(PermissionDecision::Deny));
            if !keep_existing {
                self.permission_decision = Some(*decision);
                self.permission_decision_reason = reason.clone();
            }
        }

        let any_warn = !rule_acc.warnings.is_empty();
        let all_failed = !outcomes.is_empty() && outcomes.iter().all(|o| !o.success);
        let status = if rule_acc.block {
            RuleStatus::Blocked
        } else if all_failed {
            RuleStatus::Failed
        } else if any_warn {
            RuleStatus::Warned
        } else {
            RuleStatus::Succeeded
        };

        self.rule_results.push(PerRuleResult {
            rule_id: rule.id.clone(),
            outcomes,
            status,
        });

        let stop = rule.terminal || force_stop || (rule.result == RuleResultKind::Block && rule_acc.block);
        if stop {
            self.terminated_early = true;
        }
        stop
    }

    pub fn block_reason(&self) -> Option<String> {
        if self.block_reasons.is_empty() {
            None
        } else {
            Some(self.block_reasons.join("\n"))
        }
    }

    pub fn additional_context(&self) -> Option<String> {
        let ctx: Vec<&str> = self
            .injections
            .iter()
            .filter(|i| i.tag == InjectionTag::Context)
            .map(|i| i.text.as_str())
            .collect();
        if ctx.is_empty() {
            None
        } else {
            Some(ctx.join("\n"))
        }
    }

    /// `modified_event` carries whatever a `Modify`/`Transform` action built
    /// up over the walk; it lives outside the per-rule fold because it is
    /// replaced wholesale rather than merged.
    pub fn into_result(self, modified_event: Option<Value>) -> ExecutionResult {
        ExecutionResult {
            should_block: self.should_block,
            block_reason: self.block_reason(),
            warnings: self.warnings.clone(),
            additional_context: self.additional_context(),
            permission_decision: self.permission_decision,
            permission_decision_reason: self.permission_decision_reason.clone(),
            rule_results: self.rule_results,
            terminated_early: self.terminated_early,
            modified_event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub should_block: bool,
    pub block_reason: Option<String>,
    pub warnings: Vec<String>,
    pub additional_context: Option<String>,
    pub permission_decision: Option<PermissionDecision>,
    pub permission_decision_reason: Option<String>,
    pub rule_results: Vec<PerRuleResult>,
    pub terminated_early: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_event: Option<Value>,
}
