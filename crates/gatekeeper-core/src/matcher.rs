//! Selects and orders the rules that apply to one event.

use crate::condition;
use crate::event::Event;
use crate::rule::Rule;

/// A rule bound to its final position in the execution order.
pub struct MatchedRule<'a> {
    pub rule: &'a Rule,
    pub match_order: usize,
}

/// Filter `rules` down to those enabled, applicable to `event`'s kind, and
/// whose condition evaluates true against the event — then sort by
/// descending priority, stable on the input (merged insertion) order.
pub fn match_rules<'a>(rules: &'a [Rule], event: &Event) -> Vec<MatchedRule<'a>> {
    let event_value = event.as_value();
    let kind = event.kind();

    let mut candidates: Vec<&Rule> = rules
        .iter()
        .filter(|r| r.enabled)
        .filter(|r| r.applies_to(kind))
        .filter(|r| condition::evaluate(&r.condition, &event_value))
        .collect();

    candidates.sort_by_key(|r| std::cmp::Reverse(r.priority));

    candidates
        .into_iter()
        .enumerate()
        .map(|(match_order, rule)| MatchedRule { rule, match_order })
        .collect()
}
