// src/rules/evaluate.rs
use tracing::trace;

use crate::{
    catalogue::{RuleGroup, RuleRecord},
    error::RuleEvaluationWarning,
    records::DataRow,
};

/// Decides whether one rule condition holds for one row.
///
/// `Err` means the condition could not be applied at all; the evaluator
/// records it as a warning and moves on to the next rule.
pub trait ConditionMatcher: Send + Sync {
    fn matches(&self, condition: &str, row: &DataRow) -> Result<bool, String>;
}

/// Case-insensitive substring search of the condition text in the row's raw
/// line. Conditions are not parsed: operators, field references and
/// formulas are matched as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl ConditionMatcher for SubstringMatcher {
    fn matches(&self, condition: &str, row: &DataRow) -> Result<bool, String> {
        if condition.trim().is_empty() {
            return Err("condition is blank".to_string());
        }
        Ok(row.raw_lowercase().contains(&condition.to_lowercase()))
    }
}

/// Evidence that one rule matched one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub group: String,
    pub rule_id: String,
    pub description: String,
}

impl Trigger {
    fn fired(group: &str, rule: &RuleRecord) -> Self {
        Self {
            group: group.to_string(),
            rule_id: rule.id.clone(),
            description: format!("{}: {}", rule.id, rule.description),
        }
    }
}

/// Result of running one group over one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// In catalogue order.
    pub triggers: Vec<Trigger>,
    pub warnings: Vec<RuleEvaluationWarning>,
}

/// Applies the rules of one group to rows.
pub struct RuleEvaluator<'a, M: ConditionMatcher + ?Sized = SubstringMatcher> {
    group: &'a RuleGroup,
    matcher: &'a M,
}

impl<'a> RuleEvaluator<'a, SubstringMatcher> {
    pub fn new(group: &'a RuleGroup) -> Self {
        Self {
            group,
            matcher: &SubstringMatcher,
        }
    }
}

impl<'a, M: ConditionMatcher + ?Sized> RuleEvaluator<'a, M> {
    pub fn with_matcher(group: &'a RuleGroup, matcher: &'a M) -> Self {
        Self { group, matcher }
    }

    /// Every rule is tried independently; a rule that cannot be applied is
    /// reported in `warnings` and does not stop the others.
    pub fn evaluate(&self, row: &DataRow) -> Evaluation {
        let mut out = Evaluation::default();
        for (position, rule) in self.group.rules() {
            if !rule.is_complete() {
                out.warnings
                    .push(self.warning(position, rule, missing_fields(rule)));
                continue;
            }
            match self.matcher.matches(&rule.condition, row) {
                Ok(true) => {
                    trace!(group = %self.group.name, rule = %rule.id, "rule fired");
                    out.triggers.push(Trigger::fired(&self.group.name, rule));
                }
                Ok(false) => {}
                Err(reason) => out.warnings.push(self.warning(position, rule, reason)),
            }
        }
        out
    }

    fn warning(&self, position: usize, rule: &RuleRecord, reason: String) -> RuleEvaluationWarning {
        RuleEvaluationWarning {
            group: self.group.name.clone(),
            position,
            rule_id: rule.id.clone(),
            reason,
        }
    }
}

fn missing_fields(rule: &RuleRecord) -> String {
    let missing: Vec<&str> = [
        ("id", &rule.id),
        ("condition", &rule.condition),
        ("description", &rule.description),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(name, _)| name)
    .collect();
    format!("missing {}", missing.join(", "))
}
