// src/rules/annotate.rs
use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::{
    catalogue::{RuleCatalogue, RuleCategory},
    error::RuleEvaluationWarning,
    records::{DataRow, RecordTable, DELIMITER},
    rules::evaluate::{ConditionMatcher, RuleEvaluator, SubstringMatcher},
};

/// Name of the column appended to every row.
pub const RAG_TRIGGER_COLUMN: &str = "RAG_Trigger";
/// Trigger field of a row that no rule fired on.
pub const NO_ISSUES: &str = "No issues";

const GROUP_SEPARATOR: &str = " | ";
const TRIGGER_SEPARATOR: &str = "; ";

/// The record table with the trigger column appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTable {
    pub header: String,
    /// One line per input row, in input order.
    pub rows: Vec<String>,
    /// Rows that got something other than `No issues`.
    pub flagged_rows: usize,
    /// Each unusable rule once, in (group, position) order.
    pub warnings: Vec<RuleEvaluationWarning>,
}

impl AnnotatedTable {
    /// Header and rows joined by newlines, no trailing newline.
    pub fn to_text(&self) -> String {
        let size = self.header.len() + self.rows.iter().map(|r| r.len() + 1).sum::<usize>();
        let mut out = String::with_capacity(size);
        out.push_str(&self.header);
        for row in &self.rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }
}

struct RowOutcome {
    field: String,
    flagged: bool,
    warnings: Vec<RuleEvaluationWarning>,
}

/// Runs every recognised rule group over every row.
pub struct AnnotationEngine<'a, M: ConditionMatcher + ?Sized = SubstringMatcher> {
    catalogue: &'a RuleCatalogue,
    matcher: &'a M,
    parallel: bool,
}

impl<'a> AnnotationEngine<'a, SubstringMatcher> {
    pub fn new(catalogue: &'a RuleCatalogue) -> Self {
        Self {
            catalogue,
            matcher: &SubstringMatcher,
            parallel: false,
        }
    }
}

impl<'a, M: ConditionMatcher + ?Sized> AnnotationEngine<'a, M> {
    pub fn with_matcher(catalogue: &'a RuleCatalogue, matcher: &'a M) -> Self {
        Self {
            catalogue,
            matcher,
            parallel: false,
        }
    }

    /// Spread rows over the rayon pool. Output order and content are the
    /// same either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Trigger field for one row: `No issues`, or per-group buckets in
    /// category order, `"<group>: <d1>; <d2>"`, joined by `" | "`.
    pub fn trigger_field(&self, row: &DataRow) -> String {
        self.evaluate_row(row).field
    }

    fn evaluate_row(&self, row: &DataRow) -> RowOutcome {
        let mut buckets: Vec<String> = Vec::new();
        let mut warnings = Vec::new();

        for category in RuleCategory::ALL {
            let Some(group) = self.catalogue.category(category) else {
                continue;
            };
            let eval = RuleEvaluator::with_matcher(group, self.matcher).evaluate(row);
            warnings.extend(eval.warnings);
            if eval.triggers.is_empty() {
                continue;
            }
            let descriptions: Vec<&str> = eval
                .triggers
                .iter()
                .map(|t| t.description.as_str())
                .collect();
            buckets.push(format!(
                "{}: {}",
                group.name,
                descriptions.join(TRIGGER_SEPARATOR)
            ));
        }

        if buckets.is_empty() {
            RowOutcome {
                field: NO_ISSUES.to_string(),
                flagged: false,
                warnings,
            }
        } else {
            RowOutcome {
                field: buckets.join(GROUP_SEPARATOR),
                flagged: true,
                warnings,
            }
        }
    }

    /// Append the trigger column to the header and every row. The trigger
    /// text is written as-is; delimiters inside it are not escaped.
    #[instrument(level = "info", skip_all, fields(rows = table.rows.len(), parallel = self.parallel))]
    pub fn annotate(&self, table: &RecordTable) -> AnnotatedTable {
        let missing: Vec<&str> = RuleCategory::ALL
            .iter()
            .filter(|c| self.catalogue.category(**c).is_none())
            .map(|c| c.label())
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "rule groups absent from catalogue");
        }

        let outcomes: Vec<RowOutcome> = if self.parallel {
            table
                .rows
                .par_iter()
                .map(|row| self.evaluate_row(row))
                .collect()
        } else {
            table.rows.iter().map(|row| self.evaluate_row(row)).collect()
        };

        let mut warnings = BTreeSet::new();
        let mut flagged_rows = 0;
        let mut rows = Vec::with_capacity(outcomes.len());
        for (row, outcome) in table.rows.iter().zip(outcomes) {
            if outcome.flagged {
                flagged_rows += 1;
            }
            warnings.extend(outcome.warnings);
            rows.push(format!("{}{}{}", row.raw(), DELIMITER, outcome.field));
        }

        let warnings: Vec<RuleEvaluationWarning> = warnings.into_iter().collect();
        for w in &warnings {
            warn!(group = %w.group, rule = %w.rule_id, position = w.position, reason = %w.reason, "rule skipped");
        }
        info!(flagged_rows, warnings = warnings.len(), "annotated rows");

        AnnotatedTable {
            header: format!("{}{}{}", table.header_line, DELIMITER, RAG_TRIGGER_COLUMN),
            rows,
            flagged_rows,
            warnings,
        }
    }
}
