//! Rule executor
//!
//! Runs every registered rule over the same read-only input in ascending
//! priority order (registration order within a tier). A rule that returns an
//! error or panics contributes nothing; its failure is recorded in the
//! per-rule outcome map and the remaining rules still run.

use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use core_kernel::{LineId, Money};

use crate::finding::Finding;
use crate::line::LineItem;
use crate::rules::{AuditInput, Priority, RuleDefinition, RuleFn, RuleId, STANDARD_RULES};

/// Days between the earliest bill and EOB dates beyond which alignment is poor
pub const DATE_ALIGNMENT_TOLERANCE_DAYS: i64 = 30;

/// What happened when a rule ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Found,
    Clear,
    Failed,
}

/// Side-channel record of one rule's execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub priority: Priority,
    pub status: RuleStatus,
    /// Findings the rule produced, before aggregation filtering
    pub finding_count: usize,
    #[serde(rename = "savingsCents")]
    pub savings: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    /// Reportable findings in execution order
    pub findings: Vec<Finding>,
    pub rule_outcomes: BTreeMap<RuleId, RuleOutcome>,
    #[serde(rename = "totalSavingsCents")]
    pub total_savings: Money,
    /// Data quality indicator, 0 to 100
    pub confidence_score: u8,
    pub rules_executed: usize,
}

impl EngineResult {
    /// Outcomes of rules that failed
    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rule_outcomes
            .values()
            .filter(|o| o.status == RuleStatus::Failed)
    }
}

/// Ordered rule registry plus executor
#[derive(Debug, Clone)]
pub struct AuditEngine {
    rules: Vec<RuleDefinition>,
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl AuditEngine {
    /// Engine with the full standard catalogue
    pub fn standard() -> Self {
        Self::with_rules(STANDARD_RULES.to_vec())
    }

    /// Engine with a custom rule list
    pub fn with_rules(rules: Vec<RuleDefinition>) -> Self {
        Self { rules }
    }

    /// Swaps the implementation of a registered rule
    pub fn replace_rule(mut self, id: RuleId, evaluate: RuleFn) -> Self {
        for rule in self.rules.iter_mut().filter(|r| r.id == id) {
            rule.evaluate = evaluate;
        }
        self
    }

    /// Rules in execution order
    pub fn execution_order(&self) -> Vec<RuleId> {
        let mut rules: Vec<&RuleDefinition> = self.rules.iter().collect();
        // Stable: registration order is kept within a tier
        rules.sort_by_key(|r| r.id.priority());
        rules.into_iter().map(|r| r.id).collect()
    }

    /// Runs all rules and aggregates their findings
    pub fn run(&self, input: &AuditInput<'_>) -> EngineResult {
        let mut ordered: Vec<&RuleDefinition> = self.rules.iter().collect();
        ordered.sort_by_key(|r| r.id.priority());

        let known: HashSet<&LineId> = input
            .bill_lines
            .iter()
            .chain(input.eob_lines.iter())
            .map(|l| &l.line_id)
            .collect();

        let mut findings = Vec::new();
        let mut rule_outcomes = BTreeMap::new();
        let mut boosted = false;

        for rule in ordered {
            debug!(rule_id = %rule.id, rule_name = rule.id.name(), "Running rule");

            let result = catch_unwind(AssertUnwindSafe(|| (rule.evaluate)(input)));
            let outcome = match result {
                Ok(Ok(produced)) => {
                    for finding in &produced {
                        debug_assert!(
                            finding.evidence_line_ids.iter().all(|id| known.contains(id)),
                            "rule {} referenced an unknown line id: {:?}",
                            rule.id,
                            finding.evidence_line_ids
                        );
                    }

                    let savings: Money = produced.iter().map(|f| f.savings).sum();
                    let status = if produced.is_empty() {
                        RuleStatus::Clear
                    } else {
                        RuleStatus::Found
                    };
                    if status == RuleStatus::Found && rule.id.boosts_run_confidence() {
                        boosted = true;
                    }

                    debug!(
                        rule_id = %rule.id,
                        findings = produced.len(),
                        savings_cents = savings.cents(),
                        "Rule finished"
                    );

                    let outcome = RuleOutcome {
                        rule_id: rule.id,
                        rule_name: rule.id.name().to_string(),
                        priority: rule.id.priority(),
                        status,
                        finding_count: produced.len(),
                        savings,
                        error: None,
                    };
                    findings.extend(produced.into_iter().filter(Finding::is_reportable));
                    outcome
                }
                Ok(Err(err)) => {
                    warn!(rule_id = %rule.id, error = %err, "Rule failed");
                    failed_outcome(rule.id, err.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(rule_id = %rule.id, error = %message, "Rule panicked");
                    failed_outcome(rule.id, message)
                }
            };
            rule_outcomes.insert(rule.id, outcome);
        }

        let total_savings: Money = findings.iter().map(|f: &Finding| f.savings).sum();
        let confidence_score = run_confidence(input.bill_lines, input.eob_lines, boosted);

        info!(
            rules = self.rules.len(),
            findings = findings.len(),
            total_savings_cents = total_savings.cents(),
            confidence_score,
            "Audit engine run complete"
        );

        EngineResult {
            findings,
            rule_outcomes,
            total_savings,
            confidence_score,
            rules_executed: self.rules.len(),
        }
    }
}

fn failed_outcome(rule_id: RuleId, error: String) -> RuleOutcome {
    RuleOutcome {
        rule_id,
        rule_name: rule_id.name().to_string(),
        priority: rule_id.priority(),
        status: RuleStatus::Failed,
        finding_count: 0,
        savings: Money::zero(),
        error: Some(error),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send + 'static)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// True when the earliest bill and EOB service dates are more than 30 days apart
pub fn poor_date_alignment(bill_lines: &[LineItem], eob_lines: &[LineItem]) -> bool {
    let earliest = |lines: &[LineItem]| lines.iter().filter_map(|l| l.service_date()).min();
    match (earliest(bill_lines), earliest(eob_lines)) {
        (Some(bill), Some(eob)) => (bill - eob).num_days().abs() > DATE_ALIGNMENT_TOLERANCE_DAYS,
        _ => false,
    }
}

/// Confidence of a run: 100, less 20 without bill lines, less 15 without EOB
/// lines, less 10 for poor date alignment, plus 5 when a high-priority rule fired
pub fn run_confidence(bill_lines: &[LineItem], eob_lines: &[LineItem], high_priority_fired: bool) -> u8 {
    let mut score: i32 = 100;
    if bill_lines.is_empty() {
        score -= 20;
    }
    if eob_lines.is_empty() {
        score -= 15;
    }
    if poor_date_alignment(bill_lines, eob_lines) {
        score -= 10;
    }
    if high_priority_fired {
        score = (score + 5).min(100);
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::LineSource;

    fn dated(source: LineSource, date: &str) -> LineItem {
        let mut line = LineItem::new(LineId::new(source, 1), source);
        line.date_of_service = Some(date.to_string());
        line
    }

    #[test]
    fn test_execution_order_is_priority_then_registration() {
        let order = AuditEngine::standard().execution_order();
        assert_eq!(&order[..6], &[RuleId::R01, RuleId::R02, RuleId::R03, RuleId::R15, RuleId::R16, RuleId::R18]);
        assert_eq!(order[6], RuleId::R04);
        assert_eq!(order[17], RuleId::R17);
    }

    #[test]
    fn test_run_confidence() {
        assert_eq!(run_confidence(&[], &[], false), 65);
        assert_eq!(run_confidence(&[], &[], true), 70);

        let bill = [dated(LineSource::Bill, "01/01/2024")];
        let eob = [dated(LineSource::Eob, "03/15/2024")];
        assert_eq!(run_confidence(&bill, &eob, false), 90);
        assert_eq!(run_confidence(&bill, &eob, true), 95);

        let aligned = [dated(LineSource::Eob, "01/05/2024")];
        assert_eq!(run_confidence(&bill, &aligned, true), 100);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }
}
