//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for findings and money that give
//! more meaningful error messages than standard assertions.

use std::collections::HashSet;

use core_kernel::{LineId, Money};
use domain_audit::{Finding, LineItem, RuleId};

/// Asserts that a Money value equals the given number of cents
pub fn assert_cents(actual: Money, expected_cents: i64) {
    assert_eq!(
        actual.cents(),
        expected_cents,
        "Expected {} but got {}",
        Money::from_cents(expected_cents),
        actual
    );
}

/// Asserts the aggregate invariant: finding savings sum exactly to the total
pub fn assert_savings_total(findings: &[Finding], total: Money) {
    let sum: Money = findings.iter().map(|f| f.savings).sum();
    assert_eq!(
        sum,
        total,
        "Sum of finding savings {} does not match total {}",
        sum,
        total
    );
}

/// Asserts that every evidence id refers to one of the given lines
pub fn assert_evidence_resolves(findings: &[Finding], lines: &[&[LineItem]]) {
    let known: HashSet<&LineId> = lines
        .iter()
        .flat_map(|set| set.iter().map(|l| &l.line_id))
        .collect();
    for finding in findings {
        for id in &finding.evidence_line_ids {
            assert!(
                known.contains(id),
                "{} references unknown line {}",
                finding.rule_id,
                id
            );
        }
    }
}

/// Asserts that `rule` produced exactly one finding and returns it
pub fn assert_single_finding(findings: &[Finding], rule: RuleId) -> &Finding {
    let matching: Vec<&Finding> = findings.iter().filter(|f| f.rule_id == rule).collect();
    assert_eq!(
        matching.len(),
        1,
        "Expected exactly one {} finding, got {}: {:?}",
        rule,
        matching.len(),
        findings.iter().map(|f| f.rule_id).collect::<Vec<_>>()
    );
    matching[0]
}

/// Asserts that `rule` produced no findings
pub fn assert_no_finding(findings: &[Finding], rule: RuleId) {
    assert!(
        findings.iter().all(|f| f.rule_id != rule),
        "Expected no {} finding, got {:?}",
        rule,
        findings.iter().filter(|f| f.rule_id == rule).collect::<Vec<_>>()
    );
}

/// Asserts that the finding's evidence contains each of the given ids
pub fn assert_evidence_contains(finding: &Finding, ids: &[&str]) {
    for id in ids {
        assert!(
            finding.evidence_line_ids.iter().any(|e| e.as_str() == *id),
            "{} evidence {:?} is missing {}",
            finding.rule_id,
            finding.evidence_line_ids,
            id
        );
    }
}
