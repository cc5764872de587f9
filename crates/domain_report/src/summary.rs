//! Executive summary of an audit

use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_audit::{Finding, Severity};

/// Amount the savings were measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsBasis {
    /// At least one bill line matched an EOB line
    Allowed,
    /// Only billed charges were available
    Charge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub high_level_findings: Vec<String>,
    #[serde(rename = "potentialSavingsCents")]
    pub potential_savings: Money,
    pub basis: SavingsBasis,
    pub total_findings: usize,
    pub high_priority_count: usize,
    /// False when neither document had a usable line
    pub analysis_performed: bool,
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Summarizes the reportable findings.
///
/// `total_savings` is the engine total; it always equals the sum over
/// `findings`.
pub fn summarize(
    findings: &[Finding],
    total_savings: Money,
    any_eob_matched: bool,
    any_lines: bool,
) -> ReportSummary {
    let high_priority_count = findings.iter().filter(|f| f.severity.is_high()).count();
    let warn_count = findings
        .iter()
        .filter(|f| f.severity == Severity::Warn)
        .count();

    let mut high_level_findings = Vec::new();
    if !any_lines {
        high_level_findings
            .push("No analysis was possible - no bill or EOB line items could be read".to_string());
    } else if findings.is_empty() {
        high_level_findings.push("No billing issues detected - bill appears accurate".to_string());
    } else {
        if high_priority_count > 0 {
            high_level_findings.push(format!(
                "{} detected",
                plural(high_priority_count, "critical billing error", "critical billing errors")
            ));
        }
        if warn_count > 0 {
            high_level_findings.push(format!(
                "{} requiring review",
                plural(warn_count, "potential issue", "potential issues")
            ));
        }
        high_level_findings.extend(
            findings
                .iter()
                .filter(|f| f.severity.is_high())
                .take(3)
                .map(|f| format!("{}: {}", f.rule_name, f.savings)),
        );
    }

    ReportSummary {
        high_level_findings,
        potential_savings: total_savings,
        basis: if any_eob_matched {
            SavingsBasis::Allowed
        } else {
            SavingsBasis::Charge
        },
        total_findings: findings.len(),
        high_priority_count,
        analysis_performed: any_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_audit::RuleId;

    #[test]
    fn test_counts_are_pluralized() {
        let findings = vec![
            Finding::new(RuleId::R01, Severity::High, 0.95).savings(Money::from_cents(4500)),
            Finding::new(RuleId::R03, Severity::Warn, 0.75).savings(Money::from_cents(900)),
            Finding::new(RuleId::R10, Severity::Warn, 0.7).savings(Money::from_cents(100)),
        ];
        let summary = summarize(&findings, Money::from_cents(5500), false, true);
        assert_eq!(
            summary.high_level_findings,
            vec![
                "1 critical billing error detected".to_string(),
                "2 potential issues requiring review".to_string(),
                "Packaged Venipuncture: $45.00".to_string(),
            ]
        );
        assert_eq!(summary.basis, SavingsBasis::Charge);
        assert_eq!(summary.high_priority_count, 1);
    }

    #[test]
    fn test_nothing_to_analyze() {
        let summary = summarize(&[], Money::zero(), false, false);
        assert!(!summary.analysis_performed);
        assert!(summary.high_level_findings[0].starts_with("No analysis was possible"));
    }
}
