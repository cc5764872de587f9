//! Appeal letter template

use chrono::NaiveDate;

use core_kernel::Money;
use domain_audit::{DocumentFacts, Finding, InsuranceContext};

/// Letter returned when there is nothing to appeal
pub const NO_APPEAL_NEEDED: &str = "No billing issues detected. No appeal necessary at this time.";

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    value.map(str::to_string).unwrap_or_else(|| placeholder.to_string())
}

/// Renders the appeal letter.
///
/// Pure template substitution: the same findings and inputs always give the
/// same text, only `date` varies between runs. Identity fields the audit
/// cannot know stay as bracketed placeholders for the consumer to fill in.
pub fn appeal_letter(
    findings: &[Finding],
    total_savings: Money,
    context: &InsuranceContext,
    bill_facts: &DocumentFacts,
    service_dates: Option<&str>,
    date: NaiveDate,
) -> String {
    if findings.is_empty() {
        return NO_APPEAL_NEEDED.to_string();
    }

    let high_priority: Vec<&Finding> = findings.iter().filter(|f| f.severity.is_high()).collect();
    let state = context.state_code();
    let mut lines: Vec<String> = vec![
        "[Your Name]".into(),
        "[Your Address]".into(),
        "[City, State ZIP]".into(),
        date.format("%B %-d, %Y").to_string(),
        String::new(),
        or_placeholder(context.payer.as_deref(), "[Insurance Company Name]"),
        "Claims Appeals Department".into(),
        "[City, State ZIP]".into(),
        String::new(),
        "RE: Formal Appeal - Billing Error Correction Request".into(),
        "Member ID: [Your Member ID]".into(),
        "Claim Number: [Claim Number]".into(),
        format!("Date of Service: {}", or_placeholder(service_dates, "[Date of Service]")),
        format!(
            "Provider: {}",
            or_placeholder(bill_facts.provider_name.as_deref(), "[Provider Name]")
        ),
        String::new(),
        "Dear Appeals Review Team,".into(),
        String::new(),
        format!(
            "I am writing to formally appeal billing errors identified in the above-referenced claim. \
             This appeal requests correction of {} billing discrepancies totaling {} in incorrect patient responsibility.",
            findings.len(),
            total_savings
        ),
        String::new(),
    ];

    if !high_priority.is_empty() {
        lines.push("IDENTIFIED BILLING ERRORS:".into());
        lines.push(String::new());
        for (index, finding) in high_priority.iter().enumerate() {
            lines.push(format!("{}. {} ({})", index + 1, finding.rule_name, finding.rule_id));
            lines.push(format!("   {}", finding.explanation));
            lines.push(format!("   Potential refund: {}", finding.savings));
            if let Some(citation) = finding.citations.first() {
                lines.push(format!("   Regulation: {} - {}", citation.authority, citation.title));
            }
            lines.push(String::new());
        }
    }

    lines.push("ALL FINDINGS:".into());
    lines.push(String::new());
    for (index, finding) in findings.iter().enumerate() {
        lines.push(format!(
            "Issue {}: {} ({}, {})",
            index + 1,
            finding.rule_name,
            finding.rule_id,
            finding.severity
        ));
        lines.push(finding.explanation.clone());
        lines.push(format!("Overcharge: {}", finding.savings));
        lines.push(String::new());
    }

    lines.extend([
        "REQUESTED ACTIONS:".to_string(),
        "1. Immediate reprocessing of this claim with corrections applied".to_string(),
        "2. Issuance of a corrected Explanation of Benefits reflecting accurate patient responsibility"
            .to_string(),
        "3. Coordination with the provider for a corrected patient statement".to_string(),
        format!("4. Refund of {} in overcharged patient responsibility", total_savings),
        String::new(),
        format!(
            "This appeal is supported by a line-by-line audit and regulatory citations. \
             Under {} insurance regulations, I request resolution within 30 days of receipt.",
            or_placeholder(state.as_deref(), "[State]")
        ),
        String::new(),
        "Please confirm receipt and provide a reference number for tracking.".to_string(),
        String::new(),
        "Sincerely,".to_string(),
        "[Your Name]".to_string(),
        "[Your Phone Number]".to_string(),
        "[Your Email]".to_string(),
        String::new(),
        "Enclosures:".to_string(),
        "- Original itemized bill".to_string(),
        "- Original EOB".to_string(),
        "- Detailed audit findings".to_string(),
        "- Supporting regulatory citations".to_string(),
    ]);

    lines.join("\n")
}
