//! Coding rules: unlisted drugs (R05), J-code units (R06), modifier misuse
//! (R07) and NCCI procedure-to-procedure edits (R08)

use std::collections::HashSet;

use rust_decimal_macros::dec;

use core_kernel::{LineId, Money, Rate};

use super::citations;
use super::{is_em_visit, AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::line::LineItem;

/// Not-otherwise-classified drug and supply codes
const UNLISTED_DRUG_CODES: &[&str] = &[
    "J3490", "J3590", "J7599", "J7699", "J7799", "J8499", "J8999", "J9999", "C9399",
];

/// Units on an unmatched J-code line that warrant verification
const JCODE_UNIT_ALERT: u32 = 100;

/// Modifiers that bypass NCCI edits and require documentation
const DISTINCT_SERVICE_MODIFIERS: &[&str] = &["59", "XE", "XS", "XP", "XU"];

/// Distinct-service modifiers are only questioned above this charge
const DISTINCT_SERVICE_REVIEW_THRESHOLD: Money = Money::from_cents(10_000);

/// Share of the patient amount at risk when a modifier is unsupported
fn modifier_review_rate() -> Rate {
    Rate::from_percentage(dec!(30))
}

/// Column one code and the column two codes bundled into it
const PTP_EDITS: &[(&str, &[&str])] = &[
    ("80053", &["80048", "82947", "84132", "82565"]),
    ("85025", &["85027", "85004"]),
    ("93000", &["93005", "93010"]),
    ("99291", &["36556"]),
    ("45380", &["45378"]),
];

fn is_jcode(line: &LineItem) -> bool {
    line.code_str().len() == 5 && line.code_str().starts_with('J')
}

/// R05: unlisted drug codes the plan allowed nothing for, yet billed to the patient
pub fn unlisted_drug_codes(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for (bill, eob) in input.matched_pairs() {
        if !UNLISTED_DRUG_CODES.iter().any(|c| bill.has_code(c)) {
            continue;
        }
        let allowed_nothing = eob.allowed.is_some_and(|a| a.is_zero());
        let billed = bill.patient_amount();
        if !allowed_nothing || !billed.is_positive() {
            continue;
        }

        findings.push(
            Finding::new(RuleId::R05, Severity::Warn, 0.6)
                .explanation(format!(
                    "{} uses an unlisted drug code that the plan allowed nothing for, \
                     but {} is still billed to you",
                    bill.label(),
                    billed
                ))
                .action("Ask the provider for the NDC number and drug name behind the unlisted code")
                .action("Ask the insurer to reprocess the claim once the drug is identified")
                .evidence(&bill.line_id)
                .evidence(&eob.line_id)
                .savings(billed)
                .cite(citations::claims_processing("Billing for not otherwise classified drugs")),
        );
    }

    Ok(findings)
}

/// R06: J-code units billed above what the payer processed
pub fn jcode_unit_errors(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for bill in input.bill_lines.iter().filter(|l| is_jcode(l)) {
        match input.matched_eob(bill) {
            // The payer processed fewer units than were billed
            Some(eob) if eob.units < bill.units => {
                let excess_units = bill.units - eob.units;
                let excess = bill.per_unit_charge().times(excess_units)?;
                findings.push(
                    Finding::new(RuleId::R06, Severity::High, 0.8)
                        .explanation(format!(
                            "{} is billed for {} units but the insurer processed {}",
                            bill.label(),
                            bill.units,
                            eob.units
                        ))
                        .action("Request correction of drug units to match the administered dose")
                        .evidence(&bill.line_id)
                        .evidence(&eob.line_id)
                        .savings(excess)
                        .comparison(bill.charge.checked_sub(&excess)?, bill.charge)
                        .cite(citations::claims_processing("HCPCS drug unit descriptors")),
                );
            }
            None if bill.units > JCODE_UNIT_ALERT => {
                findings.push(
                    Finding::new(RuleId::R06, Severity::High, 0.5)
                        .explanation(format!(
                            "{} is billed for {} units, which is unusually high for a single drug line",
                            bill.label(),
                            bill.units
                        ))
                        .action("Ask for the medication administration record to verify the dose")
                        .evidence(&bill.line_id)
                        .cite(citations::claims_processing("HCPCS drug unit descriptors")),
                );
            }
            _ => {}
        }
    }

    Ok(findings)
}

/// R07: modifier 25 off E/M codes, components billed on top of the global
/// service, and distinct-service modifiers on costly lines
pub fn modifier_misuse(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for line in input.bill_lines {
        if line.has_modifier("25") && !is_em_visit(line) {
            let at_risk = modifier_review_rate().apply(&line.patient_amount())?;
            findings.push(
                Finding::new(RuleId::R07, Severity::Warn, 0.7)
                    .explanation(format!(
                        "Modifier 25 is only valid on evaluation and management codes, \
                         but it is attached to {}",
                        line.label()
                    ))
                    .action("Ask the provider to correct the modifier or remove the charge")
                    .evidence(&line.line_id)
                    .savings(at_risk)
                    .cite(citations::ncci("Modifier 25 significant, separately identifiable E/M service")),
            );
        }

        if line.has_any_modifier(DISTINCT_SERVICE_MODIFIERS)
            && line.charge > DISTINCT_SERVICE_REVIEW_THRESHOLD
        {
            let at_risk = modifier_review_rate().apply(&line.patient_amount())?;
            findings.push(
                Finding::new(RuleId::R07, Severity::Warn, 0.5)
                    .explanation(format!(
                        "{} carries a distinct-service modifier that bypasses bundling edits; \
                         it must be supported by documentation",
                        line.label()
                    ))
                    .action("Request documentation supporting the distinct procedural service modifier")
                    .evidence(&line.line_id)
                    .savings(at_risk)
                    .cite(citations::ncci("Modifier 59 and X{EPSU} usage")),
            );
        }
    }

    // Global service billed alongside its professional or technical component;
    // each component line is claimed by one global line at most
    let mut claimed: HashSet<&LineId> = HashSet::new();
    for global in input.bill_lines.iter().filter(|l| {
        l.code.is_some() && !l.has_modifier("26") && !l.has_modifier("TC")
    }) {
        let component = input.bill_lines.iter().find(|other| {
            other.line_id != global.line_id
                && !claimed.contains(&other.line_id)
                && other.code == global.code
                && other.same_day_as(global)
                && (other.has_modifier("26") || other.has_modifier("TC"))
        });

        if let Some(component) = component {
            claimed.insert(&component.line_id);
            let smaller = global.charge.min(component.charge);
            findings.push(
                Finding::new(RuleId::R07, Severity::High, 0.8)
                    .explanation(format!(
                        "{} is billed as a global service and again as a separate component; \
                         the component is already included in the global charge",
                        global.label()
                    ))
                    .action("Request removal of the duplicated professional or technical component")
                    .evidence(&global.line_id)
                    .evidence(&component.line_id)
                    .savings(smaller)
                    .cite(citations::ncci("Professional and technical component billing")),
            );
        }
    }

    Ok(findings)
}

/// R08: column two codes billed with their column one code on the same day
pub fn unbundling_ptp(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();
    let mut flagged = Vec::new();

    for (column_one, column_two_codes) in PTP_EDITS {
        for primary in input.bill_lines.iter().filter(|l| l.has_code(column_one)) {
            for bundled in input.bill_lines.iter().filter(|l| {
                column_two_codes.iter().any(|c| l.has_code(c))
                    && l.same_day_as(primary)
                    && !l.has_any_modifier(DISTINCT_SERVICE_MODIFIERS)
            }) {
                if flagged.contains(&&bundled.line_id) {
                    continue;
                }
                flagged.push(&bundled.line_id);

                findings.push(
                    Finding::new(RuleId::R08, Severity::High, 0.85)
                        .explanation(format!(
                            "{} is a component of {} billed the same day and should not be \
                             charged separately",
                            bundled.label(),
                            primary.label()
                        ))
                        .action("Request removal of the unbundled component charge")
                        .evidence(&bundled.line_id)
                        .evidence(&primary.line_id)
                        .savings(bundled.charge)
                        .cite(citations::ncci("Procedure-to-procedure edits")),
                );
            }
        }
    }

    Ok(findings)
}
