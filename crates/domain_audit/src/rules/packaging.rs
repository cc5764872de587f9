//! Packaged services: charges that are included in another service's payment
//! (R01 venipuncture, R02 IV fluids, R03 OTC medications)

use core_kernel::Money;

use super::citations;
use super::{is_surgical, AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::line::LineItem;

const VENIPUNCTURE_CODES: &[&str] = &["36415", "36416", "36410", "G0001"];

const VENIPUNCTURE_KEYWORDS: &[&str] = &[
    "venipuncture",
    "blood draw",
    "blood collection",
    "phlebotomy",
    "specimen collection",
    "lab draw",
];

const LAB_KEYWORDS: &[&str] = &["lab", "test", "panel"];

const IV_FLUID_CODES: &[&str] = &[
    "J7030", "J7040", "J7042", "J7050", "J7060", "J7070", "J7120", "J7131",
];

const IV_FLUID_KEYWORDS: &[&str] = &["saline", "lactated ringer", "iv fluid", "dextrose"];

const OTC_KEYWORDS: &[&str] = &[
    "acetaminophen",
    "tylenol",
    "ibuprofen",
    "motrin",
    "advil",
    "aspirin",
    "antacid",
    "docusate",
    "diphenhydramine",
    "benadryl",
    "loratadine",
];

/// Per-unit charge above which an OTC medication is flagged
const OTC_UNIT_THRESHOLD: Money = Money::from_cents(1_000);

/// Fair per-unit price assumed for an OTC medication
const OTC_FAIR_UNIT_PRICE: Money = Money::from_cents(100);

fn is_venipuncture(line: &LineItem) -> bool {
    VENIPUNCTURE_CODES.iter().any(|c| line.has_code(c))
        || line.description_mentions(VENIPUNCTURE_KEYWORDS)
}

fn is_lab_test(line: &LineItem) -> bool {
    !is_venipuncture(line)
        && (line.cpt_in_range(80000, 89999) || line.description_mentions(LAB_KEYWORDS))
}

fn is_iv_fluid(line: &LineItem) -> bool {
    IV_FLUID_CODES.iter().any(|c| line.has_code(c)) || line.description_mentions(IV_FLUID_KEYWORDS)
}

fn is_fluid_administration(line: &LineItem) -> bool {
    line.cpt_in_range(96360, 96379) || line.cpt_in_range(99281, 99285) || is_surgical(line)
}

/// R01: venipuncture billed separately while lab tests appear on the same bill
pub fn packaged_venipuncture(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    if !input.bill_lines.iter().any(is_lab_test) {
        return Ok(Vec::new());
    }

    let draws: Vec<&LineItem> = input.bill_lines.iter().filter(|l| is_venipuncture(l)).collect();
    if draws.is_empty() {
        return Ok(Vec::new());
    }

    let total: Money = draws.iter().map(|l| l.charge).sum();
    let finding = Finding::new(RuleId::R01, Severity::High, 0.95)
        .explanation(format!(
            "Venipuncture (blood draw) charges totaling {} are billed separately, \
             but blood collection is integral to the laboratory tests on this bill",
            total
        ))
        .action("Request removal of separate venipuncture charges as they are included in lab test reimbursement")
        .evidence_all(draws.iter().map(|l| &l.line_id))
        .savings(total)
        .cite(citations::ncci("Venipuncture is considered integral to lab tests"));

    Ok(vec![finding])
}

/// R02: IV fluids billed on the same day as the infusion, ED visit or surgery
/// whose payment already includes them
pub fn packaged_iv_fluids(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut evidence = Vec::new();
    let mut total = Money::zero();

    for fluid in input.bill_lines.iter().filter(|l| is_iv_fluid(l)) {
        let primary = input.bill_lines.iter().find(|other| {
            other.line_id != fluid.line_id
                && !is_iv_fluid(other)
                && is_fluid_administration(other)
                && other.same_day_as(fluid)
        });

        if let Some(primary) = primary {
            evidence.push(&fluid.line_id);
            if !evidence.contains(&&primary.line_id) {
                evidence.push(&primary.line_id);
            }
            total += fluid.charge;
        }
    }

    if evidence.is_empty() {
        return Ok(Vec::new());
    }

    let finding = Finding::new(RuleId::R02, Severity::High, 0.85)
        .explanation(format!(
            "IV fluid charges of {} are billed on the same day as a service whose payment \
             already includes the fluids",
            total
        ))
        .action("Ask the provider to remove separately billed IV fluids that are packaged into the administration or procedure")
        .evidence_all(evidence)
        .savings(total)
        .cite(citations::claims_processing("Packaged drugs and supplies under OPPS"));

    Ok(vec![finding])
}

/// R03: over-the-counter medications billed far above their retail value
pub fn packaged_otc_medications(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for line in input.bill_lines.iter().filter(|l| l.description_mentions(OTC_KEYWORDS)) {
        if line.per_unit_charge() <= OTC_UNIT_THRESHOLD {
            continue;
        }

        let fair = OTC_FAIR_UNIT_PRICE.times(line.units)?;
        let excess = line.charge.checked_sub(&fair)?;
        findings.push(
            Finding::new(RuleId::R03, Severity::Warn, 0.75)
                .explanation(format!(
                    "{} is billed at {} per unit; over-the-counter medication is normally \
                     part of routine nursing care or priced near retail",
                    line.label(),
                    line.per_unit_charge()
                ))
                .action("Request removal or repricing of over-the-counter medication charges")
                .evidence(&line.line_id)
                .savings(excess)
                .comparison(fair, line.charge)
                .cite(citations::claims_processing("Self-administered drugs and routine supplies")),
        );
    }

    Ok(findings)
}
