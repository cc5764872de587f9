//! R04 duplicate charges

use std::collections::HashSet;

use core_kernel::{LineId, Money};

use super::citations;
use super::{AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::line::LineItem;

/// Modifiers that make repeated codes legitimate: bilateral and sided procedures
const DIFFERENTIATING_MODIFIERS: &[&str] = &["50", "RT", "LT"];

/// Professional and technical component modifiers. Lines are only compared
/// with lines of the same component; global plus component is left to R07.
const COMPONENT_MODIFIERS: &[&str] = &["26", "TC"];

/// Services that are delivered once per encounter
const SINGLE_USE_KEYWORDS: &[&str] = &["admission", "surgery", "anesthesia", "recovery", "consultation"];

const ROOM_AND_BOARD_KEYWORDS: &[&str] = &["room", "board"];

/// Relative charge difference below which same-code lines look alike
const NEAR_DUPLICATE_PERCENT: i64 = 10;

fn is_differentiated(line: &LineItem) -> bool {
    line.has_any_modifier(DIFFERENTIATING_MODIFIERS)
}

fn component(line: &LineItem) -> Option<&'static str> {
    COMPONENT_MODIFIERS.iter().copied().find(|m| line.has_modifier(m))
}

/// Flags exact duplicates, near duplicates and repeated single-use services
pub fn duplicate_charges(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();
    let mut flagged: HashSet<&LineId> = HashSet::new();

    // Exact duplicates by (code, date of service, component), first occurrence order
    type GroupKey<'a> = (&'a str, Option<&'a str>, Option<&'static str>);
    let mut groups: Vec<(GroupKey<'_>, Vec<&LineItem>)> = Vec::new();
    for line in input.bill_lines {
        let Some(code) = line.code.as_deref() else {
            continue;
        };
        let key = (code, line.date_of_service.as_deref(), component(line));
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(line),
            None => groups.push((key, vec![line])),
        }
    }

    for ((code, date, _), members) in &groups {
        if members.len() < 2 || members.iter().any(|l| is_differentiated(l)) {
            continue;
        }

        let repeated: Money = members[1..].iter().map(|l| l.patient_amount()).sum();
        let when = date.map(|d| format!(" on {}", d)).unwrap_or_default();
        findings.push(
            Finding::new(RuleId::R04, Severity::High, 0.9)
                .explanation(format!(
                    "Code {} is billed {} times{} with no modifier that distinguishes the services; \
                     {} of repeated charges appear to be duplicates",
                    code,
                    members.len(),
                    when,
                    repeated
                ))
                .action("Request removal of duplicate charges from the itemized bill")
                .evidence_all(members.iter().map(|l| &l.line_id))
                .savings(repeated)
                .cite(citations::facta("Right to dispute billing errors")),
        );
        flagged.extend(members.iter().map(|l| &l.line_id));
    }

    // Near duplicates: same code with charges within 10%, never counted as savings
    let coded: Vec<&LineItem> = input.bill_lines.iter().filter(|l| l.code.is_some()).collect();
    for (i, first) in coded.iter().enumerate() {
        for second in &coded[i + 1..] {
            if first.code != second.code
                || component(first) != component(second)
                || flagged.contains(&second.line_id)
                || is_differentiated(first)
                || is_differentiated(second)
                || !charges_within_near_band(first.charge, second.charge)
            {
                continue;
            }

            findings.push(
                Finding::new(RuleId::R04, Severity::High, 0.5)
                    .explanation(format!(
                        "{} appears again with a similar charge ({} and {}); \
                         confirm both services were actually provided",
                        first.label(),
                        first.charge,
                        second.charge
                    ))
                    .action("Ask the provider to confirm whether the similar charges are separate services")
                    .evidence(&second.line_id)
                    .evidence(&first.line_id)
                    .cite(citations::facta("Right to dispute billing errors")),
            );
            flagged.insert(&second.line_id);
        }
    }

    // Quantity errors on services that happen once
    for line in input.bill_lines {
        if line.units <= 1
            || !line.description_mentions(SINGLE_USE_KEYWORDS)
            || line.description_mentions(ROOM_AND_BOARD_KEYWORDS)
        {
            continue;
        }

        let expected = line.per_unit_charge();
        let overcharge = line.charge.checked_sub(&expected)?;
        findings.push(
            Finding::new(RuleId::R04, Severity::Warn, 0.6)
                .explanation(format!(
                    "{} is charged for {} units but is normally provided once",
                    line.label(),
                    line.units
                ))
                .action("Request correction of the quantity billed for single-use services")
                .evidence(&line.line_id)
                .savings(overcharge)
                .comparison(expected, line.charge)
                .cite(citations::facta("Right to dispute billing errors")),
        );
    }

    Ok(findings)
}

fn charges_within_near_band(a: Money, b: Money) -> bool {
    let (a, b) = (i128::from(a.cents()), i128::from(b.cents()));
    let sum = a + b;
    if sum <= 0 {
        return false;
    }
    // |a - b| / ((a + b) / 2) < 10%  <=>  200 * |a - b| < 10 * (a + b)
    200 * (a - b).abs() < i128::from(NEAR_DUPLICATE_PERCENT) * sum
}
