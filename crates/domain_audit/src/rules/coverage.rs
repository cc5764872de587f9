//! Coverage rules comparing the bill with the payer's adjudication:
//! timely filing (R13), coordination of benefits (R14), zero-billed EOB
//! lines (R15), price outliers (R17) and missing itemization (R18)

use core_kernel::{LineId, Money};

use super::citations;
use super::{AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::line::{parse_canonical_date, LineItem};

/// Bill charge to allowed amount ratio considered an outlier
const PRICE_OUTLIER_RATIO: u32 = 3;

/// Share of bill lines that may lack a code before the bill counts as unitemized
const MAX_UNCODED_SHARE_PERCENT: usize = 50;

/// R13: the provider filed late, the plan paid nothing, and the patient is billed
pub fn timely_filing(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let Some(statement) = input
        .bill_facts
        .statement_date
        .as_deref()
        .and_then(parse_canonical_date)
    else {
        return Ok(Vec::new());
    };
    let Some(first_service) = input.bill_lines.iter().filter_map(|l| l.service_date()).min() else {
        return Ok(Vec::new());
    };

    let elapsed = (statement - first_service).num_days();
    let limit = i64::from(input.context.timely_filing_limit_days());
    if elapsed <= limit {
        return Ok(Vec::new());
    }

    let unpaid: Vec<(&LineItem, &LineItem)> = input
        .matched_pairs()
        .filter(|(bill, eob)| eob.plan_paid.is_some_and(|p| p.is_zero()) && bill.patient_amount().is_positive())
        .collect();
    if unpaid.is_empty() {
        return Ok(Vec::new());
    }

    let total: Money = unpaid.iter().map(|(bill, _)| bill.patient_amount()).sum();
    Ok(vec![Finding::new(RuleId::R13, Severity::High, 0.7)
        .explanation(format!(
            "The bill is dated {} days after the first date of service, beyond the {}-day filing \
             limit, and the plan paid nothing for these services; {} billed to you may be the \
             result of late filing",
            elapsed, limit, total
        ))
        .action("Ask the insurer whether the claim was denied for late filing")
        .action("If so, ask the provider to write off charges denied for untimely filing")
        .evidence_all(unpaid.iter().flat_map(|(bill, eob)| [&bill.line_id, &eob.line_id]))
        .savings(total)
        .cite(citations::claims_processing("Time limits for filing claims"))])
}

/// R14: secondary coverage exists but the bill still asks for the full primary
/// patient responsibility
pub fn cob_primary_missing(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    if !input.context.has_secondary() {
        return Ok(Vec::new());
    }

    let pending: Vec<(&LineItem, &LineItem)> = input
        .matched_pairs()
        .filter(|(bill, eob)| match eob.patient_resp {
            Some(resp) => resp.is_positive() && bill.patient_amount() == resp,
            None => false,
        })
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let total: Money = pending.iter().map(|(bill, _)| bill.patient_amount()).sum();
    Ok(vec![Finding::new(RuleId::R14, Severity::Warn, 0.5)
        .explanation(format!(
            "You have secondary coverage, but {} is billed to you exactly as the primary plan \
             left it; the secondary plan has not been billed",
            total
        ))
        .action("Give the provider your secondary insurance information and ask them to bill it")
        .action("Hold payment until the secondary plan has processed the claim")
        .evidence_all(pending.iter().flat_map(|(bill, eob)| [&bill.line_id, &eob.line_id]))
        .savings(total)
        .cite(citations::claims_processing("Coordination of benefits"))])
}

/// The amount a bill line asks for when the EOB says nothing is owed
fn amount_owed_despite_eob(bill: &LineItem, eob: &LineItem) -> Option<Money> {
    let bill_states_resp = bill.patient_resp.is_some_and(|r| r.is_positive());
    let eob_zero_resp = eob.patient_resp.is_some_and(|r| r.is_zero());
    // A processed EOB line reporting nothing billed
    let eob_zero_billed = eob.charge.is_zero() && eob.allowed.is_some();

    if eob_zero_billed {
        Some(bill.patient_amount()).filter(|m| m.is_positive())
    } else if eob_zero_resp && bill_states_resp {
        bill.patient_resp
    } else {
        None
    }
}

/// R15: the EOB shows nothing owed, yet the bill asks the patient to pay
pub fn eob_zero_billed(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for (bill, eob) in input.matched_pairs() {
        let Some(owed) = amount_owed_despite_eob(bill, eob) else {
            continue;
        };

        findings.push(
            Finding::new(RuleId::R15, Severity::High, 0.9)
                .explanation(format!(
                    "Your EOB shows you owe nothing for {}, but the bill asks you to pay {}",
                    bill.label(),
                    owed
                ))
                .action("Send the provider a copy of the EOB showing $0 patient responsibility")
                .action("Request the balance be adjusted to match the EOB")
                .evidence(&bill.line_id)
                .evidence(&eob.line_id)
                .savings(owed)
                .comparison(eob.patient_resp.unwrap_or_default(), owed)
                .cite(citations::no_surprises("Balance billing protections")),
        );
    }

    Ok(findings)
}

/// R17: charges far above the negotiated rate, with any balance billing as savings
pub fn tic_price_outliers(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for (bill, eob) in input.matched_pairs() {
        let Some(allowed) = eob.allowed.filter(|a| a.is_positive()) else {
            continue;
        };
        if bill.charge < allowed.times(PRICE_OUTLIER_RATIO)? {
            continue;
        }
        // Zero patient responsibility is handled as a zero-billed EOB line
        if eob.patient_resp.is_some_and(|r| r.is_zero()) {
            continue;
        }

        let balance_billed = match (bill.patient_resp, eob.patient_resp) {
            (Some(billed), Some(owed)) => billed.checked_sub(&owed)?.non_negative(),
            _ => Money::zero(),
        };

        findings.push(
            Finding::new(RuleId::R17, Severity::Warn, 0.6)
                .explanation(format!(
                    "{} is charged at {}, at least {} times the negotiated rate of {}",
                    bill.label(),
                    bill.charge,
                    PRICE_OUTLIER_RATIO,
                    allowed
                ))
                .action("Compare the charge with the plan's published negotiated rates")
                .action("Ask the provider to bill no more than your EOB patient responsibility")
                .evidence(&bill.line_id)
                .evidence(&eob.line_id)
                .savings(balance_billed)
                .comparison(allowed, bill.charge)
                .cite(citations::claims_processing("Transparency in Coverage negotiated rates")),
        );
    }

    Ok(findings)
}

/// R18: the bill is missing or not itemized with procedure codes
pub fn missing_itemized_bill(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    if input.bill_lines.is_empty() {
        if input.eob_lines.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![Finding::new(RuleId::R18, Severity::High, 0.9)
            .explanation(
                "An EOB was provided without an itemized bill, so individual charges cannot be checked",
            )
            .action("Request an itemized bill with CPT/HCPCS codes for every charge")
            .evidence_all(input.eob_lines.iter().map(|l| &l.line_id))
            .cite(citations::fcba("Right to an itemized statement"))]);
    }

    let uncoded: Vec<&LineId> = input
        .bill_lines
        .iter()
        .filter(|l| l.code.is_none())
        .map(|l| &l.line_id)
        .collect();
    if uncoded.len() * 100 <= input.bill_lines.len() * MAX_UNCODED_SHARE_PERCENT {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(RuleId::R18, Severity::High, 0.9)
        .explanation(format!(
            "{} of {} bill lines have no procedure code, so the bill is not truly itemized",
            uncoded.len(),
            input.bill_lines.len()
        ))
        .action("Request an itemized bill with CPT/HCPCS codes for every charge")
        .evidence_all(uncoded)
        .cite(citations::fcba("Right to an itemized statement"))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InsuranceContext;
    use crate::matcher::{LineMatch, MatchTier};
    use crate::normalizer::DocumentFacts;
    use core_kernel::LineSource;

    fn line(source: LineSource, pos: usize, code: &str, cents: i64) -> LineItem {
        let mut item = LineItem::new(LineId::new(source, pos), source);
        item.code = Some(code.to_string());
        item.charge = Money::from_cents(cents);
        item.date_of_service = Some("01/10/2024".to_string());
        item
    }

    fn matched(bill: &LineItem, eob: &LineItem) -> LineMatch {
        LineMatch {
            bill_line_id: bill.line_id.clone(),
            eob_line_id: Some(eob.line_id.clone()),
            confidence_score: 95.0,
            match_tier: MatchTier::High,
        }
    }

    #[test]
    fn test_zero_patient_resp_on_eob() {
        let mut bill = line(LineSource::Bill, 1, "99284", 120000);
        bill.patient_resp = Some(Money::from_cents(35000));
        let mut eob = line(LineSource::Eob, 1, "99284", 120000);
        eob.allowed = Some(Money::from_cents(60000));
        eob.patient_resp = Some(Money::zero());

        let bills = [bill];
        let eobs = [eob];
        let matches = [matched(&bills[0], &eobs[0])];
        let context = InsuranceContext::default();
        let facts = DocumentFacts::default();
        let input = AuditInput {
            bill_lines: &bills,
            eob_lines: &eobs,
            matches: &matches,
            context: &context,
            bill_facts: &facts,
        };

        let findings = eob_zero_billed(&input).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].savings.cents(), 35000);
        // R17 leaves zero-responsibility lines to R15
        assert!(tic_price_outliers(&input).unwrap().is_empty());
    }

    #[test]
    fn test_unitemized_bill() {
        let mut a = line(LineSource::Bill, 1, "X", 1000);
        a.code = None;
        a.description = "Pharmacy".into();
        let mut b = a.clone();
        b.line_id = LineId::from("bill-2");
        let bills = [a, b, line(LineSource::Bill, 3, "36415", 4500)];
        let context = InsuranceContext::default();
        let facts = DocumentFacts::default();
        let input = AuditInput {
            bill_lines: &bills,
            eob_lines: &[],
            matches: &[],
            context: &context,
            bill_facts: &facts,
        };
        let findings = missing_itemized_bill(&input).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence_line_ids.len(), 2);
    }
}
