//! R16 math and posting errors
//!
//! Every check recomputes an amount and compares it with what was stated.
//! Overstatements against the patient are critical and count as savings;
//! understatements are reported at high severity without savings.

use core_kernel::{LineId, Money};

use super::citations;
use super::{AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};

/// Differences up to one cent are rounding
const LINE_TOLERANCE: Money = Money::from_cents(1);

/// Coinsurance is percentage based, so allow a dollar of rounding
const COINSURANCE_TOLERANCE: Money = Money::from_cents(100);

struct Discrepancy<'a> {
    subject: String,
    expected: Money,
    stated: Money,
    evidence: Vec<&'a LineId>,
    /// False when an overstatement does not fall on the patient
    refundable: bool,
}

impl Discrepancy<'_> {
    fn into_finding(self) -> Finding {
        let difference = self.stated - self.expected;
        let overstated = difference.is_positive();

        let (severity, savings, explanation) = if overstated && self.refundable {
            (
                Severity::Critical,
                difference,
                format!(
                    "{}: should be {}, stated as {}; you are overcharged by {}",
                    self.subject, self.expected, self.stated, difference
                ),
            )
        } else if overstated {
            (
                Severity::High,
                Money::zero(),
                format!(
                    "{}: expected at most {}, stated as {}",
                    self.subject, self.expected, self.stated
                ),
            )
        } else {
            (
                Severity::High,
                Money::zero(),
                format!(
                    "{}: should be {}, stated as {} (understated by {})",
                    self.subject,
                    self.expected,
                    self.stated,
                    difference.abs()
                ),
            )
        };

        Finding::new(RuleId::R16, severity, 1.0)
            .explanation(explanation)
            .action("Request immediate correction of the calculation and a corrected statement")
            .evidence_all(self.evidence)
            .savings(savings)
            .comparison(self.expected, self.stated)
            .cite(citations::fcba("Right to accurate billing"))
    }
}

fn exceeds(expected: Money, stated: Money, tolerance: Money) -> bool {
    (stated - expected).abs() > tolerance
}

/// R16: recomputes line extensions, totals, EOB responsibility, deductible and coinsurance
pub fn math_posting_errors(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut discrepancies: Vec<Discrepancy<'_>> = Vec::new();

    // units x unit price on bill lines
    for line in input.bill_lines {
        let Some(unit_price) = line.unit_price else {
            continue;
        };
        let expected = unit_price.times(line.units)?;
        if exceeds(expected, line.charge, LINE_TOLERANCE) {
            discrepancies.push(Discrepancy {
                subject: format!(
                    "{}: {} x {}",
                    line.label(),
                    line.units,
                    unit_price
                ),
                expected,
                stated: line.charge,
                evidence: vec![&line.line_id],
                refundable: true,
            });
        }
    }

    // Stated bill total against the sum of its lines
    if let Some(stated_total) = input.bill_facts.total_charges {
        if !input.bill_lines.is_empty() {
            let expected = input
                .bill_lines
                .iter()
                .try_fold(Money::zero(), |acc, l| acc.checked_add(&l.charge))?;
            if exceeds(expected, stated_total, LINE_TOLERANCE) {
                discrepancies.push(Discrepancy {
                    subject: "Bill total compared with the sum of its line items".to_string(),
                    expected,
                    stated: stated_total,
                    evidence: input.bill_lines.iter().map(|l| &l.line_id).collect(),
                    refundable: true,
                });
            }
        }
    }

    for line in input.eob_lines {
        // Allowed can never exceed billed
        if let Some(allowed) = line.allowed {
            if line.charge.is_positive() && allowed > line.charge {
                discrepancies.push(Discrepancy {
                    subject: format!("{}: allowed amount exceeds the billed amount", line.label()),
                    expected: line.charge,
                    stated: allowed,
                    evidence: vec![&line.line_id],
                    refundable: false,
                });
            }
        }

        // allowed - paid - adjustment = patient responsibility
        if let (Some(allowed), Some(paid), Some(stated)) = (line.allowed, line.plan_paid, line.patient_resp) {
            let adjustment = line.adjustment.unwrap_or_default();
            let expected = allowed
                .checked_sub(&paid)?
                .checked_sub(&adjustment)?
                .non_negative();
            if exceeds(expected, stated, LINE_TOLERANCE) {
                discrepancies.push(Discrepancy {
                    subject: format!("{}: patient responsibility", line.label()),
                    expected,
                    stated,
                    evidence: vec![&line.line_id],
                    refundable: true,
                });
            }
        }

        // Coinsurance share of what remains after the deductible
        if let (Some(rate), Some(allowed), Some(stated)) =
            (input.context.coinsurance_rate(), line.allowed, line.coinsurance)
        {
            let base = allowed
                .checked_sub(&line.deductible.unwrap_or_default())?
                .non_negative();
            let expected = rate.apply(&base)?;
            if exceeds(expected, stated, COINSURANCE_TOLERANCE) {
                discrepancies.push(Discrepancy {
                    subject: format!("{}: coinsurance at {}", line.label(), rate),
                    expected,
                    stated,
                    evidence: vec![&line.line_id],
                    refundable: true,
                });
            }
        }
    }

    // Deductible applied across the claim cannot exceed what was left to meet
    if let Some(remaining) = input.context.remaining_deductible() {
        let applied_lines: Vec<_> = input.eob_lines.iter().filter(|l| l.deductible.is_some()).collect();
        let applied = applied_lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(&l.deductible.unwrap_or_default()))?;
        if applied > remaining {
            discrepancies.push(Discrepancy {
                subject: "Deductible applied compared with the deductible remaining".to_string(),
                expected: remaining,
                stated: applied,
                evidence: applied_lines.iter().map(|l| &l.line_id).collect(),
                refundable: true,
            });
        }
    }

    Ok(discrepancies.into_iter().map(Discrepancy::into_finding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InsuranceContext;
    use crate::line::LineItem;
    use crate::normalizer::DocumentFacts;
    use core_kernel::LineSource;

    fn input_for<'a>(
        bills: &'a [LineItem],
        eobs: &'a [LineItem],
        context: &'a InsuranceContext,
        facts: &'a DocumentFacts,
    ) -> AuditInput<'a> {
        AuditInput {
            bill_lines: bills,
            eob_lines: eobs,
            matches: &[],
            context,
            bill_facts: facts,
        }
    }

    #[test]
    fn test_unit_price_overstatement() {
        let mut line = LineItem::new(LineId::new(LineSource::Bill, 1), LineSource::Bill);
        line.code = Some("97110".into());
        line.units = 2;
        line.unit_price = Some(Money::from_cents(5000));
        line.charge = Money::from_cents(15000);

        let context = InsuranceContext::default();
        let facts = DocumentFacts::default();
        let bills = [line];
        let findings = math_posting_errors(&input_for(&bills, &[], &context, &facts)).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].savings.cents(), 5000);
        assert_eq!(findings[0].comparison.unwrap().difference().cents(), 5000);
        assert_eq!(findings[0].confidence, 1.0);
    }

    #[test]
    fn test_one_cent_is_tolerated() {
        let mut line = LineItem::new(LineId::new(LineSource::Bill, 1), LineSource::Bill);
        line.units = 3;
        line.unit_price = Some(Money::from_cents(3333));
        line.charge = Money::from_cents(10000);

        let context = InsuranceContext::default();
        let facts = DocumentFacts::default();
        let bills = [line];
        assert!(math_posting_errors(&input_for(&bills, &[], &context, &facts))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_understated_total_has_no_savings() {
        let mut line = LineItem::new(LineId::new(LineSource::Bill, 1), LineSource::Bill);
        line.charge = Money::from_cents(10000);
        let facts = DocumentFacts {
            total_charges: Some(Money::from_cents(9000)),
            ..Default::default()
        };
        let context = InsuranceContext::default();
        let bills = [line];
        let findings = math_posting_errors(&input_for(&bills, &[], &context, &facts)).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].savings.is_zero());
    }
}
