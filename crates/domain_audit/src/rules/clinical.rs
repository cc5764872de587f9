//! Clinical context rules: global surgery (R09), therapy time (R10),
//! observation overlap (R11) and room and board length of stay (R12)

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use core_kernel::{LineId, Money};

use super::citations;
use super::{is_surgical, AuditInput, RuleId};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::line::LineItem;

/// Days after a major procedure covered by the global surgical package
const GLOBAL_PERIOD_DAYS: i64 = 90;

/// Modifiers that carve a visit out of the global package
const GLOBAL_EXEMPT_MODIFIERS: &[&str] = &["24", "25", "57", "79"];

const TIMED_THERAPY_CODES: &[&str] = &[
    "97110", "97112", "97116", "97140", "97530", "97535", "97750", "97032", "97035",
];

const MAX_UNITS_PER_THERAPY_CODE: u32 = 4;
const MAX_TIMED_UNITS_PER_DAY: u32 = 8;

const OBSERVATION_CODES: &[&str] = &["G0378"];

const ROOM_AND_BOARD_KEYWORDS: &[&str] = &["room", "board", "semi-private", "private room"];

fn is_major_surgery(line: &LineItem) -> bool {
    is_surgical(line) && !line.cpt_in_range(36000, 36999)
}

fn is_post_op_visit(line: &LineItem) -> bool {
    line.cpt_in_range(99211, 99215)
}

fn is_timed_therapy(line: &LineItem) -> bool {
    TIMED_THERAPY_CODES.iter().any(|c| line.has_code(c))
}

fn is_observation(line: &LineItem) -> bool {
    OBSERVATION_CODES.iter().any(|c| line.has_code(c))
        || line.cpt_in_range(99217, 99220)
        || line.cpt_in_range(99224, 99226)
}

fn is_inpatient_care(line: &LineItem) -> bool {
    line.cpt_in_range(99221, 99223) || line.cpt_in_range(99231, 99233)
}

/// Charge spread evenly over a total number of units
fn average_unit_charge(lines: &[&LineItem]) -> Money {
    let total: Money = lines.iter().map(|l| l.charge).sum();
    let units: u32 = lines.iter().map(|l| l.units).sum();
    total.per_unit(units).unwrap_or(total)
}

/// R09: office visits inside a major procedure's 90-day global period
pub fn global_surgical_package(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let surgeries: Vec<(&LineItem, NaiveDate)> = input
        .bill_lines
        .iter()
        .filter(|l| is_major_surgery(l))
        .filter_map(|l| l.service_date().map(|d| (l, d)))
        .collect();

    if surgeries.is_empty() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for visit in input
        .bill_lines
        .iter()
        .filter(|l| is_post_op_visit(l) && !l.has_any_modifier(GLOBAL_EXEMPT_MODIFIERS))
    {
        let Some(visit_date) = visit.service_date() else {
            continue;
        };

        let surgery = surgeries.iter().find(|(_, surgery_date)| {
            let days = (visit_date - *surgery_date).num_days();
            (0..=GLOBAL_PERIOD_DAYS).contains(&days)
        });

        if let Some((surgery, _)) = surgery {
            findings.push(
                Finding::new(RuleId::R09, Severity::Warn, 0.7)
                    .explanation(format!(
                        "The visit {} falls within the {}-day global period of {}; \
                         routine post-operative care is included in the surgical fee",
                        visit.label(),
                        GLOBAL_PERIOD_DAYS,
                        surgery.label()
                    ))
                    .action("Ask whether the visit was for a problem unrelated to the surgery; if not, request removal")
                    .evidence(&visit.line_id)
                    .evidence(&surgery.line_id)
                    .savings(visit.charge)
                    .cite(citations::claims_processing("Global surgery package")),
            );
        }
    }

    Ok(findings)
}

/// R10: timed therapy units beyond per-code and per-day ceilings
pub fn therapy_time_units(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut by_date: BTreeMap<Option<&str>, Vec<&LineItem>> = BTreeMap::new();
    for line in input.bill_lines.iter().filter(|l| is_timed_therapy(l)) {
        by_date
            .entry(line.date_of_service.as_deref())
            .or_default()
            .push(line);
    }

    let mut findings = Vec::new();
    for (date, lines) in &by_date {
        let when = date.map(|d| format!(" on {}", d)).unwrap_or_default();

        // Per code ceiling
        let codes: BTreeSet<&str> = lines.iter().map(|l| l.code_str()).collect();
        let mut capped_units = 0u32;
        for code in codes {
            let same_code: Vec<&LineItem> = lines.iter().copied().filter(|l| l.has_code(code)).collect();
            let units: u32 = same_code.iter().map(|l| l.units).sum();
            capped_units += units.min(MAX_UNITS_PER_THERAPY_CODE);

            if units > MAX_UNITS_PER_THERAPY_CODE {
                let excess_units = units - MAX_UNITS_PER_THERAPY_CODE;
                let excess = average_unit_charge(&same_code).times(excess_units)?;
                findings.push(
                    Finding::new(RuleId::R10, Severity::Warn, 0.7)
                        .explanation(format!(
                            "Therapy code {} is billed for {} units{}; more than {} units of one \
                             timed service in a day is rarely supported by treatment minutes",
                            code, units, when, MAX_UNITS_PER_THERAPY_CODE
                        ))
                        .action("Request therapy notes showing the treatment minutes for each timed code")
                        .evidence_all(same_code.iter().map(|l| &l.line_id))
                        .savings(excess)
                        .cite(citations::claims_processing("Timed therapy codes and the 8-minute rule")),
                );
            }
        }

        // Per day ceiling on what remains after the per code caps
        if capped_units > MAX_TIMED_UNITS_PER_DAY {
            let excess_units = capped_units - MAX_TIMED_UNITS_PER_DAY;
            let excess = average_unit_charge(lines).times(excess_units)?;
            findings.push(
                Finding::new(RuleId::R10, Severity::Warn, 0.7)
                    .explanation(format!(
                        "{} timed therapy units are billed{}, more than the {} units a single \
                         day of treatment supports",
                        capped_units, when, MAX_TIMED_UNITS_PER_DAY
                    ))
                    .action("Request therapy notes showing total timed treatment minutes for the day")
                    .evidence_all(lines.iter().map(|l| &l.line_id))
                    .savings(excess)
                    .cite(citations::claims_processing("Timed therapy codes and the 8-minute rule")),
            );
        }
    }

    Ok(findings)
}

/// R11: observation billed on a day that already carries inpatient care
pub fn observation_vs_inpatient(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let inpatient_dates: Vec<&str> = input
        .bill_lines
        .iter()
        .filter(|l| is_inpatient_care(l))
        .filter_map(|l| l.date_of_service.as_deref())
        .collect();

    let overlapping: Vec<&LineItem> = input
        .bill_lines
        .iter()
        .filter(|l| is_observation(l))
        .filter(|l| {
            l.date_of_service
                .as_deref()
                .is_some_and(|d| inpatient_dates.contains(&d))
        })
        .collect();

    if overlapping.is_empty() {
        return Ok(Vec::new());
    }

    let inpatient_ids: Vec<&LineId> = input
        .bill_lines
        .iter()
        .filter(|l| is_inpatient_care(l))
        .filter(|l| overlapping.iter().any(|o| o.date_of_service == l.date_of_service))
        .map(|l| &l.line_id)
        .collect();

    let total: Money = overlapping.iter().map(|l| l.charge).sum();
    Ok(vec![Finding::new(RuleId::R11, Severity::Warn, 0.65)
        .explanation(format!(
            "Observation services totaling {} are billed on days you were also billed as an inpatient; \
             a day cannot be both",
            total
        ))
        .action("Ask the hospital to confirm your admission status for each day and remove the overlapping charges")
        .evidence_all(overlapping.iter().map(|l| &l.line_id))
        .evidence_all(inpatient_ids)
        .savings(total)
        .cite(citations::claims_processing("Hospital observation services"))])
}

/// R12: room and board days beyond the length of stay
pub fn room_and_board_los(input: &AuditInput<'_>) -> Result<Vec<Finding>, RuleError> {
    let rooms: Vec<&LineItem> = input
        .bill_lines
        .iter()
        .filter(|l| l.description_mentions(ROOM_AND_BOARD_KEYWORDS))
        .collect();
    if rooms.is_empty() {
        return Ok(Vec::new());
    }

    let dates: Vec<NaiveDate> = input.bill_lines.iter().filter_map(|l| l.service_date()).collect();
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return Ok(Vec::new());
    };

    let stay_days = u32::try_from((*last - *first).num_days().max(1))
        .map_err(|_| RuleError::Arithmetic("length of stay out of range".to_string()))?;
    let billed_days: u32 = rooms.iter().map(|l| l.units).sum();
    if billed_days <= stay_days {
        return Ok(Vec::new());
    }

    let excess_days = billed_days - stay_days;
    let excess = average_unit_charge(&rooms).times(excess_days)?;
    Ok(vec![Finding::new(RuleId::R12, Severity::High, 0.8)
        .explanation(format!(
            "Room and board is billed for {} days, but the dates of service span a {}-day stay",
            billed_days, stay_days
        ))
        .action("Request correction of room and board days to match your admission and discharge dates")
        .evidence_all(rooms.iter().map(|l| &l.line_id))
        .savings(excess)
        .cite(citations::fcba("Right to accurate billing"))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InsuranceContext;
    use crate::normalizer::DocumentFacts;
    use core_kernel::LineSource;

    fn bill(pos: usize, code: &str, date: &str, cents: i64) -> LineItem {
        let mut item = LineItem::new(LineId::new(LineSource::Bill, pos), LineSource::Bill);
        item.code = Some(code.to_string());
        item.charge = Money::from_cents(cents);
        item.date_of_service = Some(date.to_string());
        item
    }

    fn evaluate(rule: crate::rules::RuleFn, lines: &[LineItem]) -> Vec<Finding> {
        let context = InsuranceContext::default();
        let facts = DocumentFacts::default();
        let input = AuditInput {
            bill_lines: lines,
            eob_lines: &[],
            matches: &[],
            context: &context,
            bill_facts: &facts,
        };
        rule(&input).unwrap()
    }

    #[test]
    fn test_post_op_visit_inside_global_period() {
        let lines = vec![
            bill(1, "27447", "03/01/2024", 2_000_000),
            bill(2, "99213", "03/20/2024", 15000),
        ];
        let findings = evaluate(global_surgical_package, &lines);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].savings.cents(), 15000);
    }

    #[test]
    fn test_visit_after_global_period_is_clear() {
        let lines = vec![
            bill(1, "27447", "01/01/2024", 2_000_000),
            bill(2, "99213", "06/01/2024", 15000),
        ];
        assert!(evaluate(global_surgical_package, &lines).is_empty());
    }

    #[test]
    fn test_therapy_units_over_per_code_cap() {
        let mut line = bill(1, "97110", "04/02/2024", 60000);
        line.units = 6;
        let findings = evaluate(therapy_time_units, &[line]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].savings.cents(), 20000);
    }

    #[test]
    fn test_room_and_board_beyond_stay() {
        let mut room = bill(1, "0120", "05/01/2024", 300000);
        room.description = "Semi-private room".into();
        room.units = 3;
        let lines = vec![room, bill(2, "99223", "05/03/2024", 40000)];
        let findings = evaluate(room_and_board_los, &lines);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].savings.cents(), 100000);
    }

    #[test]
    fn test_observation_overlapping_inpatient_day() {
        let lines = vec![
            bill(1, "G0378", "06/01/2024", 80000),
            bill(2, "99222", "06/01/2024", 30000),
        ];
        let findings = evaluate(observation_vs_inpatient, &lines);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence_line_ids.len(), 2);
    }
}
