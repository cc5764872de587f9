//! Line-by-line audit table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use core_kernel::{LineId, Money};
use domain_audit::{Finding, LineItem, LineMatch, MatchTier, RuleId};

/// One row per bill line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAuditRow {
    pub line_id: LineId,
    pub code: Option<String>,
    pub description: String,
    pub date_of_service: Option<String>,
    #[serde(rename = "chargeCents")]
    pub charge: Money,
    /// Patient responsibility stated on the bill
    #[serde(rename = "billPatientRespCents")]
    pub bill_patient_resp: Option<Money>,
    /// Allowed amount of the matched EOB line; None when unmatched
    #[serde(rename = "allowedCents")]
    pub allowed: Option<Money>,
    /// Patient responsibility of the matched EOB line; None when unmatched
    #[serde(rename = "eobPatientRespCents")]
    pub eob_patient_resp: Option<Money>,
    pub matched_eob_line_id: Option<LineId>,
    pub match_confidence: f64,
    pub match_tier: MatchTier,
    /// Rules whose findings cite this line, in finding order
    pub rules_triggered: Vec<RuleId>,
}

/// Builds the table in bill line order
pub fn build_line_audit(
    bill_lines: &[LineItem],
    eob_lines: &[LineItem],
    matches: &[LineMatch],
    findings: &[Finding],
) -> Vec<LineAuditRow> {
    let eob_by_id: HashMap<&LineId, &LineItem> =
        eob_lines.iter().map(|l| (&l.line_id, l)).collect();
    let match_by_bill: HashMap<&LineId, &LineMatch> =
        matches.iter().map(|m| (&m.bill_line_id, m)).collect();

    bill_lines
        .iter()
        .map(|bill| {
            let record = match_by_bill.get(&bill.line_id);
            let eob = record
                .and_then(|m| m.eob_line_id.as_ref())
                .and_then(|id| eob_by_id.get(id).copied());

            let mut rules_triggered: Vec<RuleId> = Vec::new();
            for finding in findings {
                if finding.evidence_line_ids.contains(&bill.line_id)
                    && !rules_triggered.contains(&finding.rule_id)
                {
                    rules_triggered.push(finding.rule_id);
                }
            }

            LineAuditRow {
                line_id: bill.line_id.clone(),
                code: bill.code.clone(),
                description: bill.description.clone(),
                date_of_service: bill.date_of_service.clone(),
                charge: bill.charge,
                bill_patient_resp: bill.patient_resp,
                allowed: eob.and_then(|e| e.allowed),
                eob_patient_resp: eob.and_then(|e| e.patient_resp),
                matched_eob_line_id: eob.map(|e| e.line_id.clone()),
                match_confidence: record.map(|m| m.confidence_score).unwrap_or(0.0),
                match_tier: record.map(|m| m.match_tier).unwrap_or(MatchTier::None),
                rules_triggered,
            }
        })
        .collect()
}
