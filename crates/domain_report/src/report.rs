//! The complete audit report

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{AuditId, Money};
use domain_audit::matcher::match_rate_percent;
use domain_audit::{
    DocumentFacts, EngineResult, Finding, InsuranceContext, LineItem, LineMatch, RuleId,
    RuleOutcome,
};
use domain_pricing::{tiered_pricing, TieredPricing};

use crate::checklist::{build_checklist, ChecklistItem};
use crate::citations::{collect_citations, CitationEntry};
use crate::error::ReportError;
use crate::letter::appeal_letter;
use crate::line_audit::{build_line_audit, LineAuditRow};
use crate::preview::{build_preview, Preview};
use crate::scripts::{phone_scripts, PhoneScripts};
use crate::summary::{summarize, ReportSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentsProcessed {
    pub bill: bool,
    pub eob: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub processing_timestamp: DateTime<Utc>,
    pub rules_executed: usize,
    pub documents_processed: DocumentsProcessed,
    pub match_rate_percent: u8,
    /// Data quality of the run, 0 to 100
    pub confidence_score: u8,
    pub rule_outcomes: BTreeMap<RuleId, RuleOutcome>,
    /// Scalar fields that could not be parsed and fell back to a default
    pub defaulted_fields: usize,
    /// Raw lines discarded as noise
    pub dropped_lines: usize,
}

/// Everything the consumer receives for one audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub audit_id: AuditId,
    pub summary: ReportSummary,
    pub line_audit: Vec<LineAuditRow>,
    /// Ranked by savings, highest first
    pub findings: Vec<Finding>,
    pub checklist: Vec<ChecklistItem>,
    pub appeal_letter: String,
    pub scripts: PhoneScripts,
    pub citations: Vec<CitationEntry>,
    pub pricing: TieredPricing,
    pub metadata: ReportMetadata,
}

impl AuditReport {
    /// Total of all finding savings
    pub fn potential_savings(&self) -> Money {
        self.summary.potential_savings
    }

    /// The free teaser for this report
    pub fn preview(&self) -> Preview {
        build_preview(&self.findings, self.summary.potential_savings, &self.pricing.quote)
    }
}

/// Inputs to composition; everything the engine consumed plus its result
#[derive(Debug, Clone)]
pub struct ComposeInput<'a> {
    pub audit_id: AuditId,
    pub bill_lines: &'a [LineItem],
    pub eob_lines: &'a [LineItem],
    pub matches: &'a [LineMatch],
    pub context: &'a InsuranceContext,
    pub bill_facts: &'a DocumentFacts,
    pub result: &'a EngineResult,
    pub defaulted_fields: usize,
    pub dropped_lines: usize,
    pub now: DateTime<Utc>,
}

/// Earliest to latest bill service date, e.g. `01/01/2024 - 01/03/2024`
fn service_dates(bill_lines: &[LineItem]) -> Option<String> {
    let mut dated: Vec<(chrono::NaiveDate, &str)> = bill_lines
        .iter()
        .filter_map(|l| Some((l.service_date()?, l.date_of_service.as_deref()?)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let (_, first) = dated.first()?;
    let (_, last) = dated.last()?;
    if first == last {
        Some(first.to_string())
    } else {
        Some(format!("{} - {}", first, last))
    }
}

/// Findings ranked by savings; equal savings keep execution order
fn rank_findings(findings: &[Finding]) -> Vec<Finding> {
    let mut ranked = findings.to_vec();
    ranked.sort_by(|a, b| b.savings.cmp(&a.savings));
    ranked
}

/// Builds the report from one engine run
pub fn compose_report(input: ComposeInput<'_>) -> Result<AuditReport, ReportError> {
    let result = input.result;
    let findings = rank_findings(&result.findings);
    let total = result.total_savings;

    debug_assert_eq!(
        findings.iter().map(|f| f.savings).sum::<Money>(),
        total,
        "finding savings must add up to the run total"
    );

    let any_eob_matched = input.matches.iter().any(LineMatch::is_matched);
    let any_lines = !input.bill_lines.is_empty() || !input.eob_lines.is_empty();

    let summary = summarize(&findings, total, any_eob_matched, any_lines);
    let line_audit = build_line_audit(input.bill_lines, input.eob_lines, input.matches, &findings);
    let checklist = build_checklist(&findings);
    let letter = appeal_letter(
        &findings,
        total,
        input.context,
        input.bill_facts,
        service_dates(input.bill_lines).as_deref(),
        input.now.date_naive(),
    );
    let scripts = phone_scripts(&findings, total, input.context);
    let citations = collect_citations(&findings);
    let pricing = tiered_pricing(summary.potential_savings)?;

    let metadata = ReportMetadata {
        processing_timestamp: input.now,
        rules_executed: result.rules_executed,
        documents_processed: DocumentsProcessed {
            bill: !input.bill_lines.is_empty(),
            eob: !input.eob_lines.is_empty(),
        },
        match_rate_percent: match_rate_percent(input.matches),
        confidence_score: result.confidence_score,
        rule_outcomes: result.rule_outcomes.clone(),
        defaulted_fields: input.defaulted_fields,
        dropped_lines: input.dropped_lines,
    };

    debug!(
        audit_id = %input.audit_id,
        findings = findings.len(),
        checklist = checklist.len(),
        citations = citations.len(),
        "Composed audit report"
    );

    Ok(AuditReport {
        audit_id: input.audit_id,
        summary,
        line_audit,
        findings,
        checklist,
        appeal_letter: letter,
        scripts,
        citations,
        pricing,
        metadata,
    })
}
