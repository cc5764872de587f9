//! End-to-end audit: documents in, report out

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use core_kernel::AuditId;
use domain_audit::{
    normalize_as, AuditEngine, AuditInput, DocumentFacts, DocumentType, ExtractedDocument,
    InsuranceContext, LineMatcher, NormalizedDocument,
};

use crate::error::ReportError;
use crate::report::{compose_report, AuditReport, ComposeInput};

/// Normalizer, matcher, engine and composer wired together
#[derive(Debug, Clone, Default)]
pub struct AuditPipeline {
    matcher: LineMatcher,
    engine: AuditEngine,
}

impl AuditPipeline {
    /// Pipeline with default match weights and the standard rules
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: AuditEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_matcher(mut self, matcher: LineMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Audits the documents.
    ///
    /// At least one document is required. A document whose type does not
    /// fit its slot is rejected. Documents without usable lines still give a
    /// report, with zero findings and a reduced confidence score.
    #[instrument(skip_all, fields(has_bill = bill.is_some(), has_eob = eob.is_some()))]
    pub fn run(
        &self,
        bill: Option<&ExtractedDocument>,
        eob: Option<&ExtractedDocument>,
        context: &InsuranceContext,
        now: DateTime<Utc>,
    ) -> Result<AuditReport, ReportError> {
        if bill.is_none() && eob.is_none() {
            return Err(ReportError::NoDocuments);
        }

        let bill = normalize_slot(bill, DocumentType::Bill)?;
        let eob = normalize_slot(eob, DocumentType::Eob)?;

        let (bill_lines, bill_facts, bill_defaulted, bill_dropped) = match bill {
            Some(doc) => (doc.lines, doc.facts, doc.defaulted_fields, doc.dropped_lines),
            None => (Vec::new(), DocumentFacts::default(), 0, 0),
        };
        let (eob_lines, eob_defaulted, eob_dropped) = match eob {
            Some(doc) => (doc.lines, doc.defaulted_fields, doc.dropped_lines),
            None => (Vec::new(), 0, 0),
        };

        let matches = self.matcher.match_lines(&bill_lines, &eob_lines);
        let input = AuditInput {
            bill_lines: &bill_lines,
            eob_lines: &eob_lines,
            matches: &matches,
            context,
            bill_facts: &bill_facts,
        };
        let result = self.engine.run(&input);

        let report = compose_report(ComposeInput {
            audit_id: AuditId::new_v7(),
            bill_lines: &bill_lines,
            eob_lines: &eob_lines,
            matches: &matches,
            context,
            bill_facts: &bill_facts,
            result: &result,
            defaulted_fields: bill_defaulted + eob_defaulted,
            dropped_lines: bill_dropped + eob_dropped,
            now,
        })?;

        info!(
            audit_id = %report.audit_id,
            bill_lines = bill_lines.len(),
            eob_lines = eob_lines.len(),
            findings = report.findings.len(),
            savings_cents = report.potential_savings().cents(),
            price_dollars = report.pricing.quote.price_dollars,
            "Audit complete"
        );

        Ok(report)
    }
}

fn normalize_slot(
    document: Option<&ExtractedDocument>,
    expected: DocumentType,
) -> Result<Option<NormalizedDocument>, ReportError> {
    document
        .map(|doc| normalize_as(doc, expected))
        .transpose()
        .map_err(ReportError::from)
}
