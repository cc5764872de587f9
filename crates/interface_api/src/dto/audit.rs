//! Audit DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::AuditId;
use domain_audit::{ExtractedDocument, InsuranceContext};
use domain_pricing::TieredPricing;
use domain_report::Preview;

/// Most lines accepted per document
pub const MAX_LINES_PER_DOCUMENT: usize = 2000;

/// Extracted documents to audit. Either document may be missing, but not both.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_line_counts"))]
pub struct CreateAuditRequest {
    #[serde(default)]
    pub bill: Option<ExtractedDocument>,
    #[serde(default)]
    pub eob: Option<ExtractedDocument>,
    #[serde(default)]
    pub insurance: Option<InsuranceContext>,
}

fn validate_line_counts(request: &CreateAuditRequest) -> Result<(), ValidationError> {
    let too_long = [&request.bill, &request.eob]
        .into_iter()
        .flatten()
        .any(|doc| doc.lines.len() > MAX_LINES_PER_DOCUMENT);

    if too_long {
        let mut err = ValidationError::new("too_many_lines");
        err.message = Some(format!("a document may hold at most {MAX_LINES_PER_DOCUMENT} lines").into());
        return Err(err);
    }
    Ok(())
}

/// Teaser returned right after an audit; the full report is fetched by id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditResponse {
    pub audit_id: AuditId,
    pub preview: Preview,
    pub pricing: TieredPricing,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_audit::{DocumentType, RawLine};

    fn bill_with(lines: usize) -> ExtractedDocument {
        let mut doc = ExtractedDocument::new(DocumentType::Bill);
        doc.lines = vec![RawLine::default(); lines];
        doc
    }

    #[test]
    fn test_line_limit() {
        let ok = CreateAuditRequest {
            bill: Some(bill_with(MAX_LINES_PER_DOCUMENT)),
            ..CreateAuditRequest::default()
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateAuditRequest {
            bill: Some(bill_with(MAX_LINES_PER_DOCUMENT + 1)),
            ..CreateAuditRequest::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_missing_documents_pass_validation() {
        // Rejected later by the pipeline with a 400
        assert!(CreateAuditRequest::default().validate().is_ok());
    }

    #[test]
    fn test_deserializes_partial_body() {
        let request: CreateAuditRequest =
            serde_json::from_str(r#"{"eob": {"documentType": "eob", "lines": []}}"#).unwrap();
        assert!(request.bill.is_none());
        assert!(request.eob.is_some());
        assert!(request.insurance.is_none());
    }
}
