//! Report domain errors

use thiserror::Error;

use core_kernel::MoneyError;
use domain_audit::AuditError;

/// Errors that stop a report from being produced.
///
/// Zero findings is never an error; these mean the analysis did not run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No documents were provided for analysis")]
    NoDocuments,

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("Pricing failed: {0}")]
    Pricing(#[from] MoneyError),
}
