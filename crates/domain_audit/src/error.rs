//! Audit domain errors

use thiserror::Error;

use core_kernel::MoneyError;

use crate::line::DocumentType;

/// Errors raised while preparing an audit run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Document type mismatch: expected {expected}, found {found}")]
    DocumentTypeMismatch {
        expected: DocumentType,
        found: DocumentType,
    },
}

/// Errors a single rule may report; the executor records them per rule
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Rule failed: {0}")]
    Internal(String),
}

impl From<MoneyError> for RuleError {
    fn from(err: MoneyError) -> Self {
        RuleError::Arithmetic(err.to_string())
    }
}
