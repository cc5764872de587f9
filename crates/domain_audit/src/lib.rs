//! Bill Audit Domain
//!
//! Turns extracted bill and EOB documents into ranked findings:
//!
//! ```text
//! ExtractedDocument -> normalize -> LineItem[] -> LineMatcher -> LineMatch[]
//!                   -> AuditEngine (18 rules) -> Finding[] + RuleOutcome map
//! ```
//!
//! Everything here is synchronous and side-effect free apart from tracing.

pub mod context;
pub mod engine;
pub mod error;
pub mod finding;
pub mod line;
pub mod matcher;
pub mod normalizer;
pub mod rules;
pub mod similarity;

pub use context::InsuranceContext;
pub use engine::{AuditEngine, EngineResult, RuleOutcome, RuleStatus};
pub use error::{AuditError, RuleError};
pub use finding::{AmountComparison, Citation, Finding, Severity};
pub use line::{DocumentType, ExtractedDocument, LineItem, RawLine, RawModifiers, RawValue};
pub use matcher::{LineMatch, LineMatcher, MatchTier, MatchWeights};
pub use normalizer::{normalize_as, normalize_document, DocumentFacts, Normalized, NormalizedDocument};
pub use rules::{AuditInput, Priority, RuleDefinition, RuleFn, RuleId, STANDARD_RULES};
