//! Audit Report Domain
//!
//! Turns engine findings into the consumer facing report and drives the
//! whole audit from extracted documents to that report.
//!
//! # Pipeline
//!
//! ```text
//! bill/EOB documents -> normalize -> match -> AuditEngine -> compose -> AuditReport
//!                                                                  \-> pricing
//! ```

pub mod checklist;
pub mod citations;
pub mod error;
pub mod letter;
pub mod line_audit;
pub mod pipeline;
pub mod preview;
pub mod report;
pub mod scripts;
pub mod summary;

pub use checklist::{build_checklist, ActionPriority, ChecklistItem, MAX_CHECKLIST_ITEMS};
pub use citations::{collect_citations, CitationEntry};
pub use error::ReportError;
pub use letter::appeal_letter;
pub use line_audit::{build_line_audit, LineAuditRow};
pub use pipeline::AuditPipeline;
pub use preview::{build_preview, CallToAction, Preview, TeaserFinding};
pub use report::{compose_report, AuditReport, ComposeInput, DocumentsProcessed, ReportMetadata};
pub use scripts::{phone_scripts, PhoneScripts};
pub use summary::{summarize, ReportSummary, SavingsBasis};
