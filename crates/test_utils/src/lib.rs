//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! bill audit test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built documents, contexts, and scenarios
//! - `builders`: Builder patterns for line items and extracted documents
//! - `assertions`: Custom assertion helpers for findings and money
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
