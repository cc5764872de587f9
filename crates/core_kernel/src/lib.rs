//! Core Kernel - Foundational types shared by the bill audit crates
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money in exact integer cents, with dollar parsing and formatting at the edges
//! - Percentage rates for coinsurance arithmetic
//! - Audit and line item identifiers

pub mod money;
pub mod identifiers;
pub mod error;

pub use money::{Money, MoneyError, Rate};
pub use identifiers::{AuditId, LineId, LineSource};
pub use error::CoreError;
