//! Route handlers

pub mod audits;
pub mod health;
