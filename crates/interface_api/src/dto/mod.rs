//! Request and response bodies

pub mod audit;
