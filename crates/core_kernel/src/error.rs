//! Core error types used across the system

use thiserror::Error;

/// Core error type for the kernel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Settings could not be read or parsed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Settings were read but hold an unusable value
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}
