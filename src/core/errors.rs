//! Core error types

use thiserror::Error;

use crate::core::toplevel::ToplevelId;

/// Recoverable toplevel-management errors.
///
/// Misuse of the compositor-facing API (self-parenting, a handle token from
/// another manager) is not represented here: it panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Failed to create binding for toplevel {toplevel}: {reason}")]
    BindingFailed { toplevel: ToplevelId, reason: String },

    #[error("Invalid toplevel ID: {0}")]
    InvalidToplevelId(ToplevelId),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    pub fn binding_failed(toplevel: ToplevelId, reason: impl Into<String>) -> Self {
        Self::BindingFailed { toplevel, reason: reason.into() }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
