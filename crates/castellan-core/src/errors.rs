//! Unified error system for the Castellan engine
//!
//! One error type shared by every crate in the workspace. Data drift in
//! stored permissions (unknown actions, stale condition ids) is never an
//! error — those are silently dropped by the engine. The variants here cover
//! the hard failures only.

use serde::{Deserialize, Serialize};

/// Unified error type for all Castellan operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum EngineError {
    /// A registry write was attempted after the boot window closed
    #[error("Registration window closed: {message}")]
    RegistrationClosed {
        /// Which registry rejected the write
        message: String,
    },

    /// Malformed caller input (check payloads, token bodies, action shapes)
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the invalid input
        message: String,
    },

    /// A domain rule was violated (reserved role mutation, last super admin)
    #[error("Application error: {message}")]
    Application {
        /// Error message describing the violated rule
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// A condition handler failed while evaluating a principal
    #[error("Condition handler failed: {message}")]
    Condition {
        /// Error message from the failing handler
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl EngineError {
    /// Create a registration-window-closed error
    pub fn registration_closed(message: impl Into<String>) -> Self {
        Self::RegistrationClosed {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an application error
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a condition handler error
    pub fn condition(message: impl Into<String>) -> Self {
        Self::Condition {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Castellan operations
pub type Result<T> = std::result::Result<T, EngineError>;
