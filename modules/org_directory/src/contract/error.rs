use thiserror::Error;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone)]
pub enum OrgDirectoryError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Internal error")]
    Internal,
}

impl OrgDirectoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
