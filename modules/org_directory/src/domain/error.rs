use thiserror::Error;

use tabular::TabularError;

/// Fatal precondition failures. These are the only errors that escape a
/// top-level import call; everything row-scoped travels as data inside
/// [`crate::domain::validate::ValidationResult`] and the batch outcome.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    File(#[from] TabularError),

    #[error("reference data unavailable: {message}")]
    Precondition { message: String },

    #[error("directory store error: {message}")]
    Store { message: String },
}

impl ImportError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// Row-scoped validation errors. Fatal only to the record that carries them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Unparsable or malformed field value.
    #[error("{field}: {message}")]
    Format { field: &'static str, message: String },

    /// Identifier or code that does not resolve against the directory.
    #[error("{message}")]
    Referential { message: String },

    /// Permission denial, self-assignment, disallowed tier pairing.
    #[error("{message}")]
    BusinessRule { message: String },
}

impl RecordError {
    pub fn format(field: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            field,
            message: message.into(),
        }
    }

    pub fn referential(message: impl Into<String>) -> Self {
        Self::Referential {
            message: message.into(),
        }
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule {
            message: message.into(),
        }
    }
}

/// Non-fatal findings. The record still proceeds to persistence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordWarning {
    #[error("{field}: whitespace removed from '{raw}'")]
    WhitespaceNormalized { field: &'static str, raw: String },

    #[error("duplicate within this import: {identity} (already accepted, write is idempotent)")]
    Duplicate { identity: String },

    #[error("genero: unrecognized value '{raw}', left unset")]
    UnrecognizedGender { raw: String },
}
