//! Domain-agnostic tabular file handling: parsing spreadsheet/CSV bytes into
//! header-keyed row data, heuristic column mapping, and template rendering.
//!
//! Everything in this crate is loosely typed by design; callers project rows
//! into their own strongly typed records at the boundary.

pub mod mapper;
pub mod sheet;
pub mod template;

use thiserror::Error;

/// Errors raised while turning raw bytes into tabular data.
///
/// All variants are fatal for the file being processed: nothing downstream
/// of the parser runs when one of these is returned.
#[derive(Error, Debug)]
pub enum TabularError {
    #[error("unsupported file extension '{0}' (expected xlsx, xls or csv)")]
    UnsupportedExtension(String),

    #[error("file could not be read as {kind}: {message}")]
    Unreadable { kind: &'static str, message: String },

    #[error("file contains no data rows")]
    Empty,

    #[error("template rendering failed: {0}")]
    Template(String),
}

impl TabularError {
    pub fn unreadable(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Unreadable {
            kind,
            message: message.into(),
        }
    }
}
