//! Error types for docfill-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docfill-core
#[derive(Debug, Error)]
pub enum Error {
    /// A named range was requested that the workbook does not define
    #[error("Named range not found: {0}")]
    RangeNotFound(String),

    /// A range reference does not match `sheet!cell` or `sheet!cell:cell`
    #[error("Invalid range format for '{name}': {reference}")]
    InvalidRangeFormat { name: String, reference: String },

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// A package part required by the caller is absent
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Malformed markup
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Markup that parsed but is structurally unusable
    #[error("Malformed markup in {part}: {message}")]
    Markup { part: String, message: String },

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a markup error for a part
    pub fn markup<P: Into<String>, S: Into<String>>(part: P, message: S) -> Self {
        Error::Markup {
            part: part.into(),
            message: message.into(),
        }
    }
}
