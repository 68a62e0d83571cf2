//! DOCX error types

use thiserror::Error;

/// Result type for template operations
pub type DocxResult<T> = std::result::Result<T, DocxError>;

/// Errors that can occur while reading or rewriting a template
#[derive(Debug, Error)]
pub enum DocxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid DOCX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Core error (markup, packaging)
    #[error(transparent)]
    Core(#[from] docfill_core::Error),
}
