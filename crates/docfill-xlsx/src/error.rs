//! XLSX error types

use thiserror::Error;

/// Result type for spreadsheet operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading a workbook
#[derive(Debug, Error)]
pub enum XlsxError {
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
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A named range points at a worksheet the workbook does not contain
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// Core error (range lookup, markup, packaging)
    #[error(transparent)]
    Core(#[from] docfill_core::Error),
}
