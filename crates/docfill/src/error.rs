//! Conversion errors

use thiserror::Error;

/// Result type for a conversion run
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// A failure that aborts the whole conversion
///
/// Skipped placeholders are not errors; they are logged and the run continues.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reading the spreadsheet failed
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] docfill_xlsx::XlsxError),

    /// Reading or rewriting the template failed
    #[error("Template error: {0}")]
    Docx(#[from] docfill_docx::DocxError),

    /// A named range could not be resolved
    #[error(transparent)]
    Core(#[from] docfill_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
