//! Prelude module - common imports for docfill users
//!
//! ```rust
//! use docfill::prelude::*;
//! ```

pub use crate::{
    // Pipeline
    convert,
    convert_files,
    convert_with_options,
    // Data model
    ChartData,
    ConvertError,
    ConvertOptions,
    ConvertResult,
    ExtractOptions,
    ImageData,
    RenderOptions,
    RenderSummary,
    Request,
    RequestAssembler,
    SeriesData,
    SeriesKind,
    TableData,
    // Template and workbook
    TemplateDocument,
    XlsxWorkbook,
};
