//! # docfill
//!
//! Fill a document template from a spreadsheet.
//!
//! Named ranges in the workbook are matched to bookmarks of the same name in
//! the template: a single cell becomes text (or an image link when it names
//! an image file) and a multi-cell range becomes a table. Charts are matched
//! by title and get the workbook chart's cached series. All bookmarks are
//! removed from the output.
//!
//! ## Example
//!
//! ```no_run
//! use docfill::prelude::*;
//!
//! let spreadsheet = std::fs::read("figures.xlsx")?;
//! let template = std::fs::read("template.docx")?;
//! let report = convert(&spreadsheet, &template)?;
//! std::fs::write("report.docx", report)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod prelude;

pub use assembler::RequestAssembler;
pub use error::{ConvertError, ConvertResult};
pub use options::ConvertOptions;
pub use pipeline::{
    convert, convert_files, convert_with_options, default_output_path, extract, render,
    RenderSummary,
};

// Re-export the data model and the two document types
pub use docfill_core::{
    BorderInfo, BorderKind, CellData, CellStyle, ChartData, HorizontalAlignment, ImageData,
    Request, SeriesData, SeriesKind, TableData, VerticalAlignment,
};
pub use docfill_docx::{RenderOptions, RewriteOutcome, TemplateDocument};
pub use docfill_xlsx::{ExtractOptions, XlsxWorkbook};
