//! # docfill-xlsx
//!
//! Spreadsheet side of docfill: reads a workbook's defined names, cells,
//! styles and charts, and turns named ranges into the shared data model.
//!
//! ```no_run
//! use docfill_xlsx::{ExtractOptions, TableExtractor, XlsxWorkbook};
//!
//! let workbook = XlsxWorkbook::open_file("report.xlsx")?;
//! let range = workbook.names().resolve("Revenue")?;
//! let sheet = workbook.worksheet(&range.sheet)?;
//! let options = ExtractOptions::default();
//! let table = TableExtractor::new(workbook.styles(), &options).extract(&sheet, &range);
//! println!("{} cells", table.cells.len());
//! # Ok::<(), docfill_xlsx::XlsxError>(())
//! ```

pub mod chart;
pub mod error;
pub mod number_format;
pub mod options;
pub mod reader;
pub mod styles;
pub mod table;
pub mod value;

pub use chart::{read_chart, ChartExtractor};
pub use error::{XlsxError, XlsxResult};
pub use options::ExtractOptions;
pub use reader::{Worksheet, XlsxWorkbook};
pub use table::TableExtractor;
pub use value::{is_image_link, read_single_value, SingleValue};
