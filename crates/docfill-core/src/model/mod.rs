//! The extraction data model
//!
//! Spreadsheet readers produce these values and document renderers consume
//! them; nothing here refers back to either package.

pub mod chart;
pub mod request;
pub mod table;

pub use chart::{ChartData, SeriesData, SeriesKind};
pub use request::{ImageData, Request};
pub use table::{
    BorderInfo, BorderKind, CellData, CellStyle, HorizontalAlignment, TableData,
    VerticalAlignment,
};
