//! # docfill-core
//!
//! Core data structures shared by the docfill spreadsheet and document crates.
//!
//! This crate provides:
//! - [`CellRef`], [`RangeSpan`] and [`NamedRangeCollection`] - named-range geometry
//! - [`Request`] and its parts - the extraction result handed to the renderers
//! - [`xml::XmlTree`] - an arena-backed markup tree for in-place rewrites
//! - [`package::Package`] - an in-memory zip container with relationship helpers
//!
//! ## Example
//!
//! ```rust
//! use docfill_core::{column_to_letters, letters_to_column, CellRef};
//!
//! assert_eq!(letters_to_column("AA").unwrap(), 27);
//! assert_eq!(column_to_letters(27), "AA");
//!
//! let cell: CellRef = "$C$4".parse().unwrap();
//! assert_eq!((cell.row, cell.col), (4, 3));
//! ```

pub mod address;
pub mod chartml;
pub mod error;
pub mod model;
pub mod named_range;
pub mod package;
pub mod xml;

pub use address::{column_to_letters, letters_to_column, CellRef};
pub use error::{Error, Result};
pub use model::{
    BorderInfo, BorderKind, CellData, CellStyle, ChartData, HorizontalAlignment, ImageData,
    Request, SeriesData, SeriesKind, TableData, VerticalAlignment,
};
pub use named_range::{parse_reference, DefinedName, NamedRange, NamedRangeCollection, RangeSpan};
pub use package::{Package, Relationship};

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
