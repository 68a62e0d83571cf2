//! The extraction result handed to the renderers

use std::collections::BTreeMap;

use super::chart::ChartData;
use super::table::TableData;

/// An image link bound to a bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageData {
    /// Target bookmark name
    pub bookmark: String,
    /// Image URI or path, referenced externally
    pub link: String,
}

/// Everything extracted from one spreadsheet
///
/// Pure data: built once by the assembler, consumed once by the renderers.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    /// Bookmark name -> replacement text
    pub text: BTreeMap<String, String>,
    pub tables: Vec<TableData>,
    pub charts: Vec<ChartData>,
    pub images: Vec<ImageData>,
}

impl Request {
    /// Check whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tables.is_empty() && self.charts.is_empty() && self.images.is_empty()
    }
}
