//! Named range definitions and their rectangular geometry
//!
//! A workbook binds names to reference text such as `Sheet1!$B$2:$D$9`.
//! [`NamedRangeCollection`] keeps those definitions and resolves a name into a
//! worksheet plus a normalized [`RangeSpan`].
//!
//! # Example
//!
//! ```
//! use docfill_core::{DefinedName, NamedRangeCollection};
//!
//! let mut names = NamedRangeCollection::new();
//! names.define(DefinedName::new("Summary", "'Q3 Data'!$B$2:$D$9"));
//!
//! let range = names.resolve("summary").unwrap();
//! assert_eq!(range.sheet, "Q3 Data");
//! assert_eq!((range.span.start_row, range.span.end_col), (2, 4));
//! ```

use ahash::AHashMap;

use crate::address::CellRef;
use crate::error::{Error, Result};

/// A raw `definedName` entry as stored in the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    /// The name (e.g., "Revenue"); names are case-insensitive
    pub name: String,
    /// Reference text, e.g. `Sheet1!$A$1` or `Sheet1!$A$1:$D$10`
    pub refers_to: String,
}

impl DefinedName {
    /// Create a new defined name
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refers_to: refers_to.into(),
        }
    }

    /// Whether the reference text spans more than a single cell reference
    pub fn is_multi_cell(&self) -> bool {
        self.refers_to.contains(':')
    }
}

/// Rectangular span of cells, 1-based and inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeSpan {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl RangeSpan {
    /// Create a span from two corners, normalizing so start <= end
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start_row: a.row.min(b.row),
            start_col: a.col.min(b.col),
            end_row: a.row.max(b.row),
            end_col: a.col.max(b.col),
        }
    }

    /// Span covering a single cell
    pub fn single(cell: CellRef) -> Self {
        Self::new(cell, cell)
    }

    /// Parse `A1` or `A1:C4` (absolute markers allowed)
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self::new(CellRef::parse(start)?, CellRef::parse(end)?)),
            None => Ok(Self::single(CellRef::parse(s)?)),
        }
    }

    /// Top-left corner
    pub fn start(&self) -> CellRef {
        CellRef::new(self.start_row, self.start_col)
    }

    /// Whether this span is one cell
    pub fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Number of rows covered
    pub fn row_count(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    /// Number of columns covered
    pub fn col_count(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    /// Check whether a coordinate falls inside the span
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }
}

/// A named range resolved to worksheet geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    /// The name as defined in the workbook
    pub name: String,
    /// Worksheet name, without surrounding quotes
    pub sheet: String,
    /// Covered cells
    pub span: RangeSpan,
}

impl NamedRange {
    /// Resolve a defined name's reference text
    pub fn from_defined(defined: &DefinedName) -> Result<Self> {
        let (sheet, span) = parse_reference(&defined.name, &defined.refers_to)?;
        Ok(Self {
            name: defined.name.clone(),
            sheet,
            span,
        })
    }
}

/// Split `sheet!cell` / `sheet!cell:cell` into a sheet name and span
///
/// `name` is only used to give the error some context.
pub fn parse_reference(name: &str, reference: &str) -> Result<(String, RangeSpan)> {
    let invalid = || Error::InvalidRangeFormat {
        name: name.to_string(),
        reference: reference.to_string(),
    };

    let reference = reference.trim().trim_start_matches('=');
    let (sheet, cells) = reference.rsplit_once('!').ok_or_else(invalid)?;
    let sheet = unquote_sheet_name(sheet);
    if sheet.is_empty() || cells.is_empty() {
        return Err(invalid());
    }

    if let Some((start, end)) = cells.split_once(':') {
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(invalid());
        }
    }

    let span = RangeSpan::parse(cells).map_err(|_| invalid())?;
    Ok((sheet, span))
}

/// Strip surrounding quotes from a sheet name and collapse doubled quotes
fn unquote_sheet_name(sheet: &str) -> String {
    let sheet = sheet.trim();
    match sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}

/// Collection of defined names with case-insensitive lookup
///
/// Iteration follows definition order so callers produce stable output.
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    names: Vec<DefinedName>,
    /// Lowercased name -> position in `names`
    index: AHashMap<String, usize>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; the first definition of a name wins
    pub fn define(&mut self, defined: DefinedName) {
        let key = defined.name.to_lowercase();
        if self.index.contains_key(&key) {
            log::debug!("ignoring duplicate definition of name '{}'", defined.name);
            return;
        }
        self.index.insert(key, self.names.len());
        self.names.push(defined);
    }

    /// Look up a definition by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&DefinedName> {
        self.index
            .get(&name.to_lowercase())
            .map(|&idx| &self.names[idx])
    }

    /// Resolve a name into its worksheet and span
    pub fn resolve(&self, name: &str) -> Result<NamedRange> {
        let defined = self
            .get(name)
            .ok_or_else(|| Error::RangeNotFound(name.to_string()))?;
        NamedRange::from_defined(defined)
    }

    /// Iterate over definitions in workbook order
    pub fn iter(&self) -> impl Iterator<Item = &DefinedName> {
        self.names.iter()
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
