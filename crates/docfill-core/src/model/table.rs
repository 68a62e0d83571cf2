//! Table cells and their resolved styles

use std::collections::BTreeMap;

/// Horizontal alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizontalAlignment {
    /// General alignment (text left, numbers right)
    General,
    /// Left aligned
    Left,
    /// Center aligned
    #[default]
    Center,
    /// Right aligned
    Right,
    /// Fill (repeat content to fill cell width)
    Fill,
    /// Justify (stretch to fit width)
    Justify,
    /// Center across selection
    CenterContinuous,
    /// Distributed
    Distributed,
}

impl HorizontalAlignment {
    /// Parse the spreadsheet attribute value
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "fill" => Some(Self::Fill),
            "justify" => Some(Self::Justify),
            "centerContinuous" => Some(Self::CenterContinuous),
            "distributed" => Some(Self::Distributed),
            _ => None,
        }
    }
}

/// Vertical alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerticalAlignment {
    /// Top aligned
    Top,
    /// Center aligned
    #[default]
    Center,
    /// Bottom aligned
    Bottom,
    /// Justify
    Justify,
    /// Distributed
    Distributed,
}

impl VerticalAlignment {
    /// Parse the spreadsheet attribute value
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            "justify" => Some(Self::Justify),
            "distributed" => Some(Self::Distributed),
            _ => None,
        }
    }
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderKind {
    /// No border
    #[default]
    None,
    /// Thin line
    Thin,
    /// Medium line
    Medium,
    /// Thick line
    Thick,
    /// Dashed line
    Dashed,
    /// Dotted line
    Dotted,
    /// Double line
    Double,
    /// Hair line (very thin)
    Hair,
    /// Medium dashed
    MediumDashed,
    /// Dash-dot
    DashDot,
    /// Medium dash-dot
    MediumDashDot,
    /// Dash-dot-dot
    DashDotDot,
    /// Medium dash-dot-dot
    MediumDashDotDot,
    /// Slant dash-dot
    SlantDashDot,
}

impl BorderKind {
    /// Parse the spreadsheet `style` attribute of a border edge
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "thin" => Some(Self::Thin),
            "medium" => Some(Self::Medium),
            "thick" => Some(Self::Thick),
            "dashed" => Some(Self::Dashed),
            "dotted" => Some(Self::Dotted),
            "double" => Some(Self::Double),
            "hair" => Some(Self::Hair),
            "mediumDashed" => Some(Self::MediumDashed),
            "dashDot" => Some(Self::DashDot),
            "mediumDashDot" => Some(Self::MediumDashDot),
            "dashDotDot" => Some(Self::DashDotDot),
            "mediumDashDotDot" => Some(Self::MediumDashDotDot),
            "slantDashDot" => Some(Self::SlantDashDot),
            _ => None,
        }
    }
}

/// One edge of a cell border
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderInfo {
    /// 6-hex-digit RGB
    pub color: String,
    /// Line style
    pub kind: BorderKind,
}

impl BorderInfo {
    /// Create a new border edge
    pub fn new(color: impl Into<String>, kind: BorderKind) -> Self {
        Self {
            color: color.into(),
            kind,
        }
    }
}

/// Fully resolved style of one cell
///
/// Every attribute has already been defaulted at the style-resolution
/// boundary; renderers never substitute defaults of their own.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellStyle {
    pub font_name: Option<String>,
    /// Points, already scaled
    pub font_size: Option<f64>,
    /// 6-hex-digit RGB
    pub font_color: String,
    pub bold: bool,
    pub italic: bool,
    /// 6-hex-digit RGB
    pub background_color: String,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub border_top: BorderInfo,
    pub border_bottom: BorderInfo,
    pub border_left: BorderInfo,
    pub border_right: BorderInfo,
}

/// A logical (possibly merged) table cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellData {
    /// Display text, already number/date/currency formatted
    pub value: Option<String>,
    /// Row number (1-based, worksheet coordinates)
    pub row: u32,
    /// Column number (1-based, worksheet coordinates)
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    pub style: CellStyle,
    /// Fraction of the table width occupied by this cell (0-1)
    pub column_ratio: f64,
    /// Row height in points, already scaled
    pub row_height: f64,
    /// Line spacing derived from the font size
    pub line_spacing: Option<f64>,
}

impl CellData {
    /// Whether this cell anchors a merged region
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}

/// A table extracted from a multi-cell named range
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableData {
    /// Bookmark the table is rendered at
    pub bookmark: String,
    /// Total table width in centimetres
    pub width_cm: f64,
    /// Width share of every column in the range, left to right
    pub column_ratios: Vec<f64>,
    /// One entry per logical cell, row-major
    pub cells: Vec<CellData>,
}

impl TableData {
    /// Group cells by row, rows ascending and cells ordered by column
    pub fn rows(&self) -> Vec<(u32, Vec<&CellData>)> {
        let mut rows: BTreeMap<u32, Vec<&CellData>> = BTreeMap::new();
        for cell in &self.cells {
            rows.entry(cell.row).or_default().push(cell);
        }
        rows.into_iter()
            .map(|(row, mut cells)| {
                cells.sort_by_key(|c| c.col);
                (row, cells)
            })
            .collect()
    }

    /// Find the cell anchored at a coordinate
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&CellData> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}
