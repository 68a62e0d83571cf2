//! Extraction options

use docfill_core::{BorderInfo, BorderKind};

/// Fixed constants applied while reading tables out of a workbook
///
/// Every style attribute a cell leaves unset is substituted from here, once,
/// when the cell's style is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Multiplier from spreadsheet font points to document points (default: 0.8)
    pub font_size_scale: f64,
    /// Multiplier applied to row heights (default: 0.8)
    pub row_height_scale: f64,
    /// Line spacing as a multiple of the scaled font size (default: 1.2)
    pub line_spacing_factor: f64,
    /// Column width when neither the column nor the sheet sets one (default: 8.43)
    pub default_column_width: f64,
    /// Row height when neither the row nor the sheet sets one (default: 18.75)
    pub default_row_height: f64,
    /// Border used for an absent or `none` edge (default: thin `857874`)
    pub default_border: BorderInfo,
    /// Color of a styled edge that carries no rgb (default: `FFFFFF`)
    pub unspecified_border_color: String,
    /// Cell background when the fill has no foreground rgb (default: `FFFFFF`)
    pub default_background: String,
    /// Font color when the font has no rgb (default: `FAEBC6`)
    pub default_font_color: String,
    /// Factor from summed column-width units to centimetres
    pub width_to_cm: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            font_size_scale: 0.8,
            row_height_scale: 0.8,
            line_spacing_factor: 1.2,
            default_column_width: 8.43,
            default_row_height: 18.75,
            default_border: BorderInfo::new("857874", BorderKind::Thin),
            unspecified_border_color: "FFFFFF".to_string(),
            default_background: "FFFFFF".to_string(),
            default_font_color: "FAEBC6".to_string(),
            width_to_cm: 0.0352778 * 2.54 * 1.75,
        }
    }
}
