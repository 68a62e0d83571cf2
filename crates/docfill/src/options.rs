//! Conversion options

use docfill_docx::RenderOptions;
use docfill_xlsx::ExtractOptions;

/// Options for a whole conversion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    /// Constants used while reading the spreadsheet
    pub extract: ExtractOptions,
    /// Constants used while rewriting the template
    pub render: RenderOptions,
}

impl ConvertOptions {
    /// Set the widest a rendered table may be, in centimetres
    pub fn with_max_table_width(mut self, cm: f64) -> Self {
        self.render.max_table_width_cm = cm;
        self
    }
}
