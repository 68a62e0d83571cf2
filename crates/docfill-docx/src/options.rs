//! Rendering options

/// Fixed constants applied while rewriting a template
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Widest a table may be laid out, in centimetres (default: 16.5)
    ///
    /// A wider table is clamped to this width and right-justified.
    pub max_table_width_cm: f64,
    /// Image width when no prior image sets one, in EMU (default: 3,000,000)
    pub default_image_width_emu: i64,
    /// Image height when no prior image sets one, in EMU (default: 2,000,000)
    pub default_image_height_emu: i64,
    /// Bookmark whose text is colored when no formatting can be inherited
    /// (default: `D1`)
    pub highlighted_bookmark: String,
    /// Color used for that bookmark (default: `FFFFFF`)
    pub highlight_color: String,
    /// Cell values that count as "no content", compared case-insensitively
    /// (default: `#N/A`, `DONE`)
    pub sentinels: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_table_width_cm: 16.5,
            default_image_width_emu: 3_000_000,
            default_image_height_emu: 2_000_000,
            highlighted_bookmark: "D1".to_string(),
            highlight_color: "FFFFFF".to_string(),
            sentinels: vec!["#N/A".to_string(), "DONE".to_string()],
        }
    }
}

impl RenderOptions {
    /// Whether a cell value renders as nothing
    pub fn is_blank(&self, value: Option<&str>) -> bool {
        match value {
            None => true,
            Some(v) => v.is_empty() || self.sentinels.iter().any(|s| s.eq_ignore_ascii_case(v)),
        }
    }
}
