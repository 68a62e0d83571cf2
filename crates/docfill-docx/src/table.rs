//! Table rendering at a bookmark
//!
//! The bookmark's content is cleared and a fixed-layout `w:tbl` is inserted
//! in front of the paragraph holding the end marker. Rows consisting only of
//! blanks and sentinel values are not emitted.

use docfill_core::xml::{Element, NodeId, XmlTree};
use docfill_core::{
    BorderInfo, BorderKind, CellData, CellStyle, HorizontalAlignment, TableData,
    VerticalAlignment,
};

use crate::bookmark::RewriteOutcome;
use crate::document::{paragraph_of, TemplateDocument};
use crate::error::DocxResult;
use crate::markup::append;
use crate::options::RenderOptions;

const TWIPS_PER_CM: f64 = 1440.0 / 2.54;
const TWIPS_PER_POINT: f64 = 20.0;

/// `tcPr` children that follow `tcBorders`
const AFTER_TC_BORDERS: [&str; 7] = [
    "w:shd",
    "w:noWrap",
    "w:tcMar",
    "w:textDirection",
    "w:tcFitText",
    "w:vAlign",
    "w:hideMark",
];

/// Border pattern and eighth-point width for a spreadsheet edge style
fn border_pattern(kind: BorderKind) -> (&'static str, u32) {
    match kind {
        BorderKind::Thin => ("single", 6),
        BorderKind::Medium => ("thick", 12),
        BorderKind::Thick => ("thick", 18),
        BorderKind::Dashed => ("dashed", 4),
        BorderKind::Dotted => ("dotted", 4),
        BorderKind::Double => ("double", 4),
        _ => ("none", 4),
    }
}

/// Paragraph justification and left/right indentation in twips
fn horizontal_layout(alignment: HorizontalAlignment) -> (&'static str, u32, u32) {
    match alignment {
        HorizontalAlignment::Center => ("center", 0, 0),
        HorizontalAlignment::Right => ("right", 0, 100),
        HorizontalAlignment::Left => ("left", 100, 0),
        _ => ("left", 0, 0),
    }
}

fn vertical_alignment(alignment: VerticalAlignment) -> &'static str {
    match alignment {
        VerticalAlignment::Center => "center",
        VerticalAlignment::Top => "top",
        _ => "bottom",
    }
}

fn twips(value: f64) -> String {
    (value.max(0.0).round() as u64).to_string()
}

/// Writes [`TableData`] into the template
#[derive(Debug, Clone, Copy)]
pub struct TableRenderer<'a> {
    options: &'a RenderOptions,
}

impl<'a> TableRenderer<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Replace the content of every occurrence of the table's bookmark
    pub fn render(&self, doc: &mut TemplateDocument, table: &TableData) -> DocxResult<RewriteOutcome> {
        if table.cells.is_empty() {
            log::warn!("Table '{}' has no cells, skipping", table.bookmark);
            return Ok(RewriteOutcome::NotFound);
        }

        doc.for_each_region(&table.bookmark, |_, part, region| {
            let tree = part.tree_mut();
            region.clear(tree);
            let tbl = self.build(tree, table);
            let anchor = paragraph_of(tree, region.end).unwrap_or(region.end);
            tree.insert_before(anchor, tbl);
            log::debug!("Rendered table '{}' into '{}'", table.bookmark, part.name);
            Ok(())
        })
    }

    /// Build a detached `w:tbl`
    pub fn build(&self, tree: &mut XmlTree, table: &TableData) -> NodeId {
        let clamped = table.width_cm > self.options.max_table_width_cm;
        let width_cm = table.width_cm.min(self.options.max_table_width_cm);
        let total_twips = width_cm * TWIPS_PER_CM;

        let tbl = tree.create_element(Element::new("w:tbl"));
        let tbl_pr = append(tree, tbl, "w:tblPr", &[]);
        append(tree, tbl_pr, "w:tblW", &[("w:w", twips(total_twips).as_str()), ("w:type", "dxa")]);
        append(tree, tbl_pr, "w:jc", &[("w:val", if clamped { "right" } else { "center" })]);
        let borders = append(tree, tbl_pr, "w:tblBorders", &[]);
        for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            append(tree, borders, edge, &[("w:val", "single"), ("w:sz", "0")]);
        }
        append(tree, tbl_pr, "w:tblLayout", &[("w:type", "fixed")]);

        let grid = append(tree, tbl, "w:tblGrid", &[]);
        for ratio in &table.column_ratios {
            append(tree, grid, "w:gridCol", &[("w:w", twips(ratio * total_twips).as_str())]);
        }

        let rows = table.rows();
        let last = rows.len().saturating_sub(1);
        let mut trailing_empty: Option<&[&CellData]> = None;
        let mut last_emitted: Vec<NodeId> = Vec::new();

        for (i, (_, cells)) in rows.iter().enumerate() {
            if cells.iter().all(|c| self.options.is_blank(c.value.as_deref())) {
                if i == last {
                    trailing_empty = Some(cells.as_slice());
                }
                continue;
            }

            let tr = append(tree, tbl, "w:tr", &[]);
            let tr_pr = append(tree, tr, "w:trPr", &[]);
            let height = cells.first().map_or(0.0, |c| c.row_height);
            append(tree, tr_pr, "w:trHeight", &[("w:val", twips(height * TWIPS_PER_POINT).as_str())]);

            last_emitted = cells
                .iter()
                .map(|cell| self.build_cell(tree, tr, cell, total_twips))
                .collect();
        }

        // A blank last row still contributes the table's bottom edge
        if let Some(empty) = trailing_empty {
            for (cell, &tc_pr) in empty.iter().zip(&last_emitted) {
                self.set_borders(tree, tc_pr, &cell.style);
            }
        }

        tbl
    }

    /// Append a `w:tc` to `tr`; returns its `w:tcPr`
    fn build_cell(&self, tree: &mut XmlTree, tr: NodeId, cell: &CellData, total_twips: f64) -> NodeId {
        let style = &cell.style;
        let tc = append(tree, tr, "w:tc", &[]);

        let tc_pr = append(tree, tc, "w:tcPr", &[]);
        append(
            tree,
            tc_pr,
            "w:tcW",
            &[("w:w", twips(cell.column_ratio * total_twips).as_str()), ("w:type", "dxa")],
        );
        if cell.col_span > 1 {
            append(tree, tc_pr, "w:gridSpan", &[("w:val", cell.col_span.to_string().as_str())]);
        }
        self.set_borders(tree, tc_pr, style);
        append(
            tree,
            tc_pr,
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", style.background_color.trim())],
        );
        let mar = append(tree, tc_pr, "w:tcMar", &[]);
        for edge in ["w:top", "w:left", "w:bottom", "w:right"] {
            append(tree, mar, edge, &[("w:w", "0"), ("w:type", "dxa")]);
        }
        append(tree, tc_pr, "w:vAlign", &[("w:val", vertical_alignment(style.vertical))]);

        let p = append(tree, tc, "w:p", &[]);
        let p_pr = append(tree, p, "w:pPr", &[]);
        append(tree, p_pr, "w:keepNext", &[]);
        append(tree, p_pr, "w:keepLines", &[]);
        append(
            tree,
            p_pr,
            "w:spacing",
            &[("w:before", "0"), ("w:after", "0"), ("w:line", "0"), ("w:lineRule", "atLeast")],
        );
        let (jc, left, right) = horizontal_layout(style.horizontal);
        append(
            tree,
            p_pr,
            "w:ind",
            &[("w:left", left.to_string().as_str()), ("w:right", right.to_string().as_str()), ("w:hanging", "0")],
        );
        append(tree, p_pr, "w:jc", &[("w:val", jc)]);

        let r = append(tree, p, "w:r", &[]);
        self.run_properties(tree, r, style);
        let text = match cell.value.as_deref() {
            Some(v) if !self.options.is_blank(Some(v)) => v,
            _ => "",
        };
        let t = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            append(tree, r, "w:t", &[("xml:space", "preserve")])
        } else {
            append(tree, r, "w:t", &[])
        };
        tree.append_text(t, text);

        tc_pr
    }

    fn run_properties(&self, tree: &mut XmlTree, run: NodeId, style: &CellStyle) {
        let r_pr = append(tree, run, "w:rPr", &[]);
        if let Some(font) = style.font_name.as_deref().filter(|f| !f.is_empty()) {
            append(tree, r_pr, "w:rFonts", &[("w:ascii", font), ("w:hAnsi", font)]);
        }
        if style.bold {
            append(tree, r_pr, "w:b", &[]);
        }
        if style.italic {
            append(tree, r_pr, "w:i", &[]);
        }
        if !style.font_color.is_empty() {
            append(tree, r_pr, "w:color", &[("w:val", style.font_color.as_str())]);
        }
        if let Some(size) = style.font_size.filter(|s| *s > 0.0) {
            // Half-points
            append(tree, r_pr, "w:sz", &[("w:val", ((size * 2.0).round() as u32).to_string().as_str())]);
        }
    }

    /// Replace the four cell borders of a `w:tcPr`
    fn set_borders(&self, tree: &mut XmlTree, tc_pr: NodeId, style: &CellStyle) {
        let borders = tree.ensure_child_before(tc_pr, "w:tcBorders", &AFTER_TC_BORDERS);
        tree.clear_children(borders);
        let edges: [(&str, &BorderInfo); 4] = [
            ("w:top", &style.border_top),
            ("w:left", &style.border_left),
            ("w:bottom", &style.border_bottom),
            ("w:right", &style.border_right),
        ];
        for (name, border) in edges {
            let (pattern, size) = border_pattern(border.kind);
            append(
                tree,
                borders,
                name,
                &[
                    ("w:val", pattern),
                    ("w:color", border.color.as_str()),
                    ("w:sz", size.to_string().as_str()),
                    ("w:space", "0"),
                ],
            );
        }
    }
}
