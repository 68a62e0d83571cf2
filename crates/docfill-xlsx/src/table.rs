//! Table extraction from multi-cell named ranges
//!
//! Every stored cell in the range is resolved to a [`CellData`] with its
//! formatted text and fully defaulted style. Merged regions are then folded
//! so that each region is represented by its top-left cell alone, carrying
//! the combined width, height and outer borders.

use std::collections::BTreeMap;

use docfill_core::{CellData, NamedRange, RangeSpan, TableData};

use crate::number_format::apply_number_format;
use crate::options::ExtractOptions;
use crate::reader::Worksheet;
use crate::styles::Stylesheet;

/// Builds [`TableData`] from worksheet ranges
#[derive(Debug, Clone, Copy)]
pub struct TableExtractor<'a> {
    styles: &'a Stylesheet,
    options: &'a ExtractOptions,
}

impl<'a> TableExtractor<'a> {
    pub fn new(styles: &'a Stylesheet, options: &'a ExtractOptions) -> Self {
        Self { styles, options }
    }

    fn column_width(&self, sheet: &Worksheet, col: u32) -> f64 {
        sheet
            .column_width(col)
            .or(sheet.default_col_width)
            .unwrap_or(self.options.default_column_width)
    }

    fn row_height(&self, sheet: &Worksheet, row: u32) -> f64 {
        sheet
            .row_height(row)
            .or(sheet.default_row_height)
            .unwrap_or(self.options.default_row_height)
            * self.options.row_height_scale
    }

    /// Extract the table bound to `range`; the bookmark takes the range's name
    pub fn extract(&self, sheet: &Worksheet, range: &NamedRange) -> TableData {
        let span = range.span;

        let widths: BTreeMap<u32, f64> = (span.start_col..=span.end_col)
            .map(|col| (col, self.column_width(sheet, col)))
            .collect();
        let total_width: f64 = widths.values().sum();
        let ratio_of = |cols: std::ops::RangeInclusive<u32>| -> f64 {
            if total_width > 0.0 {
                cols.filter_map(|c| widths.get(&c)).sum::<f64>() / total_width
            } else {
                0.0
            }
        };

        let mut cells: BTreeMap<(u32, u32), CellData> = BTreeMap::new();
        for row in span.start_row..=span.end_row {
            for col in span.start_col..=span.end_col {
                let Some(raw) = sheet.cell(row, col) else {
                    continue;
                };
                let resolved = self.styles.resolve(raw.style_index, self.options);
                let value = raw
                    .value
                    .as_text()
                    .map(|text| apply_number_format(&text, &resolved.number_format))
                    .filter(|text| !text.is_empty());
                let line_spacing = resolved
                    .style
                    .font_size
                    .map(|size| size * self.options.line_spacing_factor);

                cells.insert(
                    (row, col),
                    CellData {
                        value,
                        row,
                        col,
                        row_span: 1,
                        col_span: 1,
                        style: resolved.style,
                        column_ratio: ratio_of(col..=col),
                        row_height: self.row_height(sheet, row),
                        line_spacing,
                    },
                );
            }
        }

        self.fold_merges(sheet, span, &mut cells, &ratio_of);

        log::debug!(
            "Extracted table '{}' from '{}': {} cells",
            range.name,
            sheet.name,
            cells.len()
        );

        TableData {
            bookmark: range.name.clone(),
            width_cm: total_width * self.options.width_to_cm,
            column_ratios: (span.start_col..=span.end_col).map(|c| ratio_of(c..=c)).collect(),
            cells: cells.into_values().collect(),
        }
    }

    /// Collapse merged regions anchored inside the range onto their
    /// top-left cell
    ///
    /// Regions are clipped to the range so spans never exceed the table grid.
    fn fold_merges(
        &self,
        sheet: &Worksheet,
        span: RangeSpan,
        cells: &mut BTreeMap<(u32, u32), CellData>,
        ratio_of: &dyn Fn(std::ops::RangeInclusive<u32>) -> f64,
    ) {
        let mut absorbed = Vec::new();

        for merge in sheet.merges() {
            let anchor = (merge.start_row, merge.start_col);
            if !cells.contains_key(&anchor) {
                continue;
            }
            let end_row = merge.end_row.min(span.end_row);
            let end_col = merge.end_col.min(span.end_col);
            let row_span = end_row - merge.start_row + 1;
            let col_span = end_col - merge.start_col + 1;
            if row_span == 1 && col_span == 1 {
                continue;
            }

            let right = cells
                .get(&(merge.start_row, end_col))
                .map(|c| c.style.border_right.clone());
            let bottom = cells
                .get(&(end_row, merge.start_col))
                .map(|c| c.style.border_bottom.clone());
            let height: f64 = (merge.start_row..=end_row)
                .map(|r| self.row_height(sheet, r))
                .sum();

            if let Some(cell) = cells.get_mut(&anchor) {
                cell.row_span = row_span;
                cell.col_span = col_span;
                cell.column_ratio = ratio_of(merge.start_col..=end_col);
                cell.row_height = height;
                if let Some(right) = right {
                    cell.style.border_right = right;
                }
                if let Some(bottom) = bottom {
                    cell.style.border_bottom = bottom;
                }
            }

            for row in merge.start_row..=end_row {
                for col in merge.start_col..=end_col {
                    if (row, col) != anchor {
                        absorbed.push((row, col));
                    }
                }
            }
        }

        for key in absorbed {
            cells.remove(&key);
        }
    }
}
