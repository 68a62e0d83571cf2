//! Worksheet geometry and cell values

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use docfill_core::{CellRef, RangeSpan};

use super::decode_excel_escapes;
use crate::error::{XlsxError, XlsxResult};

/// A cell's stored value, before number formatting
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// The cell exists (usually for its style) but holds nothing
    #[default]
    Empty,
    /// Numeric cell, kept as the stored text so no precision is lost
    Number(String),
    Text(String),
    Bool(bool),
    /// Error literal such as `#N/A`
    Error(String),
}

impl CellValue {
    /// The value as display text; `None` for empty cells
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(s) | CellValue::Text(s) | CellValue::Error(s) => Some(s.clone()),
            CellValue::Bool(true) => Some("TRUE".to_string()),
            CellValue::Bool(false) => Some("FALSE".to_string()),
        }
    }
}

/// One `<c>` element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCell {
    /// Index into the stylesheet's cell formats
    pub style_index: u32,
    pub value: CellValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnSpan {
    min: u32,
    max: u32,
    width: Option<f64>,
}

/// The parts of a worksheet that table extraction consults
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub name: String,
    cells: AHashMap<(u32, u32), RawCell>,
    columns: Vec<ColumnSpan>,
    row_heights: AHashMap<u32, f64>,
    /// `sheetFormatPr/@defaultColWidth`
    pub default_col_width: Option<f64>,
    /// `sheetFormatPr/@defaultRowHeight`
    pub default_row_height: Option<f64>,
    merges: Vec<RangeSpan>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Cell at a 1-based coordinate, if the sheet stores one
    pub fn cell(&self, row: u32, col: u32) -> Option<&RawCell> {
        self.cells.get(&(row, col))
    }

    pub fn set_cell(&mut self, row: u32, col: u32, cell: RawCell) {
        self.cells.insert((row, col), cell);
    }

    /// Width from the first `<col>` span covering `col`, if it sets one
    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.min <= col && col <= c.max)
            .and_then(|c| c.width)
    }

    pub fn set_column_width(&mut self, min: u32, max: u32, width: f64) {
        self.columns.push(ColumnSpan {
            min,
            max,
            width: Some(width),
        });
    }

    /// Explicit height of a row
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    /// Merged regions in sheet order
    pub fn merges(&self) -> &[RangeSpan] {
        &self.merges
    }

    pub fn add_merge(&mut self, span: RangeSpan) {
        self.merges.push(span);
    }
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

fn attr_f64(e: &BytesStart<'_>, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()))
}

/// Cell being assembled while its children stream past
#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u32,
    style_index: u32,
    cell_type: Option<String>,
    value: Option<String>,
    inline: String,
}

impl PendingCell {
    fn finish(self, shared_strings: &[String]) -> RawCell {
        let value = match self.cell_type.as_deref() {
            Some("s") => self
                .value
                .and_then(|v| v.trim().parse::<usize>().ok())
                .and_then(|idx| shared_strings.get(idx).cloned())
                .map(CellValue::Text)
                .unwrap_or_default(),
            Some("inlineStr") => CellValue::Text(decode_excel_escapes(&self.inline)),
            Some("b") => match self.value.as_deref().map(str::trim) {
                Some("0") | Some("false") => CellValue::Bool(false),
                Some(_) => CellValue::Bool(true),
                None => CellValue::Empty,
            },
            Some("e") => self.value.map(CellValue::Error).unwrap_or_default(),
            Some("str") | Some("d") => self
                .value
                .map(|v| CellValue::Text(decode_excel_escapes(&v)))
                .unwrap_or_default(),
            _ => self.value.map(CellValue::Number).unwrap_or_default(),
        };
        RawCell {
            style_index: self.style_index,
            value,
        }
    }
}

/// Read a worksheet part
pub(crate) fn read_worksheet(
    name: &str,
    data: &[u8],
    shared_strings: &[String],
) -> XlsxResult<Worksheet> {
    let mut xml_reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut sheet = Worksheet::new(name);

    let mut current_row: u32 = 0;
    let mut last_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        let event = xml_reader.read_event_into(&mut buf);
        let (e, is_empty) = match event {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(cell) = pending.take() {
                            let (row, col) = (cell.row, cell.col);
                            sheet.set_cell(row, col, cell.finish(shared_strings));
                        }
                    }
                    b"v" => in_value = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                }
                buf.clear();
                continue;
            }
            Ok(Event::Text(e)) => {
                if let Some(cell) = pending.as_mut() {
                    if in_value {
                        cell.value
                            .get_or_insert_with(String::new)
                            .push_str(&e.unescape()?);
                    } else if in_inline_text {
                        cell.inline.push_str(&e.unescape()?);
                    }
                }
                buf.clear();
                continue;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {
                buf.clear();
                continue;
            }
        };

        match e.local_name().as_ref() {
            b"sheetFormatPr" => {
                sheet.default_col_width = attr_f64(&e, b"defaultColWidth");
                sheet.default_row_height = attr_f64(&e, b"defaultRowHeight");
            }
            b"col" => {
                let min = attr_u32(&e, b"min").unwrap_or(0);
                let max = attr_u32(&e, b"max").unwrap_or(min);
                sheet.columns.push(ColumnSpan {
                    min,
                    max,
                    width: attr_f64(&e, b"width"),
                });
            }
            b"row" => {
                current_row = attr_u32(&e, b"r").unwrap_or(current_row.saturating_add(1));
                last_col = 0;
                if let Some(ht) = attr_f64(&e, b"ht") {
                    sheet.set_row_height(current_row, ht);
                }
            }
            b"c" => {
                let (row, col) = match attr_string(&e, b"r").map(|r| CellRef::parse(&r)) {
                    Some(Ok(cell)) => (cell.row, cell.col),
                    Some(Err(err)) => {
                        log::warn!("Skipping cell with bad reference in '{}': {}", name, err);
                        buf.clear();
                        continue;
                    }
                    None => (current_row, last_col.saturating_add(1)),
                };
                last_col = col;
                let cell = PendingCell {
                    row,
                    col,
                    style_index: attr_u32(&e, b"s").unwrap_or(0),
                    cell_type: attr_string(&e, b"t"),
                    ..PendingCell::default()
                };
                if is_empty {
                    sheet.set_cell(row, col, cell.finish(shared_strings));
                } else {
                    pending = Some(cell);
                }
            }
            b"v" if !is_empty => in_value = true,
            b"t" if !is_empty && pending.is_some() => in_inline_text = true,
            b"mergeCell" => {
                if let Some(reference) = attr_string(&e, b"ref") {
                    match RangeSpan::parse(&reference) {
                        Ok(span) => sheet.add_merge(span),
                        Err(err) => log::warn!(
                            "Ignoring merge region '{}' in '{}': {}",
                            reference,
                            name,
                            err
                        ),
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "Read worksheet '{}': {} cells, {} merges",
        name,
        sheet.cells.len(),
        sheet.merges.len()
    );
    Ok(sheet)
}
