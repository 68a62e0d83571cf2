//! Single-cell values: text or image link

use once_cell::sync::Lazy;
use regex::Regex;

use docfill_core::NamedRange;

use crate::reader::Worksheet;

static IMAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^.*\.(jpg|jpeg|png|gif|bmp|tiff|tif|webp|svg)$")
        .expect("valid image link regex")
});

/// Whether a cell's text names an image file
///
/// # Examples
/// ```
/// use docfill_xlsx::value::is_image_link;
///
/// assert!(is_image_link("https://cdn.example.com/logo.PNG"));
/// assert!(!is_image_link("Annual report"));
/// ```
pub fn is_image_link(text: &str) -> bool {
    IMAGE_LINK.is_match(text)
}

/// What a single-cell named range holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleValue {
    Text(String),
    ImageLink(String),
}

/// Read the top-left cell of a range as raw text
///
/// Missing and empty cells read as the empty string; no number format is
/// applied.
pub fn read_cell_text(sheet: &Worksheet, range: &NamedRange) -> String {
    let start = range.span.start();
    sheet
        .cell(start.row, start.col)
        .and_then(|cell| cell.value.as_text())
        .unwrap_or_default()
}

/// Read and classify a single-cell range
pub fn read_single_value(sheet: &Worksheet, range: &NamedRange) -> SingleValue {
    let text = read_cell_text(sheet, range);
    if is_image_link(&text) {
        SingleValue::ImageLink(text)
    } else {
        SingleValue::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CellValue, RawCell};
    use docfill_core::{CellRef, RangeSpan};

    fn sheet_with(text: &str) -> Worksheet {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell(
            2,
            3,
            RawCell {
                style_index: 0,
                value: CellValue::Text(text.to_string()),
            },
        );
        sheet
    }

    fn range() -> NamedRange {
        NamedRange {
            name: "Logo".into(),
            sheet: "Data".into(),
            span: RangeSpan::single(CellRef::new(2, 3)),
        }
    }

    #[test]
    fn test_image_link_classification() {
        assert!(is_image_link("images/chart.jpeg"));
        assert!(is_image_link("C:\\pics\\a.TIFF"));
        assert!(!is_image_link("png"));
        assert!(!is_image_link("photo.png.txt"));
        assert!(!is_image_link(""));
    }

    #[test]
    fn test_read_single_value() {
        let sheet = sheet_with("https://x.test/a.svg");
        assert_eq!(
            read_single_value(&sheet, &range()),
            SingleValue::ImageLink("https://x.test/a.svg".into())
        );
        let sheet = sheet_with("Hello");
        assert_eq!(read_single_value(&sheet, &range()), SingleValue::Text("Hello".into()));
        assert_eq!(read_cell_text(&Worksheet::new("Data"), &range()), "");
    }
}
