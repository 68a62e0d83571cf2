//! Stylesheet reading and style-chain resolution
//!
//! `styles.xml` stores fonts, fills, borders and number formats in flat
//! lists; each cell format (`cellXfs/xf`) points into them by index. The raw
//! records here keep every attribute optional so that defaults are applied in
//! exactly one place, [`Stylesheet::resolve`].

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use docfill_core::{BorderInfo, BorderKind, CellStyle, HorizontalAlignment, VerticalAlignment};

use crate::error::{XlsxError, XlsxResult};
use crate::number_format::builtin_format_code;
use crate::options::ExtractOptions;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFill {
    /// `patternFill/fgColor/@rgb`
    pub foreground: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBorderEdge {
    pub style: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBorder {
    pub left: Option<RawBorderEdge>,
    pub right: Option<RawBorderEdge>,
    pub top: Option<RawBorderEdge>,
    pub bottom: Option<RawBorderEdge>,
}

/// One `cellXfs/xf` record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCellFormat {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
}

/// The parsed stylesheet
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub num_fmts: AHashMap<u32, String>,
    pub fonts: Vec<RawFont>,
    pub fills: Vec<RawFill>,
    pub borders: Vec<RawBorder>,
    pub cell_formats: Vec<RawCellFormat>,
}

/// A cell style with every default applied, plus its number format code
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub style: CellStyle,
    pub number_format: String,
}

/// Drop the alpha byte of an 8-digit ARGB color
pub(crate) fn strip_alpha(color: &str) -> String {
    if color.len() == 8 {
        color[2..].to_string()
    } else {
        color.to_string()
    }
}

impl Stylesheet {
    /// Number format code for a format id: custom first, then built-in
    pub fn format_code(&self, num_fmt_id: u32) -> String {
        match self.num_fmts.get(&num_fmt_id) {
            Some(code) => code.clone(),
            None => builtin_format_code(num_fmt_id)
                .unwrap_or("General")
                .to_string(),
        }
    }

    /// Resolve a cell's style index through the format record
    ///
    /// Out-of-range indices resolve as if the record were absent.
    pub fn resolve(&self, style_index: u32, options: &ExtractOptions) -> ResolvedStyle {
        let xf = self.cell_formats.get(style_index as usize);
        let font = xf.and_then(|xf| self.fonts.get(xf.font_id as usize));
        let fill = xf.and_then(|xf| self.fills.get(xf.fill_id as usize));
        let border = xf.and_then(|xf| self.borders.get(xf.border_id as usize));

        let edge = |raw: Option<&RawBorderEdge>| -> BorderInfo {
            let Some(edge) = raw else {
                return options.default_border.clone();
            };
            match edge.style.as_deref().and_then(BorderKind::from_xlsx) {
                None | Some(BorderKind::None) => options.default_border.clone(),
                Some(kind) => BorderInfo::new(
                    strip_alpha(
                        edge.color
                            .as_deref()
                            .unwrap_or(options.unspecified_border_color.as_str()),
                    ),
                    kind,
                ),
            }
        };

        let style = CellStyle {
            font_name: font.and_then(|f| f.name.clone()),
            font_size: font
                .and_then(|f| f.size)
                .map(|size| size * options.font_size_scale),
            font_color: strip_alpha(
                font.and_then(|f| f.color.as_deref())
                    .unwrap_or(options.default_font_color.as_str()),
            ),
            bold: font.is_some_and(|f| f.bold),
            italic: font.is_some_and(|f| f.italic),
            background_color: strip_alpha(
                fill.and_then(|f| f.foreground.as_deref())
                    .unwrap_or(options.default_background.as_str()),
            ),
            horizontal: xf
                .and_then(|xf| xf.horizontal.as_deref())
                .and_then(HorizontalAlignment::from_xlsx)
                .unwrap_or_default(),
            vertical: xf
                .and_then(|xf| xf.vertical.as_deref())
                .and_then(VerticalAlignment::from_xlsx)
                .unwrap_or_default(),
            border_top: edge(border.and_then(|b| b.top.as_ref())),
            border_bottom: edge(border.and_then(|b| b.bottom.as_ref())),
            border_left: edge(border.and_then(|b| b.left.as_ref())),
            border_right: edge(border.and_then(|b| b.right.as_ref())),
        };

        ResolvedStyle {
            style,
            number_format: self.format_code(xf.map(|xf| xf.num_fmt_id).unwrap_or(0)),
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()))
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> u32 {
    attr(e, key).and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// `<b/>`, `<b val="1"/>` and `<b val="true"/>` are on; `val="0"` is off
fn flag_on(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0") | Some("false"))
}

/// Which list the parser is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    /// `cellStyleXfs`, `dxfs` and friends: read past without recording
    Ignored,
}

struct StylesParser {
    sheet: Stylesheet,
    section: Section,
    font: Option<RawFont>,
    fill: Option<RawFill>,
    border: Option<RawBorder>,
    edge: Option<(&'static str, RawBorderEdge)>,
    xf: Option<RawCellFormat>,
}

impl StylesParser {
    fn new() -> Self {
        Self {
            sheet: Stylesheet::default(),
            section: Section::Other,
            font: None,
            fill: None,
            border: None,
            edge: None,
            xf: None,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.local_name();
        match (self.section, name.as_ref()) {
            (_, b"numFmts") => self.section = Section::NumFmts,
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"borders") => self.section = Section::Borders,
            (_, b"cellXfs") => self.section = Section::CellXfs,
            (_, b"cellStyleXfs") | (_, b"dxfs") | (_, b"colors") | (_, b"extLst") => {
                self.section = Section::Ignored
            }

            (Section::NumFmts, b"numFmt") => {
                if let Some(code) = attr(e, b"formatCode") {
                    self.sheet.num_fmts.insert(attr_u32(e, b"numFmtId"), code);
                }
            }

            (Section::Fonts, b"font") => self.font = Some(RawFont::default()),
            (Section::Fonts, b"name") => {
                if let Some(font) = self.font.as_mut() {
                    font.name = attr(e, b"val");
                }
            }
            (Section::Fonts, b"sz") => {
                if let Some(font) = self.font.as_mut() {
                    font.size = attr(e, b"val").and_then(|s| s.parse().ok());
                }
            }
            (Section::Fonts, b"b") => {
                if let Some(font) = self.font.as_mut() {
                    font.bold = flag_on(e);
                }
            }
            (Section::Fonts, b"i") => {
                if let Some(font) = self.font.as_mut() {
                    font.italic = flag_on(e);
                }
            }
            (Section::Fonts, b"color") => {
                if let Some(font) = self.font.as_mut() {
                    font.color = attr(e, b"rgb");
                }
            }

            (Section::Fills, b"fill") => self.fill = Some(RawFill::default()),
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.foreground = attr(e, b"rgb");
                }
            }

            (Section::Borders, b"border") => self.border = Some(RawBorder::default()),
            (Section::Borders, edge @ (b"left" | b"right" | b"top" | b"bottom")) => {
                let side = match edge {
                    b"left" => "left",
                    b"right" => "right",
                    b"top" => "top",
                    _ => "bottom",
                };
                self.edge = Some((
                    side,
                    RawBorderEdge {
                        style: attr(e, b"style"),
                        color: None,
                    },
                ));
            }
            (Section::Borders, b"color") => {
                if let Some((_, edge)) = self.edge.as_mut() {
                    edge.color = attr(e, b"rgb");
                }
            }

            (Section::CellXfs, b"xf") => {
                self.xf = Some(RawCellFormat {
                    num_fmt_id: attr_u32(e, b"numFmtId"),
                    font_id: attr_u32(e, b"fontId"),
                    fill_id: attr_u32(e, b"fillId"),
                    border_id: attr_u32(e, b"borderId"),
                    horizontal: None,
                    vertical: None,
                });
            }
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.horizontal = attr(e, b"horizontal");
                    xf.vertical = attr(e, b"vertical");
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match (self.section, name) {
            (_, b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs")
            | (_, b"cellStyleXfs" | b"dxfs" | b"colors" | b"extLst") => {
                self.section = Section::Other
            }
            (Section::Fonts, b"font") => {
                if let Some(font) = self.font.take() {
                    self.sheet.fonts.push(font);
                }
            }
            (Section::Fills, b"fill") => {
                if let Some(fill) = self.fill.take() {
                    self.sheet.fills.push(fill);
                }
            }
            (Section::Borders, b"left" | b"right" | b"top" | b"bottom") => {
                if let (Some((side, edge)), Some(border)) = (self.edge.take(), self.border.as_mut())
                {
                    let slot = match side {
                        "left" => &mut border.left,
                        "right" => &mut border.right,
                        "top" => &mut border.top,
                        _ => &mut border.bottom,
                    };
                    *slot = Some(edge);
                }
            }
            (Section::Borders, b"border") => {
                if let Some(border) = self.border.take() {
                    self.sheet.borders.push(border);
                }
            }
            (Section::CellXfs, b"xf") => {
                if let Some(xf) = self.xf.take() {
                    self.sheet.cell_formats.push(xf);
                }
            }
            _ => {}
        }
    }
}

/// Parse `styles.xml`
pub fn read_styles_xml(data: &[u8]) -> XlsxResult<Stylesheet> {
    let mut xml_reader = Reader::from_reader(data);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StylesParser::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e),
            Ok(Event::Empty(e)) => {
                parser.open(&e);
                parser.close(e.local_name().as_ref());
            }
            Ok(Event::End(e)) => parser.close(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let sheet = parser.sheet;
    log::debug!(
        "Read stylesheet: {} fonts, {} fills, {} borders, {} cell formats, {} custom number formats",
        sheet.fonts.len(),
        sheet.fills.len(),
        sheet.borders.len(),
        sheet.cell_formats.len(),
        sheet.num_fmts.len()
    );
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLES: &str = r#"<styleSheet>
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><sz val="10"/><color rgb="FF112233"/><name val="Arial"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFDDEEFF"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF000000"/></left><right style="medium"/><top style="none"/><bottom/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="1" borderId="1"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="164" fontId="1" fillId="1" borderId="1" applyAlignment="1"><alignment horizontal="right" vertical="top"/></xf>
    <xf numFmtId="3" fontId="0" fillId="0" borderId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_read_styles_counts() {
        let sheet = read_styles_xml(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 2);
        assert_eq!(sheet.borders.len(), 2);
        assert_eq!(sheet.cell_formats.len(), 3);
        assert_eq!(sheet.num_fmts.get(&164).map(String::as_str), Some("\"$\"#,##0"));
    }

    #[test]
    fn test_resolve_defaults() {
        let sheet = read_styles_xml(STYLES.as_bytes()).unwrap();
        let options = ExtractOptions::default();
        let resolved = sheet.resolve(0, &options);

        assert_eq!(resolved.number_format, "General");
        let style = resolved.style;
        assert_eq!(style.font_name.as_deref(), Some("Calibri"));
        assert!((style.font_size.unwrap() - 8.8).abs() < 1e-9);
        assert_eq!(style.font_color, "FAEBC6");
        assert_eq!(style.background_color, "FFFFFF");
        assert_eq!(style.horizontal, HorizontalAlignment::Center);
        assert_eq!(style.vertical, VerticalAlignment::Center);
        assert_eq!(style.border_top, BorderInfo::new("857874", BorderKind::Thin));
    }

    #[test]
    fn test_resolve_explicit_style() {
        let sheet = read_styles_xml(STYLES.as_bytes()).unwrap();
        let resolved = sheet.resolve(1, &ExtractOptions::default());

        assert_eq!(resolved.number_format, "\"$\"#,##0");
        let style = resolved.style;
        assert!(style.bold);
        assert!(!style.italic);
        assert_eq!(style.font_color, "112233");
        assert_eq!(style.background_color, "DDEEFF");
        assert_eq!(style.horizontal, HorizontalAlignment::Right);
        assert_eq!(style.vertical, VerticalAlignment::Top);
        assert_eq!(style.border_left, BorderInfo::new("000000", BorderKind::Thin));
        assert_eq!(style.border_right, BorderInfo::new("FFFFFF", BorderKind::Medium));
        assert_eq!(style.border_top, BorderInfo::new("857874", BorderKind::Thin));
        assert_eq!(style.border_bottom, BorderInfo::new("857874", BorderKind::Thin));
    }

    #[test]
    fn test_builtin_number_format() {
        let sheet = read_styles_xml(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.resolve(2, &ExtractOptions::default()).number_format, "#,##0");
        assert_eq!(sheet.resolve(99, &ExtractOptions::default()).number_format, "General");
    }
}
