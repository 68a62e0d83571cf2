//! Workbook reader
//!
//! Reads the parts of a workbook package that extraction needs: defined
//! names, the sheet list, shared strings, the stylesheet and (on demand)
//! individual worksheets. Chart parts stay in the package and are walked by
//! [`crate::chart`].

mod worksheet;

pub use worksheet::{CellValue, RawCell, Worksheet};

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use docfill_core::package::{rel_types, Package};
use docfill_core::{DefinedName, NamedRangeCollection};

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, Stylesheet};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings
///
/// Excel uses this form for characters XML cannot carry directly:
/// - `_x000d_` = CR
/// - `_x000a_` = LF
/// - `_x0009_` = Tab
/// - `_x005f_` = an escaped underscore
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// One entry of the workbook's sheet list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Resolved part name, e.g. `xl/worksheets/sheet1.xml`
    pub part: String,
}

/// A workbook opened for extraction
#[derive(Debug)]
pub struct XlsxWorkbook {
    package: Package,
    sheets: Vec<SheetEntry>,
    names: NamedRangeCollection,
    shared_strings: Vec<String>,
    styles: Stylesheet,
}

impl XlsxWorkbook {
    /// Open a workbook from a file path
    pub fn open_file<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }

    /// Open a workbook from bytes
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Open a workbook from a reader
    pub fn open<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        Self::from_package(Package::from_reader(reader)?)
    }

    /// Read the workbook-level parts of an already loaded package
    pub fn from_package(package: Package) -> XlsxResult<Self> {
        if !package.has_part("[Content_Types].xml") {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let workbook_part = Self::workbook_part(&package)?;
        let workbook_xml = package
            .part(&workbook_part)
            .ok_or_else(|| XlsxError::MissingPart(workbook_part.clone()))?;
        let (sheet_ids, defined) = read_workbook_xml(workbook_xml)?;

        let rels = package.relationships(&workbook_part)?;
        let mut sheets = Vec::with_capacity(sheet_ids.len());
        for (name, r_id) in sheet_ids {
            match rels.iter().find(|r| r.id == r_id && r.rel_type == rel_types::WORKSHEET) {
                Some(rel) => sheets.push(SheetEntry {
                    name,
                    part: docfill_core::package::resolve_target(&workbook_part, &rel.target),
                }),
                None => log::debug!("Sheet '{}' is not a worksheet part, skipping", name),
            }
        }

        let mut names = NamedRangeCollection::new();
        for name in defined {
            names.define(name);
        }

        let shared_strings = match package.part(SHARED_STRINGS_PART) {
            Some(data) => read_shared_strings(data)?,
            None => Vec::new(),
        };

        let styles = match package.part(STYLES_PART) {
            Some(data) => read_styles_xml(data)?,
            None => Stylesheet::default(),
        };

        log::debug!(
            "Opened workbook: {} sheets, {} defined names, {} shared strings",
            sheets.len(),
            names.len(),
            shared_strings.len()
        );

        Ok(Self {
            package,
            sheets,
            names,
            shared_strings,
            styles,
        })
    }

    /// Locate the workbook part through the package relationships,
    /// falling back to the conventional location
    fn workbook_part(package: &Package) -> XlsxResult<String> {
        let mut targets = package.related_parts("", rel_types::OFFICE_DOCUMENT)?;
        if targets.is_empty() {
            return Ok(WORKBOOK_PART.to_string());
        }
        Ok(targets.swap_remove(0))
    }

    /// Defined names, in workbook order
    pub fn names(&self) -> &NamedRangeCollection {
        &self.names
    }

    /// Sheets in workbook order
    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn styles(&self) -> &Stylesheet {
        &self.styles
    }

    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Parse a worksheet by name (case-insensitive)
    pub fn worksheet(&self, name: &str) -> XlsxResult<Worksheet> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;
        let data = self
            .package
            .part(&entry.part)
            .ok_or_else(|| XlsxError::MissingPart(entry.part.clone()))?;
        worksheet::read_worksheet(&entry.name, data, &self.shared_strings)
    }
}

/// Read workbook.xml: sheet names with their relationship ids, and defined names
fn read_workbook_xml(data: &[u8]) -> XlsxResult<(Vec<(String, String)>, Vec<DefinedName>)> {
    let mut xml_reader = Reader::from_reader(data);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    let mut defined = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_text = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        b"r:id" => {
                            r_id = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                        _ => {}
                    }
                }

                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"definedName" => {
                current_text.clear();
                current_name = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"name")
                    .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()));
            }
            Ok(Event::Text(e)) if current_name.is_some() => {
                current_text.push_str(&e.unescape()?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"definedName" => {
                if let Some(name) = current_name.take() {
                    defined.push(DefinedName::new(name, current_text.trim()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, defined))
}

/// Read the shared strings table
///
/// Rich-text runs are concatenated; phonetic runs are skipped.
fn read_shared_strings(data: &[u8]) -> XlsxResult<Vec<String>> {
    let mut xml_reader = Reader::from_reader(data);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current_string = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current_string.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current_string));
                    current_string.clear();
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                current_string.push_str(&e.unescape()?);
            }
            Ok(Event::CData(e)) if in_t => {
                current_string.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("a_x000d_b"), "a\rb");
        assert_eq!(decode_excel_escapes("_x005f_x"), "_x");
        assert_eq!(decode_excel_escapes("plain_xml"), "plain_xml");
        assert_eq!(decode_excel_escapes("tail_x00"), "tail_x00");
    }

    #[test]
    fn test_read_shared_strings_rich_text() {
        let xml = br#"<sst xmlns="urn:s"><si><t>Plain</t></si><si><r><t>Ri</t></r><r><rPr><b/></rPr><t xml:space="preserve">ch </t></r><rPh><t>x</t></rPh></si><si/></sst>"#;
        let strings = read_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["Plain".to_string(), "Rich ".to_string(), String::new()]);
    }

    #[test]
    fn test_read_workbook_xml() {
        let xml = br#"<workbook xmlns:r="urn:r"><sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets><definedNames><definedName name="Revenue">Data!$B$1</definedName><definedName name="Grid">'Data'!$A$1:$C$3</definedName></definedNames></workbook>"#;
        let (sheets, names) = read_workbook_xml(xml).unwrap();
        assert_eq!(sheets, vec![("Data".to_string(), "rId1".to_string())]);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], DefinedName::new("Revenue", "Data!$B$1"));
        assert!(names[1].is_multi_cell());
    }
}
