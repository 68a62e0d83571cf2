//! In-memory workbook and template builders shared by the integration tests

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn zip(parts: Vec<(String, String)>) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn relationship(id: &str, kind: &str, target: &str) -> String {
    format!(r#"<Relationship Id="{id}" Type="{R_NS}/{kind}" Target="{target}"/>"#)
}

/// An inline-string cell
pub fn text_cell(reference: &str, text: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
}

/// A numeric cell with a style index
pub fn number_cell(reference: &str, value: &str, style: u32) -> String {
    format!(r#"<c r="{reference}" s="{style}"><v>{value}</v></c>"#)
}

/// A chart part holding one group of series
///
/// Each series is `(name, categories, values)` in cache order.
pub fn chart_xml(title: &str, group: &str, series: &[(&str, &[&str], &[&str])]) -> String {
    let mut body = String::new();
    for (i, (name, categories, values)) in series.iter().enumerate() {
        let points = |items: &[&str]| -> String {
            items
                .iter()
                .enumerate()
                .map(|(idx, v)| format!(r#"<c:pt idx="{idx}"><c:v>{v}</c:v></c:pt>"#))
                .collect()
        };
        body.push_str(&format!(
            r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/><c:tx><c:strRef><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>{name}</c:v></c:pt></c:strCache></c:strRef></c:tx><c:cat><c:strRef><c:strCache><c:ptCount val="{}"/>{}</c:strCache></c:strRef></c:cat><c:val><c:numRef><c:numCache><c:ptCount val="{}"/>{}</c:numCache></c:numRef></c:val></c:ser>"#,
            categories.len(),
            points(*categories),
            values.len(),
            points(*values)
        ));
    }
    format!(
        r#"{DECL}<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><c:chart><c:title><c:tx><c:rich><a:p><a:r><a:t>{title}</a:t></a:r></a:p></c:rich></c:tx></c:title><c:plotArea><c:layout/><c:{group}>{body}<c:axId val="1"/></c:{group}></c:plotArea></c:chart></c:chartSpace>"#
    )
}

/// Builder for a minimal workbook archive
#[derive(Default)]
pub struct WorkbookFixture {
    sheets: Vec<(String, String)>,
    names: Vec<(String, String)>,
    styles: Option<String>,
    charts: Vec<String>,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet; `content` is the markup inside `<worksheet>`
    pub fn sheet(mut self, name: &str, content: &str) -> Self {
        self.sheets.push((name.to_string(), content.to_string()));
        self
    }

    pub fn name(mut self, name: &str, refers_to: &str) -> Self {
        self.names.push((name.to_string(), refers_to.to_string()));
        self
    }

    /// `cellXfs` entries, as raw `<xf>` markup
    pub fn cell_formats(mut self, xfs: &[&str]) -> Self {
        self.styles = Some(format!(
            r#"{DECL}<styleSheet xmlns="{MAIN_NS}"><cellXfs count="{}">{}</cellXfs></styleSheet>"#,
            xfs.len(),
            xfs.concat()
        ));
        self
    }

    /// Attach a chart to the first sheet through a drawing
    pub fn chart(mut self, xml: String) -> Self {
        self.charts.push(xml);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut overrides = String::from(
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        let mut sheet_list = String::new();
        let mut workbook_rels = String::new();
        let mut parts = Vec::new();

        for (i, (name, content)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            sheet_list.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
            workbook_rels.push_str(&relationship(&format!("rId{n}"), "worksheet", &format!("worksheets/sheet{n}.xml")));
            parts.push((
                format!("xl/worksheets/sheet{n}.xml"),
                format!(r#"{DECL}<worksheet xmlns="{MAIN_NS}" xmlns:r="{R_NS}">{content}</worksheet>"#),
            ));
        }

        if !self.charts.is_empty() {
            parts.push((
                "xl/worksheets/_rels/sheet1.xml.rels".into(),
                format!(
                    r#"{DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
                    relationship("rId1", "drawing", "../drawings/drawing1.xml")
                ),
            ));
            parts.push((
                "xl/drawings/drawing1.xml".into(),
                format!(r#"{DECL}<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing"/>"#),
            ));
            let mut drawing_rels = String::new();
            for (i, chart) in self.charts.iter().enumerate() {
                let n = i + 1;
                drawing_rels.push_str(&relationship(&format!("rId{n}"), "chart", &format!("../charts/chart{n}.xml")));
                parts.push((format!("xl/charts/chart{n}.xml"), chart.clone()));
            }
            parts.push((
                "xl/drawings/_rels/drawing1.xml.rels".into(),
                format!(r#"{DECL}<Relationships xmlns="{REL_NS}">{drawing_rels}</Relationships>"#),
            ));
        }

        let defined: String = self
            .names
            .iter()
            .map(|(name, refers_to)| format!(r#"<definedName name="{name}">{refers_to}</definedName>"#))
            .collect();
        parts.push((
            "xl/workbook.xml".into(),
            format!(
                r#"{DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{R_NS}"><sheets>{sheet_list}</sheets><definedNames>{defined}</definedNames></workbook>"#
            ),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".into(),
            format!(r#"{DECL}<Relationships xmlns="{REL_NS}">{workbook_rels}</Relationships>"#),
        ));
        if let Some(styles) = self.styles {
            parts.push(("xl/styles.xml".into(), styles));
        }
        parts.push((
            "_rels/.rels".into(),
            format!(
                r#"{DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
                relationship("rId1", "officeDocument", "xl/workbook.xml")
            ),
        ));
        parts.push((
            "[Content_Types].xml".into(),
            format!(
                r#"{DECL}<Types xmlns="{CT_NS}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
            ),
        ));
        zip(parts)
    }
}

/// `<w:p>` holding a bookmark pair around `inner`
pub fn bookmark(id: u32, name: &str, inner: &str) -> String {
    format!(
        r#"<w:p><w:bookmarkStart w:id="{id}" w:name="{name}"/>{inner}<w:bookmarkEnd w:id="{id}"/></w:p>"#
    )
}

/// Template archive with a body, an optional header and chart parts
pub fn template(body: &str, header: Option<&str>, charts: &[String]) -> Vec<u8> {
    let mut overrides = String::from(
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    );
    let mut rels = String::new();
    let mut parts = Vec::new();

    if let Some(header) = header {
        overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
        rels.push_str(&relationship("rId1", "header", "header1.xml"));
        parts.push((
            "word/header1.xml".to_string(),
            format!(r#"{DECL}<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{header}</w:hdr>"#),
        ));
    }
    for (i, chart) in charts.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/word/charts/chart{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#
        ));
        rels.push_str(&relationship(&format!("rId{}", n + 10), "chart", &format!("charts/chart{n}.xml")));
        parts.push((format!("word/charts/chart{n}.xml"), chart.clone()));
    }

    parts.push((
        "word/document.xml".into(),
        format!(r#"{DECL}<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body}</w:body></w:document>"#),
    ));
    parts.push((
        "word/_rels/document.xml.rels".into(),
        format!(r#"{DECL}<Relationships xmlns="{REL_NS}">{rels}</Relationships>"#),
    ));
    parts.push((
        "_rels/.rels".into(),
        format!(
            r#"{DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
            relationship("rId1", "officeDocument", "word/document.xml")
        ),
    ));
    parts.push((
        "[Content_Types].xml".into(),
        format!(
            r#"{DECL}<Types xmlns="{CT_NS}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
        ),
    ));
    zip(parts)
}

/// Text of one part of an output archive
pub fn part_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}
