//! In-memory template fixtures for unit tests

use std::io::{Cursor, Write};

use docfill_core::Package;

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// `<w:p>` holding a bookmark pair around `inner`
pub(crate) fn paragraph_with_bookmark(id: &str, name: &str, inner: &str) -> String {
    format!(
        r#"<w:p><w:bookmarkStart w:id="{id}" w:name="{name}"/>{inner}<w:bookmarkEnd w:id="{id}"/></w:p>"#
    )
}

/// A chart part titled `title` with the given plot-area groups
pub(crate) fn chart_xml(title: &str, groups: &str) -> String {
    format!(
        r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><c:chart><c:title><c:tx><c:rich><a:p><a:r><a:t>{title}</a:t></a:r></a:p></c:rich></c:tx></c:title><c:plotArea><c:layout/>{groups}</c:plotArea></c:chart></c:chartSpace>"#
    )
}

/// Build a template archive: body content, an optional header part and
/// any number of chart parts
pub(crate) fn docx(body: &str, header: Option<&str>, charts: &[String]) -> Vec<u8> {
    let mut overrides = String::from(
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    );
    let mut rels = String::new();
    if header.is_some() {
        overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
        rels.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
    }
    for i in 1..=charts.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/word/charts/chart{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="charts/chart{i}.xml"/>"#,
            i + 10
        ));
    }

    let mut parts: Vec<(String, String)> = vec![
        (
            "[Content_Types].xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
            ),
        ),
        (
            "_rels/.rels".into(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.into(),
        ),
        (
            "word/document.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
            ),
        ),
        (
            "word/_rels/document.xml.rels".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
    ];
    if let Some(header) = header {
        parts.push(("word/header1.xml".into(), header.to_string()));
    }
    for (i, chart) in charts.iter().enumerate() {
        parts.push((format!("word/charts/chart{}.xml", i + 1), chart.clone()));
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Text of a part in an output archive
pub(crate) fn reopen_part(bytes: &[u8], name: &str) -> String {
    let package = Package::from_bytes(bytes).unwrap();
    String::from_utf8(package.part(name).unwrap().to_vec()).unwrap()
}

pub(crate) fn reopen_main(bytes: &[u8]) -> String {
    reopen_part(bytes, "word/document.xml")
}

/// Markup between `<w:body>` and `</w:body>`
pub(crate) fn body_of(xml: &str) -> String {
    let start = xml.find("<w:body>").unwrap() + "<w:body>".len();
    let end = xml.rfind("</w:body>").unwrap();
    xml[start..end].to_string()
}
