//! In-memory OPC package
//!
//! Both workbooks and documents are zip containers of XML parts tied
//! together by relationship parts. A [`Package`] holds every entry in
//! archive order so an untouched part is written back exactly as read.

use std::io::{Cursor, Read, Seek, Write};

use crate::error::{Error, Result};
use crate::xml::{self, Element, XmlTree};

/// Relationship type URIs used across the workspace
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    pub const FOOTNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const ENDNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
    pub const COMMENTS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
}

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES: &str = "[Content_Types].xml";

/// One entry of a relationship part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `true` for `TargetMode="External"`
    pub external: bool,
}

/// Most bytes reserved up front for one entry; the size in the zip header
/// is not trusted beyond this
const PREALLOC_LIMIT: u64 = 1 << 20;

/// A zip container held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read every entry of a zip archive
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size().min(PREALLOC_LIMIT) as usize);
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        log::debug!("Read package with {} parts", entries.len());
        Ok(Self { entries })
    }

    /// Read a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Part names in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Raw bytes of a part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.trim_start_matches('/');
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Replace a part, or append it if new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        let name = name.trim_start_matches('/');
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Parse a part into a markup tree
    pub fn read_xml(&self, name: &str) -> Result<XmlTree> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        xml::parse(name, data)
    }

    /// Serialize a markup tree into a part
    pub fn write_xml(&mut self, name: &str, tree: &XmlTree) -> Result<()> {
        let data = xml::to_bytes(tree)?;
        self.set_part(name, data);
        Ok(())
    }

    /// Relationships declared by a part; empty when it has no rels part
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>> {
        let rels_name = rels_path_for(source);
        if !self.has_part(&rels_name) {
            return Ok(Vec::new());
        }
        let tree = self.read_xml(&rels_name)?;
        let Some(root) = tree.root_element() else {
            return Ok(Vec::new());
        };

        let rels = tree
            .children_named(root, "Relationship")
            .filter_map(|node| {
                Some(Relationship {
                    id: tree.attr(node, "Id")?.to_string(),
                    rel_type: tree.attr(node, "Type")?.to_string(),
                    target: tree.attr(node, "Target")?.to_string(),
                    external: tree.attr(node, "TargetMode") == Some("External"),
                })
            })
            .collect();
        Ok(rels)
    }

    /// Internal targets of `source` with the given relationship type,
    /// resolved to part names
    pub fn related_parts(&self, source: &str, rel_type: &str) -> Result<Vec<String>> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .filter(|r| !r.external && r.rel_type == rel_type)
            .map(|r| resolve_target(source, &r.target))
            .collect())
    }

    /// Add a relationship to `source` and return its new id
    ///
    /// Ids are `rId<n>` with `n` one past the largest numeric id present.
    pub fn add_relationship(
        &mut self,
        source: &str,
        rel_type: &str,
        target: &str,
        external: bool,
    ) -> Result<String> {
        let rels_name = rels_path_for(source);
        let mut tree = if self.has_part(&rels_name) {
            self.read_xml(&rels_name)?
        } else {
            empty_relationships()
        };
        let root = match tree.root_element() {
            Some(root) => root,
            None => return Err(Error::markup(rels_name, "no root element")),
        };

        let next = tree
            .children_named(root, "Relationship")
            .filter_map(|node| tree.attr(node, "Id"))
            .filter_map(|id| id.strip_prefix("rId")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let id = format!("rId{next}");

        let mut element = Element::new("Relationship")
            .with_attr("Id", id.as_str())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        if external {
            element = element.with_attr("TargetMode", "External");
        }
        tree.append_element(root, element);
        self.write_xml(&rels_name, &tree)?;
        Ok(id)
    }

    /// Declare a content type for a part in `[Content_Types].xml`
    pub fn add_content_type_override(&mut self, part: &str, content_type: &str) -> Result<()> {
        let mut tree = self.read_xml(CONTENT_TYPES)?;
        let root = match tree.root_element() {
            Some(root) => root,
            None => return Err(Error::markup(CONTENT_TYPES, "no root element")),
        };
        let part_name = format!("/{}", part.trim_start_matches('/'));
        let exists = tree
            .children_named(root, "Override")
            .any(|node| tree.attr(node, "PartName") == Some(part_name.as_str()));
        if !exists {
            tree.append_element(
                root,
                Element::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            );
            self.write_xml(CONTENT_TYPES, &tree)?;
        }
        Ok(())
    }

    /// Write the package as a zip archive
    ///
    /// Entry timestamps are fixed, so equal packages yield equal bytes.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?)
    }

    /// Write the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

fn empty_relationships() -> XmlTree {
    let mut tree = XmlTree::new();
    let doc = tree.document();
    let decl = tree.create(xml::NodeKind::Declaration(
        r#"xml version="1.0" encoding="UTF-8" standalone="yes""#.to_string(),
    ));
    tree.append_child(doc, decl);
    tree.append_element(doc, Element::new("Relationships").with_attr("xmlns", RELS_NS));
    tree
}

/// Name of the relationship part belonging to `source`
///
/// The package itself (empty source) owns `_rels/.rels`.
pub fn rels_path_for(source: &str) -> String {
    let source = source.trim_start_matches('/');
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{source}.rels"),
    }
}

/// Resolve a relationship target against its source part
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let source = source.trim_start_matches('/');
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Package {
        let mut pkg = Package::default();
        pkg.set_part(
            CONTENT_TYPES,
            br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_vec(),
        );
        pkg.set_part(
            "word/_rels/document.xml.rels",
            format!(
                r#"<Relationships xmlns="{RELS_NS}"><Relationship Id="rId3" Type="{}" Target="charts/chart1.xml"/></Relationships>"#,
                rel_types::CHART
            )
            .into_bytes(),
        );
        pkg.set_part("word/document.xml", b"<w:document/>".to_vec());
        pkg
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("xl/worksheets/sheet1.xml"), "xl/worksheets/_rels/sheet1.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "charts/chart1.xml"), "word/charts/chart1.xml");
        assert_eq!(resolve_target("xl/drawings/drawing1.xml", "../charts/chart1.xml"), "xl/charts/chart1.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("xl/workbook.xml", "/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn test_related_parts() {
        let pkg = sample();
        let charts = pkg.related_parts("word/document.xml", rel_types::CHART).unwrap();
        assert_eq!(charts, vec!["word/charts/chart1.xml".to_string()]);
        assert!(pkg.relationships("word/header1.xml").unwrap().is_empty());
    }

    #[test]
    fn test_add_relationship_allocates_next_id() {
        let mut pkg = sample();
        let id = pkg
            .add_relationship("word/document.xml", rel_types::IMAGE, "http://x/a.png", true)
            .unwrap();
        assert_eq!(id, "rId4");
        let rels = pkg.relationships("word/document.xml").unwrap();
        assert_eq!(rels.len(), 2);
        assert!(rels[1].external);

        let id = pkg
            .add_relationship("word/header1.xml", rel_types::IMAGE, "a.png", true)
            .unwrap();
        assert_eq!(id, "rId1");
        assert!(pkg.has_part("word/_rels/header1.xml.rels"));
    }

    #[test]
    fn test_add_relationship_past_u32_ids() {
        let mut pkg = Package::default();
        pkg.set_part(
            "word/_rels/document.xml.rels",
            format!(r#"<Relationships xmlns="{RELS_NS}"><Relationship Id="rId4294967295" Type="x" Target="a.xml"/></Relationships>"#)
                .into_bytes(),
        );
        let id = pkg
            .add_relationship("word/document.xml", rel_types::IMAGE, "b.png", true)
            .unwrap();
        assert_eq!(id, "rId4294967296");
    }

    #[test]
    fn test_content_type_override_is_added_once() {
        let mut pkg = sample();
        pkg.add_content_type_override("word/settings.xml", "application/x-test").unwrap();
        pkg.add_content_type_override("/word/settings.xml", "application/x-test").unwrap();
        let types = String::from_utf8(pkg.part(CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert_eq!(types.matches("PartName=\"/word/settings.xml\"").count(), 1);
    }

    #[test]
    fn test_zip_round_trip_is_deterministic() {
        let pkg = sample();
        let first = pkg.to_bytes().unwrap();
        let second = Package::from_bytes(&first).unwrap().to_bytes().unwrap();
        assert_eq!(first, second);
        let names: Vec<&str> = pkg.part_names().collect();
        assert_eq!(names[0], CONTENT_TYPES);
    }
    /// Overwrite every declared uncompressed size, local and central
    fn declare_size(bytes: &mut [u8], size: u32) {
        const LOCAL: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
        const CENTRAL: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
        let mut i = 0;
        while i + 4 <= bytes.len() {
            let window = &bytes[i..i + 4];
            let offset = if window == LOCAL {
                Some(22)
            } else if window == CENTRAL {
                Some(24)
            } else {
                None
            };
            if let Some(offset) = offset {
                bytes[i + offset..i + offset + 4].copy_from_slice(&size.to_le_bytes());
            }
            i += 1;
        }
    }

    #[test]
    fn test_declared_entry_size_is_not_trusted() {
        let mut bytes = sample().to_bytes().unwrap();
        declare_size(&mut bytes, 0xFFFF_FFFE);

        // The archive may be rejected, but must not be preallocated from
        if let Ok(pkg) = Package::from_bytes(&bytes) {
            assert_eq!(pkg.part("word/document.xml"), Some(&b"<w:document/>"[..]));
        }
    }
}
