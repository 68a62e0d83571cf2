//! Post-render fixups
//!
//! After all content is written the template's bookmarks are no longer
//! useful, and any fields (tables of contents, cross references) have to be
//! refreshed by the word processor on open.

use docfill_core::package::rel_types;
use docfill_core::xml::{Element, NodeKind, XmlTree};

use crate::bookmark::all_regions;
use crate::document::TemplateDocument;
use crate::error::DocxResult;

const SETTINGS_PART: &str = "word/settings.xml";
const SETTINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// `w:settings` children that follow `w:updateFields`
const AFTER_UPDATE_FIELDS: [&str; 21] = [
    "w:hdrShapeDefaults",
    "w:footnotePr",
    "w:endnotePr",
    "w:compat",
    "w:docVars",
    "w:rsids",
    "m:mathPr",
    "w:attachedSchema",
    "w:themeFontLang",
    "w:clrSchemeMapping",
    "w:doNotIncludeSubdocsInStats",
    "w:doNotAutoCompressPictures",
    "w:forceUpgrade",
    "w:captions",
    "w:readModeInkLockDown",
    "w:smartTagType",
    "sl:schemaLibrary",
    "w:shapeDefaults",
    "w:doNotEmbedSmartTags",
    "w:decimalSymbol",
    "w:listSeparator",
];

/// Ask the word processor to refresh fields when the document is opened
///
/// Creates the settings part when the template has none.
pub fn request_field_update(doc: &mut TemplateDocument) -> DocxResult<()> {
    let main = doc.main_part().to_string();
    let existing = doc
        .package()
        .related_parts(&main, rel_types::SETTINGS)?
        .into_iter()
        .find(|name| doc.package().has_part(name));

    let (name, mut tree) = match existing {
        Some(name) => {
            let tree = doc.package().read_xml(&name)?;
            (name, tree)
        }
        None => {
            let package = doc.package_mut();
            package.add_relationship(&main, rel_types::SETTINGS, "settings.xml", false)?;
            package.add_content_type_override(SETTINGS_PART, SETTINGS_CONTENT_TYPE)?;
            log::debug!("Template has no settings part, creating '{}'", SETTINGS_PART);
            (SETTINGS_PART.to_string(), empty_settings())
        }
    };

    let Some(settings) = tree.root_element() else {
        return Ok(());
    };
    let update = tree.ensure_child_before(settings, "w:updateFields", &AFTER_UPDATE_FIELDS);
    tree.set_attr(update, "w:val", "true");
    doc.package_mut().write_xml(&name, &tree)?;
    Ok(())
}

fn empty_settings() -> XmlTree {
    let mut tree = XmlTree::new();
    let doc = tree.document();
    let decl = tree.create(NodeKind::Declaration(
        r#"xml version="1.0" encoding="UTF-8" standalone="yes""#.to_string(),
    ));
    tree.append_child(doc, decl);
    tree.append_element(doc, Element::new("w:settings").with_attr("xmlns:w", W_NS));
    tree
}

/// Remove every paired bookmark marker from every story part
///
/// Returns the number of bookmarks removed.
pub fn strip_bookmarks(doc: &mut TemplateDocument) -> usize {
    let mut removed = 0;
    for part in doc.parts_mut() {
        let regions = all_regions(part.tree());
        if regions.is_empty() {
            continue;
        }
        let tree = part.tree_mut();
        for region in &regions {
            tree.detach(region.start);
            tree.detach(region.end);
        }
        removed += regions.len();
    }
    log::debug!("Removed {} bookmark(s)", removed);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_of, docx, paragraph_with_bookmark, reopen_main, reopen_part};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_settings_created_when_missing() {
        let mut doc = TemplateDocument::from_bytes(&docx("<w:p/>", None, &[])).unwrap();
        request_field_update(&mut doc).unwrap();
        let bytes = doc.to_bytes().unwrap();

        let settings = reopen_part(&bytes, "word/settings.xml");
        assert!(settings.contains(r#"<w:updateFields w:val="true"/>"#));
        let rels = reopen_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Target="settings.xml""#));
        let types = reopen_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"PartName="/word/settings.xml""#));
    }

    #[test]
    fn test_update_fields_placed_before_compat() {
        let mut doc = TemplateDocument::from_bytes(&docx("<w:p/>", None, &[])).unwrap();
        let main = doc.main_part().to_string();
        let package = doc.package_mut();
        package.add_relationship(&main, rel_types::SETTINGS, "settings.xml", false).unwrap();
        package.set_part(
            SETTINGS_PART,
            format!(r#"<w:settings xmlns:w="{W_NS}"><w:zoom w:percent="100"/><w:compat/></w:settings>"#).into_bytes(),
        );

        request_field_update(&mut doc).unwrap();
        // Applying twice leaves a single flag
        request_field_update(&mut doc).unwrap();
        let settings = reopen_part(&doc.to_bytes().unwrap(), SETTINGS_PART);
        assert!(settings.contains(r#"<w:zoom w:percent="100"/><w:updateFields w:val="true"/><w:compat/>"#), "{settings}");
        assert_eq!(settings.matches("w:updateFields").count(), 1);
    }

    #[test]
    fn test_strip_bookmarks_keeps_content() {
        let body = paragraph_with_bookmark("1", "Name", "<w:r><w:t>Kept</w:t></w:r>");
        let header = format!(
            r#"<w:hdr xmlns:w="{}">{}</w:hdr>"#,
            crate::test_support::W_NS,
            paragraph_with_bookmark("2", "Page", "")
        );
        let mut doc = TemplateDocument::from_bytes(&docx(&body, Some(&header), &[])).unwrap();

        assert_eq!(strip_bookmarks(&mut doc), 2);
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(body_of(&reopen_main(&bytes)), "<w:p><w:r><w:t>Kept</w:t></w:r></w:p>");
        assert!(!reopen_part(&bytes, "word/header1.xml").contains("bookmark"));
        assert!(doc.bookmark_names().is_empty());
    }
}
