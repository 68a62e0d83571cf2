//! Image links at a bookmark
//!
//! Images are never embedded: each one is an external relationship from the
//! part holding the bookmark, drawn inline just before the end marker.

use docfill_core::package::rel_types;
use docfill_core::xml::{Element, NodeId, XmlTree};
use docfill_core::ImageData;

use crate::bookmark::{ensure_paragraph, BookmarkRegion, RewriteOutcome};
use crate::document::{paragraph_of, TemplateDocument};
use crate::error::DocxResult;
use crate::markup::{append, ensure_namespace, max_numeric_attr, A_NS, PIC_NS, R_NS, WP_NS};
use crate::options::RenderOptions;

/// `pPr` children that follow `jc`
const AFTER_JC: [&str; 9] = [
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Writes [`ImageData`] into the template
#[derive(Debug, Clone, Copy)]
pub struct ImageRenderer<'a> {
    options: &'a RenderOptions,
}

impl<'a> ImageRenderer<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Place the image at every occurrence of its bookmark
    pub fn render(&self, doc: &mut TemplateDocument, image: &ImageData) -> DocxResult<RewriteOutcome> {
        // Drawing ids are unique across the whole document, not per part
        let mut last_id = doc
            .parts()
            .iter()
            .map(|part| max_numeric_attr(part.tree(), "wp:docPr", "id"))
            .max()
            .unwrap_or(0);
        doc.for_each_region(&image.bookmark, |package, part, region| {
            let r_id = package.add_relationship(&part.name, rel_types::IMAGE, &image.link, true)?;
            last_id = last_id.saturating_add(1);
            self.place(part.tree_mut(), region, &r_id, last_id);
            log::debug!(
                "Linked image '{}' at bookmark '{}' in '{}'",
                image.link,
                image.bookmark,
                part.name
            );
            Ok(())
        })
    }

    fn place(&self, tree: &mut XmlTree, region: BookmarkRegion, r_id: &str, id: u32) {
        let paragraph = ensure_paragraph(tree, region.start);

        // An existing picture donates its size and is replaced
        let (cx, cy, justification) = match existing_drawing_run(tree, paragraph, region) {
            Some((run, cx, cy)) => {
                tree.detach(run);
                (cx, cy, "left")
            }
            None => (
                self.options.default_image_width_emu,
                self.options.default_image_height_emu,
                "center",
            ),
        };

        ensure_namespace(tree, "wp", WP_NS);
        ensure_namespace(tree, "r", R_NS);
        let run = build_drawing_run(tree, r_id, id, cx, cy);

        let target = match paragraph_of(tree, region.end) {
            Some(p) => {
                tree.insert_before(region.end, run);
                p
            }
            None => {
                let p = tree.create_element(Element::new("w:p"));
                tree.append_child(p, run);
                tree.insert_before(region.end, p);
                p
            }
        };

        let p_pr = tree.ensure_first_child(target, "w:pPr");
        let style = tree.ensure_first_child(p_pr, "w:pStyle");
        tree.set_attr(style, "w:val", "Normal");
        let jc = tree.ensure_child_before(p_pr, "w:jc", &AFTER_JC);
        tree.set_attr(jc, "w:val", justification);
    }
}

/// The first run holding a drawing near the bookmark, with its extent
fn existing_drawing_run(tree: &XmlTree, paragraph: NodeId, region: BookmarkRegion) -> Option<(NodeId, i64, i64)> {
    let mut candidates = tree.descendants_named(paragraph, "w:r");
    for node in region.content(tree) {
        if tree.is(node, "w:r") {
            candidates.push(node);
        }
        candidates.extend(tree.descendants_named(node, "w:r"));
    }

    candidates.into_iter().find_map(|run| {
        let drawing = tree.first_child_named(run, "w:drawing")?;
        let extent = tree
            .descendants_named(drawing, "wp:extent")
            .into_iter()
            .next()?;
        let cx = tree.attr(extent, "cx")?.parse().ok()?;
        let cy = tree.attr(extent, "cy")?.parse().ok()?;
        Some((run, cx, cy))
    })
}

/// `w:r` holding an inline picture linked through `r_id`
fn build_drawing_run(tree: &mut XmlTree, r_id: &str, id: u32, cx: i64, cy: i64) -> NodeId {
    let id = id.to_string();
    let name = format!("Picture {id}");
    let (cx, cy) = (cx.to_string(), cy.to_string());

    let run = tree.create_element(Element::new("w:r"));
    let r_pr = append(tree, run, "w:rPr", &[]);
    append(tree, r_pr, "w:noProof", &[]);

    let drawing = append(tree, run, "w:drawing", &[]);
    let inline = append(
        tree,
        drawing,
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    );
    append(tree, inline, "wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())]);
    append(tree, inline, "wp:effectExtent", &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")]);
    append(tree, inline, "wp:docPr", &[("id", id.as_str()), ("name", name.as_str())]);
    let frame = append(tree, inline, "wp:cNvGraphicFramePr", &[]);
    append(tree, frame, "a:graphicFrameLocks", &[("xmlns:a", A_NS), ("noChangeAspect", "1")]);

    let graphic = append(tree, inline, "a:graphic", &[("xmlns:a", A_NS)]);
    let data = append(tree, graphic, "a:graphicData", &[("uri", PIC_NS)]);
    let pic = append(tree, data, "pic:pic", &[("xmlns:pic", PIC_NS)]);

    let nv = append(tree, pic, "pic:nvPicPr", &[]);
    append(tree, nv, "pic:cNvPr", &[("id", id.as_str()), ("name", name.as_str())]);
    append(tree, nv, "pic:cNvPicPr", &[]);

    let fill = append(tree, pic, "pic:blipFill", &[]);
    append(tree, fill, "a:blip", &[("r:link", r_id), ("cstate", "print")]);
    let stretch = append(tree, fill, "a:stretch", &[]);
    append(tree, stretch, "a:fillRect", &[]);

    let sp_pr = append(tree, pic, "pic:spPr", &[]);
    let xfrm = append(tree, sp_pr, "a:xfrm", &[]);
    append(tree, xfrm, "a:off", &[("x", "0"), ("y", "0")]);
    append(tree, xfrm, "a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())]);
    let geom = append(tree, sp_pr, "a:prstGeom", &[("prst", "rect")]);
    append(tree, geom, "a:avLst", &[]);

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_of, docx, paragraph_with_bookmark, reopen_main, reopen_part};
    use pretty_assertions::assert_eq;

    fn render(body: &str) -> (RewriteOutcome, Vec<u8>) {
        let mut doc = TemplateDocument::from_bytes(&docx(body, None, &[])).unwrap();
        let options = RenderOptions::default();
        let image = ImageData {
            bookmark: "Logo".into(),
            link: "https://cdn.example.com/logo.png".into(),
        };
        let outcome = ImageRenderer::new(&options).render(&mut doc, &image).unwrap();
        (outcome, doc.to_bytes().unwrap())
    }

    #[test]
    fn test_default_extent_centered() {
        let (outcome, bytes) = render(&paragraph_with_bookmark("9", "Logo", ""));
        assert_eq!(outcome, RewriteOutcome::Rewritten(1));

        let main = reopen_main(&bytes);
        assert!(main.contains(r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#));
        let body = body_of(&main);
        assert!(body.starts_with(r#"<w:p><w:pPr><w:pStyle w:val="Normal"/><w:jc w:val="center"/></w:pPr><w:bookmarkStart w:id="9" w:name="Logo"/><w:r><w:rPr><w:noProof/></w:rPr><w:drawing>"#), "{body}");
        assert!(body.contains(r#"<wp:extent cx="3000000" cy="2000000"/>"#));
        assert!(body.contains(r#"<wp:docPr id="1" name="Picture 1"/>"#));
        assert!(body.contains(r#"<a:blip r:link="rId1" cstate="print"/>"#));
        assert!(body.ends_with(r#"</w:r><w:bookmarkEnd w:id="9"/></w:p>"#));

        let rels = reopen_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Target="https://cdn.example.com/logo.png""#));
        assert!(rels.contains(r#"TargetMode="External""#));
    }

    #[test]
    fn test_existing_image_size_reused() {
        let old = r#"<w:r><w:drawing><wp:inline><wp:extent cx="111" cy="222"/><wp:docPr id="4" name="Old"/></wp:inline></w:drawing></w:r>"#;
        let (_, bytes) = render(&paragraph_with_bookmark("9", "Logo", old));
        let body = body_of(&reopen_main(&bytes));

        assert!(!body.contains(r#"name="Old""#));
        assert!(body.contains(r#"<wp:extent cx="111" cy="222"/>"#));
        assert!(body.contains(r#"<w:jc w:val="left"/>"#));
        // Ids are allocated past the highest one in the document
        assert!(body.contains(r#"<wp:docPr id="5" name="Picture 5"/>"#));
    }

    #[test]
    fn test_missing_bookmark() {
        let (outcome, _) = render(&paragraph_with_bookmark("9", "Other", ""));
        assert_eq!(outcome, RewriteOutcome::NotFound);
    }
    fn doc_pr_ids(xml: &str) -> Vec<u32> {
        xml.split(r#"<wp:docPr id=""#)
            .skip(1)
            .filter_map(|rest| rest.split('"').next()?.parse().ok())
            .collect()
    }

    #[test]
    fn test_ids_unique_across_parts() {
        let existing = r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="1" cy="1"/><wp:docPr id="7" name="Chart 7"/></wp:inline></w:drawing></w:r></w:p>"#;
        let body = format!("{}{}", paragraph_with_bookmark("1", "Logo", ""), existing);
        let header = format!(
            r#"<w:hdr xmlns:w="{}">{}</w:hdr>"#,
            crate::test_support::W_NS,
            paragraph_with_bookmark("2", "Logo", "")
        );
        let mut doc = TemplateDocument::from_bytes(&docx(&body, Some(&header), &[])).unwrap();
        let options = RenderOptions::default();
        let image = ImageData {
            bookmark: "Logo".into(),
            link: "https://cdn.example.com/logo.png".into(),
        };
        let outcome = ImageRenderer::new(&options).render(&mut doc, &image).unwrap();
        assert_eq!(outcome, RewriteOutcome::Rewritten(2));

        let bytes = doc.to_bytes().unwrap();
        let mut ids = doc_pr_ids(&reopen_main(&bytes));
        ids.extend(doc_pr_ids(&reopen_part(&bytes, "word/header1.xml")));
        ids.sort_unstable();
        assert_eq!(ids, vec![7, 8, 9]);
    }
}
