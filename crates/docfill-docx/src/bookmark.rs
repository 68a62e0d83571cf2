//! Bookmark regions and text replacement
//!
//! A bookmark is a `w:bookmarkStart` / `w:bookmarkEnd` pair sharing a
//! `w:id` within one part. Everything strictly between the two markers is
//! the bookmark's content; the markers themselves survive every rewrite and
//! are only stripped during cleanup.

use docfill_core::xml::{Element, NodeId, XmlTree};

use crate::document::{DocumentPart, TemplateDocument};
use crate::error::DocxResult;
use crate::options::RenderOptions;

pub(crate) const BOOKMARK_START: &str = "w:bookmarkStart";
pub(crate) const BOOKMARK_END: &str = "w:bookmarkEnd";

/// Elements a new paragraph may be attached to
const BLOCK_CONTAINERS: [&str; 9] = [
    "w:body",
    "w:tc",
    "w:sdtContent",
    "w:hdr",
    "w:ftr",
    "w:footnote",
    "w:endnote",
    "w:comment",
    "w:txbxContent",
];

/// Result of rewriting one bookmark across the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Number of occurrences rewritten
    Rewritten(usize),
    /// No start marker carries the name
    NotFound,
    /// Start markers exist but none has a matching end marker
    Unpaired,
}

impl RewriteOutcome {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, RewriteOutcome::Rewritten(_))
    }
}

/// A paired occurrence of a bookmark within one part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkRegion {
    pub start: NodeId,
    pub end: NodeId,
}

impl BookmarkRegion {
    /// Nodes strictly between the markers
    pub fn content(&self, tree: &XmlTree) -> Vec<NodeId> {
        tree.nodes_between(self.start, self.end)
    }

    /// Detach everything between the markers
    pub fn clear(&self, tree: &mut XmlTree) {
        for node in self.content(tree) {
            tree.detach(node);
        }
    }
}

/// Paired occurrences of `name` in a part, plus the number of start
/// markers left without an end marker
pub fn find_regions(tree: &XmlTree, name: &str) -> (Vec<BookmarkRegion>, usize) {
    let all = tree.descendants(tree.document());
    let mut regions = Vec::new();
    let mut unpaired = 0;

    for (pos, &start) in all.iter().enumerate() {
        if !tree.is(start, BOOKMARK_START) || tree.attr(start, "w:name") != Some(name) {
            continue;
        }
        let id = tree.attr(start, "w:id");
        let end = all[pos + 1..]
            .iter()
            .copied()
            .find(|&n| tree.is(n, BOOKMARK_END) && tree.attr(n, "w:id") == id);
        match end {
            Some(end) => regions.push(BookmarkRegion { start, end }),
            None => unpaired += 1,
        }
    }
    (regions, unpaired)
}

/// Every paired bookmark in a part, in document order
pub fn all_regions(tree: &XmlTree) -> Vec<BookmarkRegion> {
    let all = tree.descendants(tree.document());
    all.iter()
        .enumerate()
        .filter(|(_, &n)| tree.is(n, BOOKMARK_START))
        .filter_map(|(pos, &start)| {
            let id = tree.attr(start, "w:id");
            all[pos + 1..]
                .iter()
                .copied()
                .find(|&n| tree.is(n, BOOKMARK_END) && tree.attr(n, "w:id") == id)
                .map(|end| BookmarkRegion { start, end })
        })
        .collect()
}

/// Make sure `node` sits inside a paragraph, wrapping it in a new one
/// attached to the nearest block container when it does not
pub(crate) fn ensure_paragraph(tree: &mut XmlTree, node: NodeId) -> NodeId {
    if let Some(p) = tree.ancestor_named(node, "w:p") {
        return p;
    }

    let container = tree
        .ancestors(node)
        .find(|&a| tree.name(a).is_some_and(|n| BLOCK_CONTAINERS.contains(&n)));
    let paragraph = tree.create_element(Element::new("w:p"));
    match container {
        Some(container) => {
            // The child of the container that holds the marker
            let anchor = std::iter::once(node)
                .chain(tree.ancestors(node))
                .find(|&n| tree.parent(n) == Some(container))
                .unwrap_or(node);
            tree.insert_before(anchor, paragraph);
        }
        None => tree.insert_before(node, paragraph),
    }
    tree.append_child(paragraph, node);
    paragraph
}

/// Run properties of the nearest run carrying any, searching preceding
/// siblings first and then following ones
fn inherited_run_properties(tree: &XmlTree, start: NodeId) -> Option<NodeId> {
    let rpr_of = |n: NodeId| {
        if tree.is(n, "w:r") {
            tree.first_child_named(n, "w:rPr")
        } else {
            None
        }
    };
    std::iter::successors(tree.prev_sibling(start), |&n| tree.prev_sibling(n))
        .find_map(rpr_of)
        .or_else(|| {
            std::iter::successors(tree.next_sibling(start), |&n| tree.next_sibling(n))
                .find_map(rpr_of)
        })
}

/// Build a detached `w:r` holding `text`
///
/// Text starting with a carriage return is placed after two line breaks.
fn build_run(tree: &mut XmlTree, text: &str, rpr: Option<NodeId>) -> NodeId {
    let run = tree.create_element(Element::new("w:r"));
    if let Some(rpr) = rpr {
        tree.append_child(run, rpr);
    }

    let text = match text.strip_prefix('\r') {
        Some(rest) => {
            tree.append_element(run, Element::new("w:br"));
            tree.append_element(run, Element::new("w:br"));
            rest.strip_prefix('\n').unwrap_or(rest)
        }
        None => text,
    };

    let mut t = Element::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t = t.with_attr("xml:space", "preserve");
    }
    let t = tree.append_element(run, t);
    tree.append_text(t, text);
    run
}

/// Replaces bookmark content with text
#[derive(Debug, Clone, Copy)]
pub struct BookmarkRewriter<'a> {
    options: &'a RenderOptions,
}

impl<'a> BookmarkRewriter<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Replace the content of every occurrence of `name` with `text`
    pub fn replace(
        &self,
        doc: &mut TemplateDocument,
        name: &str,
        text: &str,
    ) -> DocxResult<RewriteOutcome> {
        let outcome = doc.for_each_region(name, |_, part, region| {
            self.replace_region(part, region, name, text);
            Ok(())
        })?;
        if let RewriteOutcome::Rewritten(n) = outcome {
            log::debug!("Replaced text of bookmark '{}' ({} occurrence(s))", name, n);
        }
        Ok(outcome)
    }

    fn replace_region(&self, part: &mut DocumentPart, region: BookmarkRegion, name: &str, text: &str) {
        let tree = part.tree_mut();
        let stale = region.content(tree);

        let rpr = match inherited_run_properties(tree, region.start) {
            Some(source) => Some(tree.deep_clone(source)),
            None if name == self.options.highlighted_bookmark => {
                let rpr = tree.create_element(Element::new("w:rPr"));
                tree.append_element(
                    rpr,
                    Element::new("w:color").with_attr("w:val", self.options.highlight_color.as_str()),
                );
                Some(rpr)
            }
            None => None,
        };

        ensure_paragraph(tree, region.start);
        let run = build_run(tree, text, rpr);
        tree.insert_after(region.start, run);

        for node in stale {
            tree.detach(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_of, docx, paragraph_with_bookmark, reopen_main};
    use pretty_assertions::assert_eq;

    fn rewrite(body: &str, name: &str, text: &str) -> (RewriteOutcome, String) {
        let mut doc = TemplateDocument::from_bytes(&docx(body, None, &[])).unwrap();
        let options = RenderOptions::default();
        let outcome = BookmarkRewriter::new(&options).replace(&mut doc, name, text).unwrap();
        let bytes = doc.to_bytes().unwrap();
        (outcome, body_of(&reopen_main(&bytes)))
    }

    #[test]
    fn test_highlighted_bookmark_without_run_is_white() {
        let (outcome, body) = rewrite(&paragraph_with_bookmark("1", "D1", ""), "D1", "Hello");
        assert_eq!(outcome, RewriteOutcome::Rewritten(1));
        assert_eq!(
            body,
            r#"<w:p><w:bookmarkStart w:id="1" w:name="D1"/><w:r><w:rPr><w:color w:val="FFFFFF"/></w:rPr><w:t>Hello</w:t></w:r><w:bookmarkEnd w:id="1"/></w:p>"#
        );
    }

    #[test]
    fn test_other_bookmark_without_run_is_unstyled() {
        let (_, body) = rewrite(&paragraph_with_bookmark("1", "X", ""), "X", "Hello");
        assert_eq!(
            body,
            r#"<w:p><w:bookmarkStart w:id="1" w:name="X"/><w:r><w:t>Hello</w:t></w:r><w:bookmarkEnd w:id="1"/></w:p>"#
        );
    }

    #[test]
    fn test_inherits_preceding_run_and_clears_content() {
        let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Total: </w:t></w:r><w:bookmarkStart w:id="3" w:name="Total"/><w:r><w:rPr><w:i/></w:rPr><w:t>0</w:t></w:r><w:bookmarkEnd w:id="3"/></w:p>"#;
        let (_, body) = rewrite(body, "Total", "42");
        assert_eq!(
            body,
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Total: </w:t></w:r><w:bookmarkStart w:id="3" w:name="Total"/><w:r><w:rPr><w:b/></w:rPr><w:t>42</w:t></w:r><w:bookmarkEnd w:id="3"/></w:p>"#
        );
    }

    #[test]
    fn test_inherits_following_run() {
        let body = r#"<w:p><w:bookmarkStart w:id="3" w:name="Total"/><w:r><w:rPr><w:i/></w:rPr><w:t>0</w:t></w:r><w:bookmarkEnd w:id="3"/></w:p>"#;
        let (_, body) = rewrite(body, "Total", "42");
        assert_eq!(
            body,
            r#"<w:p><w:bookmarkStart w:id="3" w:name="Total"/><w:r><w:rPr><w:i/></w:rPr><w:t>42</w:t></w:r><w:bookmarkEnd w:id="3"/></w:p>"#
        );
    }

    #[test]
    fn test_leading_carriage_return_adds_breaks() {
        let (_, body) = rewrite(&paragraph_with_bookmark("1", "X", ""), "X", "\r\nNext");
        assert!(body.contains("<w:r><w:br/><w:br/><w:t>Next</w:t></w:r>"), "{body}");
    }

    #[test]
    fn test_content_across_paragraphs_removed() {
        let body = r#"<w:p><w:bookmarkStart w:id="5" w:name="Notes"/><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p><w:p><w:r><w:t>c</w:t></w:r><w:bookmarkEnd w:id="5"/><w:r><w:t>after</w:t></w:r></w:p>"#;
        let (_, body) = rewrite(body, "Notes", "new");
        assert_eq!(
            body,
            r#"<w:p><w:bookmarkStart w:id="5" w:name="Notes"/><w:r><w:t>new</w:t></w:r></w:p><w:p><w:bookmarkEnd w:id="5"/><w:r><w:t>after</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_marker_outside_paragraph_is_wrapped() {
        let body = r#"<w:bookmarkStart w:id="2" w:name="X"/><w:p><w:r><w:t>old</w:t></w:r></w:p><w:bookmarkEnd w:id="2"/>"#;
        let (_, body) = rewrite(body, "X", "new");
        assert_eq!(
            body,
            r#"<w:p><w:bookmarkStart w:id="2" w:name="X"/><w:r><w:t>new</w:t></w:r></w:p><w:bookmarkEnd w:id="2"/>"#
        );
    }

    #[test]
    fn test_missing_and_unpaired() {
        let (outcome, _) = rewrite(&paragraph_with_bookmark("1", "X", ""), "Y", "v");
        assert_eq!(outcome, RewriteOutcome::NotFound);

        let body = r#"<w:p><w:bookmarkStart w:id="1" w:name="X"/><w:r><w:t>keep</w:t></w:r></w:p>"#;
        let (outcome, after) = rewrite(body, "X", "v");
        assert_eq!(outcome, RewriteOutcome::Unpaired);
        assert_eq!(after, body);
    }

    #[test]
    fn test_find_regions_pairs_by_id() {
        let body = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:bookmarkStart w:id="1" w:name="A"/><w:bookmarkStart w:id="2" w:name="B"/><w:bookmarkEnd w:id="2"/><w:bookmarkEnd w:id="1"/></w:p></w:body></w:document>"#;
        let tree = docfill_core::xml::parse("doc", body.as_bytes()).unwrap();
        let (regions, unpaired) = find_regions(&tree, "A");
        assert_eq!((regions.len(), unpaired), (1, 0));
        assert_eq!(regions[0].content(&tree).len(), 2);
        assert_eq!(all_regions(&tree).len(), 2);
    }
}
