//! The template as a forest of story parts
//!
//! Bookmarks may live in the main body, headers, footers, footnotes,
//! endnotes or comments. Each of those parts is parsed once into an
//! [`XmlTree`] and written back only if something changed it.

use std::io::{Read, Seek};

use docfill_core::chartml::chart_title;
use docfill_core::package::rel_types;
use docfill_core::xml::{NodeId, XmlTree};
use docfill_core::Package;

use crate::bookmark::{find_regions, BookmarkRegion, RewriteOutcome, BOOKMARK_START};
use crate::error::{DocxError, DocxResult};

const DOCUMENT_PART: &str = "word/document.xml";

/// Role of a story part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Main,
    Header,
    Footer,
    Footnotes,
    Endnotes,
    Comments,
}

impl PartKind {
    const RELATED: [(PartKind, &'static str); 5] = [
        (PartKind::Header, rel_types::HEADER),
        (PartKind::Footer, rel_types::FOOTER),
        (PartKind::Footnotes, rel_types::FOOTNOTES),
        (PartKind::Endnotes, rel_types::ENDNOTES),
        (PartKind::Comments, rel_types::COMMENTS),
    ];
}

/// A parsed part of the template
#[derive(Debug, Clone)]
pub struct DocumentPart {
    /// Part name, e.g. `word/header1.xml`
    pub name: String,
    pub kind: PartKind,
    tree: XmlTree,
    dirty: bool,
}

impl DocumentPart {
    fn new(name: String, kind: PartKind, tree: XmlTree) -> Self {
        Self {
            name,
            kind,
            tree,
            dirty: false,
        }
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    /// Mutable access; the part will be serialized on save
    pub fn tree_mut(&mut self) -> &mut XmlTree {
        self.dirty = true;
        &mut self.tree
    }
}

/// A chart part referenced from the main document
#[derive(Debug, Clone)]
pub struct TemplateChart {
    pub part: DocumentPart,
    /// Title text, used only as a match key
    pub title: Option<String>,
}

/// A template opened for rewriting
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    package: Package,
    main_part: String,
    parts: Vec<DocumentPart>,
    charts: Vec<TemplateChart>,
}

impl TemplateDocument {
    /// Open a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Open a template from a reader
    pub fn open<R: Read + Seek>(reader: R) -> DocxResult<Self> {
        Self::from_package(Package::from_reader(reader)?)
    }

    /// Parse the story and chart parts of an already loaded package
    pub fn from_package(package: Package) -> DocxResult<Self> {
        if !package.has_part("[Content_Types].xml") {
            return Err(DocxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let main_part = package
            .related_parts("", rel_types::OFFICE_DOCUMENT)?
            .into_iter()
            .next()
            .unwrap_or_else(|| DOCUMENT_PART.to_string());
        if !package.has_part(&main_part) {
            return Err(DocxError::MissingPart(main_part));
        }

        let mut parts = vec![DocumentPart::new(
            main_part.clone(),
            PartKind::Main,
            package.read_xml(&main_part)?,
        )];
        for (kind, rel_type) in PartKind::RELATED {
            for name in package.related_parts(&main_part, rel_type)? {
                if !package.has_part(&name) {
                    log::warn!("Template relationship points at missing part '{}'", name);
                    continue;
                }
                let tree = package.read_xml(&name)?;
                parts.push(DocumentPart::new(name, kind, tree));
            }
        }

        let mut charts = Vec::new();
        for name in package.related_parts(&main_part, rel_types::CHART)? {
            if !package.has_part(&name) {
                log::warn!("Template chart relationship points at missing part '{}'", name);
                continue;
            }
            let tree = package.read_xml(&name)?;
            let title = chart_title(&tree);
            charts.push(TemplateChart {
                part: DocumentPart::new(name, PartKind::Main, tree),
                title,
            });
        }

        log::debug!(
            "Opened template: {} story parts, {} charts",
            parts.len(),
            charts.len()
        );

        Ok(Self {
            package,
            main_part,
            parts,
            charts,
        })
    }

    /// Name of the main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Story parts, main document first
    pub fn parts(&self) -> &[DocumentPart] {
        &self.parts
    }

    pub fn charts(&self) -> &[TemplateChart] {
        &self.charts
    }

    pub(crate) fn charts_mut(&mut self) -> &mut [TemplateChart] {
        &mut self.charts
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub(crate) fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Distinct bookmark names across every story part, in document order
    pub fn bookmark_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for part in &self.parts {
            let tree = part.tree();
            for start in tree.descendants_named(tree.document(), BOOKMARK_START) {
                if let Some(name) = tree.attr(start, "w:name") {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Whether any story part has a bookmark with exactly this name
    pub fn has_bookmark(&self, name: &str) -> bool {
        self.parts.iter().any(|part| {
            let tree = part.tree();
            tree.descendants_named(tree.document(), BOOKMARK_START)
                .into_iter()
                .any(|start| tree.attr(start, "w:name") == Some(name))
        })
    }

    /// Distinct non-empty chart titles
    pub fn chart_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for title in self.charts.iter().filter_map(|c| c.title.as_deref()) {
            let lower = title.to_lowercase();
            if !title.is_empty() && !titles.iter().any(|t| t.to_lowercase() == lower) {
                titles.push(title.to_string());
            }
        }
        titles
    }

    /// Run `edit` on every paired occurrence of a bookmark
    ///
    /// Occurrences whose end marker is missing are skipped with a warning.
    /// The closure receives the package too, for edits that add
    /// relationships.
    pub(crate) fn for_each_region<F>(&mut self, name: &str, mut edit: F) -> DocxResult<RewriteOutcome>
    where
        F: FnMut(&mut Package, &mut DocumentPart, BookmarkRegion) -> DocxResult<()>,
    {
        let mut rewritten = 0;
        let mut unpaired = 0;

        let Self { package, parts, .. } = self;
        for part in parts.iter_mut() {
            let (regions, missing_end) = find_regions(part.tree(), name);
            if missing_end > 0 {
                log::warn!(
                    "Bookmark '{}' in '{}' has no end marker, skipping {} occurrence(s)",
                    name,
                    part.name,
                    missing_end
                );
                unpaired += missing_end;
            }
            for region in regions {
                edit(package, part, region)?;
                rewritten += 1;
            }
        }

        let outcome = match (rewritten, unpaired) {
            (0, 0) => {
                log::warn!("Bookmark '{}' not found in template", name);
                RewriteOutcome::NotFound
            }
            (0, _) => RewriteOutcome::Unpaired,
            (n, _) => RewriteOutcome::Rewritten(n),
        };
        Ok(outcome)
    }

    pub(crate) fn parts_mut(&mut self) -> &mut [DocumentPart] {
        &mut self.parts
    }

    /// Serialize changed parts back into the package and return the archive
    pub fn to_bytes(&mut self) -> DocxResult<Vec<u8>> {
        let Self {
            package,
            parts,
            charts,
            ..
        } = self;
        let changed = parts
            .iter_mut()
            .chain(charts.iter_mut().map(|c| &mut c.part))
            .filter(|p| p.dirty);
        for part in changed {
            package.write_xml(&part.name, &part.tree)?;
            part.dirty = false;
        }
        Ok(package.to_bytes()?)
    }
}

/// Nearest ancestor of `node` that is a `w:p`
pub(crate) fn paragraph_of(tree: &XmlTree, node: NodeId) -> Option<NodeId> {
    tree.ancestor_named(node, "w:p")
}
