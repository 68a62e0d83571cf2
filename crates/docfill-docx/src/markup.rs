//! Small helpers for building WordprocessingML fragments

use docfill_core::xml::{Element, NodeId, XmlTree};

pub(crate) const WP_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub(crate) const R_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Append a child element with attributes
pub(crate) fn append(tree: &mut XmlTree, parent: NodeId, name: &str, attrs: &[(&str, &str)]) -> NodeId {
    let element = attrs
        .iter()
        .fold(Element::new(name), |e, (k, v)| e.with_attr(*k, *v));
    tree.append_element(parent, element)
}

/// Declare `xmlns:{prefix}` on the root element unless already present
pub(crate) fn ensure_namespace(tree: &mut XmlTree, prefix: &str, uri: &str) {
    let Some(root) = tree.root_element() else {
        return;
    };
    let key = format!("xmlns:{prefix}");
    if tree.attr(root, &key).is_none() {
        tree.set_attr(root, &key, uri);
    }
}

/// Highest numeric value of `attr` across elements named `name`
pub(crate) fn max_numeric_attr(tree: &XmlTree, name: &str, attr: &str) -> u32 {
    tree.descendants_named(tree.document(), name)
        .into_iter()
        .filter_map(|n| tree.attr(n, attr)?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}
