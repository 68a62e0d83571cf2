//! Readers shared by spreadsheet and document chart parts
//!
//! Both packages embed the same chart markup (`c:chartSpace`), so title
//! lookup and point-cache reading live here.

use crate::xml::{NodeId, XmlTree};

/// The `c:chart` element of a chart part
pub fn chart_element(tree: &XmlTree) -> Option<NodeId> {
    let root = tree.root_element()?;
    tree.first_child_named(root, "c:chart")
}

/// Text of the chart's own title
///
/// Rich-text runs are concatenated; a title bound to a cell reference
/// falls back to its cached value.
pub fn chart_title(tree: &XmlTree) -> Option<String> {
    let chart = chart_element(tree)?;
    let title = tree.descendants_named(chart, "c:title").into_iter().next()?;
    let tx = tree.first_child_named(title, "c:tx")?;

    if let Some(rich) = tree.first_child_named(tx, "c:rich") {
        let text: String = tree
            .descendants_named(rich, "a:t")
            .into_iter()
            .map(|t| tree.text_content(t))
            .collect();
        return Some(text);
    }
    tree.descendants_named(tx, "c:v")
        .into_iter()
        .next()
        .map(|v| tree.text_content(v))
}

/// Upper bound on the points read from one cache, the per-series limit of
/// a 2-D chart
pub const MAX_CACHE_POINTS: usize = 32_000;

/// Point values of a `c:strCache` / `c:numCache` (or literal) element,
/// indexed by `c:pt/@idx`
///
/// Indices absent from the cache yield `None`. The length is the larger of
/// `c:ptCount` and the highest index present plus one, capped at
/// [`MAX_CACHE_POINTS`]; points indexed past the cap are dropped.
pub fn cache_points(tree: &XmlTree, cache: NodeId) -> Vec<Option<String>> {
    let declared = tree
        .first_child_named(cache, "c:ptCount")
        .and_then(|n| tree.attr(n, "val"))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    if declared > MAX_CACHE_POINTS {
        log::warn!(
            "Chart cache declares {} points, reading at most {}",
            declared,
            MAX_CACHE_POINTS
        );
    }

    let mut points: Vec<(usize, String)> = Vec::new();
    for (pos, pt) in tree.children_named(cache, "c:pt").enumerate() {
        let idx = tree
            .attr(pt, "idx")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(pos);
        if idx >= MAX_CACHE_POINTS {
            log::warn!("Dropping chart cache point with out-of-range index {}", idx);
            continue;
        }
        let value = tree
            .first_child_named(pt, "c:v")
            .map(|v| tree.text_content(v))
            .unwrap_or_default();
        points.push((idx, value));
    }

    let len = points
        .iter()
        .filter_map(|(idx, _)| idx.checked_add(1))
        .max()
        .unwrap_or(0)
        .max(declared)
        .min(MAX_CACHE_POINTS);
    let mut out = vec![None; len];
    for (idx, value) in points {
        out[idx] = Some(value);
    }
    out
}

/// The point cache under a `c:cat`, `c:val` or `c:tx` element
///
/// Numeric caches are preferred over string caches.
pub fn find_cache(tree: &XmlTree, holder: NodeId) -> Option<NodeId> {
    const PATHS: [[&str; 2]; 3] = [
        ["c:numRef", "c:numCache"],
        ["c:strRef", "c:strCache"],
        ["c:multiLvlStrRef", "c:multiLvlStrCache"],
    ];
    PATHS
        .iter()
        .find_map(|path| tree.child_path(holder, path))
        .or_else(|| tree.first_child_named(holder, "c:numLit"))
        .or_else(|| tree.first_child_named(holder, "c:strLit"))
        .map(|cache| {
            // Multi-level caches hold their points one level down
            tree.first_child_named(cache, "c:lvl").unwrap_or(cache)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_chart_title_rich_text() {
        let tree = xml::parse(
            "chart",
            br#"<c:chartSpace><c:chart><c:title><c:tx><c:rich><a:p><a:r><a:t>Sales </a:t></a:r><a:r><a:t>2024</a:t></a:r></a:p></c:rich></c:tx></c:title><c:plotArea/></c:chart></c:chartSpace>"#,
        )
        .unwrap();
        assert_eq!(chart_title(&tree).as_deref(), Some("Sales 2024"));
    }

    #[test]
    fn test_chart_title_missing() {
        let tree = xml::parse("chart", b"<c:chartSpace><c:chart><c:plotArea/></c:chart></c:chartSpace>").unwrap();
        assert_eq!(chart_title(&tree), None);
    }

    #[test]
    fn test_cache_points_sparse() {
        let tree = xml::parse(
            "chart",
            br#"<c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="4"/><c:pt idx="0"><c:v>1</c:v></c:pt><c:pt idx="2"><c:v>3</c:v></c:pt></c:numCache>"#,
        )
        .unwrap();
        let cache = tree.root_element().unwrap();
        assert_eq!(
            cache_points(&tree, cache),
            vec![Some("1".to_string()), None, Some("3".to_string()), None]
        );
    }

    #[test]
    fn test_cache_points_oversized_count_is_capped() {
        let tree = xml::parse(
            "chart",
            br#"<c:numCache><c:ptCount val="1000000000000"/><c:pt idx="1"><c:v>2</c:v></c:pt></c:numCache>"#,
        )
        .unwrap();
        let points = cache_points(&tree, tree.root_element().unwrap());
        assert_eq!(points.len(), MAX_CACHE_POINTS);
        assert_eq!(points[1].as_deref(), Some("2"));
        assert!(points[2..].iter().all(Option::is_none));
    }

    #[test]
    fn test_cache_points_out_of_range_index_dropped() {
        let tree = xml::parse(
            "chart",
            br#"<c:numCache><c:ptCount val="1"/><c:pt idx="0"><c:v>1</c:v></c:pt><c:pt idx="18446744073709551615"><c:v>9</c:v></c:pt><c:pt idx="32000"><c:v>9</c:v></c:pt></c:numCache>"#,
        )
        .unwrap();
        let points = cache_points(&tree, tree.root_element().unwrap());
        assert_eq!(points, vec![Some("1".to_string())]);
    }

    proptest! {
        #[test]
        fn cache_points_never_exceeds_cap(declared in any::<u64>(), idx in any::<u64>()) {
            let markup = format!(
                r#"<c:strCache><c:ptCount val="{declared}"/><c:pt idx="{idx}"><c:v>x</c:v></c:pt></c:strCache>"#
            );
            let tree = xml::parse("chart", markup.as_bytes()).unwrap();
            let points = cache_points(&tree, tree.root_element().unwrap());
            prop_assert!(points.len() <= MAX_CACHE_POINTS);
            let expected = usize::try_from(idx).map_or(false, |i| i < MAX_CACHE_POINTS);
            prop_assert_eq!(points.iter().flatten().count(), usize::from(expected));
        }
    }
}
