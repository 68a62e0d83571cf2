//! Chart cache rewriting
//!
//! Template charts are placeholders matched by title. Their series slots are
//! reused by position; every series gets fresh name, category and value
//! caches. The chart's formulas and styling are left alone.

use docfill_core::xml::{Element, NodeId, XmlTree};
use docfill_core::{ChartData, SeriesData, SeriesKind};

use crate::document::TemplateDocument;
use crate::markup::append;

/// Group children that follow the last `c:ser`
const AFTER_SERIES: [&str; 12] = [
    "c:dLbls",
    "c:dropLines",
    "c:hiLowLines",
    "c:upDownBars",
    "c:marker",
    "c:smooth",
    "c:gapWidth",
    "c:overlap",
    "c:serLines",
    "c:firstSliceAng",
    "c:axId",
    "c:extLst",
];

/// Series children that follow `c:tx`
const AFTER_TX: [&str; 14] = [
    "c:spPr",
    "c:marker",
    "c:invertIfNegative",
    "c:pictureOptions",
    "c:explosion",
    "c:dPt",
    "c:dLbls",
    "c:trendline",
    "c:errBars",
    "c:cat",
    "c:val",
    "c:smooth",
    "c:shape",
    "c:extLst",
];

const AFTER_CAT: [&str; 4] = ["c:val", "c:smooth", "c:shape", "c:extLst"];
const AFTER_VAL: [&str; 3] = ["c:smooth", "c:shape", "c:extLst"];

/// Reference elements a category may be bound through
const CATEGORY_SOURCES: [&str; 5] = ["c:numRef", "c:strRef", "c:multiLvlStrRef", "c:numLit", "c:strLit"];

/// Writes [`ChartData`] into the template's chart parts
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer;

impl ChartRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Fill every template chart whose title matches, returning how many
    /// chart parts were rewritten
    pub fn render(&self, doc: &mut TemplateDocument, chart: &ChartData) -> usize {
        let mut filled = 0;
        for template in doc.charts_mut() {
            let matches = template
                .title
                .as_deref()
                .is_some_and(|title| chart.title_matches(title));
            if !matches {
                continue;
            }
            let written = fill_chart(template.part.tree_mut(), chart);
            log::debug!(
                "Wrote {} series of chart '{}' into '{}'",
                written,
                chart.title,
                template.part.name
            );
            filled += 1;
        }
        if filled == 0 {
            log::warn!("No template chart titled '{}'", chart.title);
        }
        filled
    }
}

/// Rewrite every supported series group of a chart part
///
/// Returns the number of series written.
pub fn fill_chart(tree: &mut XmlTree, chart: &ChartData) -> usize {
    let Some(plot_area) = docfill_core::chartml::chart_element(tree)
        .and_then(|c| tree.first_child_named(c, "c:plotArea"))
    else {
        return 0;
    };

    let mut written = 0;
    for kind in SeriesKind::ALL {
        let Some(group) = tree.first_child_named(plot_area, kind.chart_element()) else {
            continue;
        };
        let series: Vec<&SeriesData> = chart.series_of(kind).collect();
        let mut slots: Vec<NodeId> = tree.children_named(group, "c:ser").collect();

        for (i, data) in series.iter().enumerate() {
            let ser = match slots.get(i) {
                Some(&ser) => ser,
                None => {
                    let ser = new_series(tree, group, slots.last().copied(), i, &data.name);
                    slots.push(ser);
                    ser
                }
            };
            write_series_name(tree, ser, &data.name);
            write_categories(tree, ser, &chart.categories);
            write_values(tree, ser, &data.values);
            written += 1;
        }
    }
    written
}

/// Create an empty `c:ser` after `previous` (or before the group's trailing
/// elements) with explicit index and order
fn new_series(tree: &mut XmlTree, group: NodeId, previous: Option<NodeId>, position: usize, name: &str) -> NodeId {
    let ser = tree.create_element(Element::new("c:ser"));
    let position = position.to_string();
    append(tree, ser, "c:idx", &[("val", position.as_str())]);
    append(tree, ser, "c:order", &[("val", position.as_str())]);
    let tx = append(tree, ser, "c:tx", &[]);
    let str_ref = append(tree, tx, "c:strRef", &[]);
    let cache = append(tree, str_ref, "c:strCache", &[]);
    write_string_points(tree, cache, &[name.to_string()]);

    let trailing = tree
        .children(group)
        .iter()
        .copied()
        .find(|&c| tree.name(c).is_some_and(|n| AFTER_SERIES.contains(&n)));
    match (previous, trailing) {
        (Some(prev), _) => tree.insert_after(prev, ser),
        (None, Some(anchor)) => tree.insert_before(anchor, ser),
        (None, None) => tree.append_child(group, ser),
    }
    ser
}

fn write_series_name(tree: &mut XmlTree, ser: NodeId, name: &str) {
    let tx = tree.ensure_child_before(ser, "c:tx", &AFTER_TX);
    if let Some(literal) = tree.first_child_named(tx, "c:v") {
        tree.set_text(literal, name);
        return;
    }
    let str_ref = tree.ensure_child(tx, "c:strRef");
    let cache = tree.ensure_child(str_ref, "c:strCache");
    write_string_points(tree, cache, &[name.to_string()]);
}

/// Categories are always written as a string cache; a numeric or literal
/// source is replaced, keeping its formula
fn write_categories(tree: &mut XmlTree, ser: NodeId, categories: &[String]) {
    let cat = tree.ensure_child_before(ser, "c:cat", &AFTER_CAT);
    let source = tree
        .children(cat)
        .iter()
        .copied()
        .find(|&c| tree.name(c).is_some_and(|n| CATEGORY_SOURCES.contains(&n)));

    let str_ref = match source {
        Some(node) if tree.is(node, "c:strRef") => node,
        Some(node) => {
            let str_ref = tree.create_element(Element::new("c:strRef"));
            if let Some(formula) = tree.first_child_named(node, "c:f") {
                tree.append_child(str_ref, formula);
            }
            tree.insert_before(node, str_ref);
            tree.detach(node);
            str_ref
        }
        None => append(tree, cat, "c:strRef", &[]),
    };
    let cache = tree.ensure_child(str_ref, "c:strCache");
    write_string_points(tree, cache, categories);
}

fn write_values(tree: &mut XmlTree, ser: NodeId, values: &[f64]) {
    let val = tree.ensure_child_before(ser, "c:val", &AFTER_VAL);
    if let Some(literal) = tree.first_child_named(val, "c:numLit") {
        tree.detach(literal);
    }
    let num_ref = tree.ensure_child(val, "c:numRef");
    let cache = tree.ensure_child(num_ref, "c:numCache");

    tree.clear_children(cache);
    let format = append(tree, cache, "c:formatCode", &[]);
    tree.append_text(format, "General");
    append(tree, cache, "c:ptCount", &[("val", values.len().to_string().as_str())]);
    for (i, value) in values.iter().enumerate() {
        let pt = append(tree, cache, "c:pt", &[("idx", i.to_string().as_str())]);
        let v = append(tree, pt, "c:v", &[]);
        tree.append_text(v, value.to_string());
    }
}

fn write_string_points(tree: &mut XmlTree, cache: NodeId, values: &[String]) {
    tree.clear_children(cache);
    append(tree, cache, "c:ptCount", &[("val", values.len().to_string().as_str())]);
    for (i, value) in values.iter().enumerate() {
        let pt = append(tree, cache, "c:pt", &[("idx", i.to_string().as_str())]);
        let v = append(tree, pt, "c:v", &[]);
        tree.append_text(v, value.as_str());
    }
}
