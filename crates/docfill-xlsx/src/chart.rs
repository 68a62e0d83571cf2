//! Chart extraction
//!
//! Charts are reached through the package relationships
//! (worksheet -> drawing -> chart) and matched by title. Each supported
//! plot-area group is walked by the same routine, parameterized by its
//! [`SeriesKind`].

use docfill_core::chartml::{cache_points, chart_element, chart_title, find_cache};
use docfill_core::package::rel_types;
use docfill_core::xml::{NodeId, XmlTree};
use docfill_core::{ChartData, SeriesData, SeriesKind};

use crate::error::XlsxResult;
use crate::reader::XlsxWorkbook;

/// A chart part found in the workbook
#[derive(Debug, Clone)]
pub struct ChartPart {
    /// Part name, e.g. `xl/charts/chart1.xml`
    pub part: String,
    pub title: Option<String>,
    tree: XmlTree,
}

/// Finds workbook charts and reads their cached series
#[derive(Debug, Clone, Default)]
pub struct ChartExtractor {
    charts: Vec<ChartPart>,
}

impl ChartExtractor {
    /// Discover and parse every chart reachable from the workbook's sheets
    pub fn new(workbook: &XlsxWorkbook) -> XlsxResult<Self> {
        let package = workbook.package();
        let mut parts: Vec<String> = Vec::new();

        for sheet in workbook.sheets() {
            for drawing in package.related_parts(&sheet.part, rel_types::DRAWING)? {
                for chart in package.related_parts(&drawing, rel_types::CHART)? {
                    if !parts.contains(&chart) {
                        parts.push(chart);
                    }
                }
            }
        }

        let mut charts = Vec::with_capacity(parts.len());
        for part in parts {
            if !package.has_part(&part) {
                log::warn!("Chart relationship points at missing part '{}'", part);
                continue;
            }
            let tree = package.read_xml(&part)?;
            let title = chart_title(&tree);
            log::debug!("Found chart '{}' titled {:?}", part, title);
            charts.push(ChartPart { part, title, tree });
        }

        Ok(Self { charts })
    }

    pub fn charts(&self) -> &[ChartPart] {
        &self.charts
    }

    /// Distinct non-empty chart titles, in discovery order
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for title in self.charts.iter().filter_map(|c| c.title.as_deref()) {
            if title.is_empty() {
                continue;
            }
            let lower = title.to_lowercase();
            if !titles.iter().any(|t| t.to_lowercase() == lower) {
                titles.push(title.to_string());
            }
        }
        titles
    }

    /// Extract the first chart whose title matches, case-insensitively
    ///
    /// Returns `None` when no chart carries the title or the matching chart
    /// has no supported series.
    pub fn extract(&self, title: &str) -> Option<ChartData> {
        let wanted = title.to_lowercase();
        let chart = self.charts.iter().find(|c| {
            c.title
                .as_deref()
                .map_or(false, |t| t.to_lowercase() == wanted)
        })?;
        let data = read_chart(&chart.tree);
        if data.is_none() {
            log::warn!("Chart '{}' has no line, bar or pie series, dropping it", title);
        }
        data
    }
}

/// One series as cached in the chart part, before repair
struct CachedSeries {
    kind: SeriesKind,
    name: String,
    categories: Option<Vec<Option<String>>>,
    values: Vec<Option<String>>,
}

fn read_series(tree: &XmlTree, kind: SeriesKind, ser: NodeId) -> CachedSeries {
    let name = tree
        .first_child_named(ser, "c:tx")
        .and_then(|tx| tree.descendants_named(tx, "c:v").into_iter().next())
        .map(|v| tree.text_content(v))
        .unwrap_or_default();

    let categories = tree
        .first_child_named(ser, "c:cat")
        .and_then(|cat| find_cache(tree, cat))
        .map(|cache| cache_points(tree, cache));

    let values = tree
        .first_child_named(ser, "c:val")
        .and_then(|val| {
            tree.child_path(val, &["c:numRef", "c:numCache"])
                .or_else(|| tree.first_child_named(val, "c:numLit"))
        })
        .map(|cache| cache_points(tree, cache))
        .unwrap_or_default();

    CachedSeries {
        kind,
        name,
        categories,
        values,
    }
}

fn parse_point(text: Option<&String>) -> Option<f64> {
    text?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a chart part into [`ChartData`]
///
/// Categories come from the first series that caches any and are padded
/// with blank labels to the point count. A point index
/// whose value fails to parse in any series is dropped from every series
/// and from the categories, so all lengths agree afterwards.
pub fn read_chart(tree: &XmlTree) -> Option<ChartData> {
    let chart = chart_element(tree)?;
    let plot_area = tree.first_child_named(chart, "c:plotArea")?;

    let mut cached = Vec::new();
    for kind in SeriesKind::ALL {
        for group in tree.children_named(plot_area, kind.chart_element()) {
            for ser in tree.children_named(group, "c:ser") {
                cached.push(read_series(tree, kind, ser));
            }
        }
    }
    if cached.is_empty() {
        return None;
    }

    let point_count = cached.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let parsed: Vec<Vec<Option<f64>>> = cached
        .iter()
        .map(|s| (0..point_count).map(|i| parse_point(s.values.get(i).and_then(|v| v.as_ref()))).collect())
        .collect();

    let keep: Vec<usize> = (0..point_count)
        .filter(|&i| {
            let bad = cached.iter().zip(&parsed).find(|(_, values)| values[i].is_none());
            if let Some((series, _)) = bad {
                log::warn!(
                    "Dropping point {} of series '{}': {:?} is not a number",
                    i,
                    series.name,
                    series.values.get(i).cloned().flatten().unwrap_or_default()
                );
            }
            bad.is_none()
        })
        .collect();

    let source_categories: Vec<String> = cached
        .iter()
        .find_map(|s| s.categories.as_ref())
        .map(|points| points.iter().map(|p| p.clone().unwrap_or_default()).collect())
        .unwrap_or_default();
    if source_categories.len() > point_count {
        log::debug!(
            "Ignoring {} categories without values",
            source_categories.len() - point_count
        );
    }
    let categories: Vec<String> = keep
        .iter()
        .map(|&i| source_categories.get(i).cloned().unwrap_or_default())
        .collect();

    let series = cached
        .iter()
        .zip(&parsed)
        .map(|(s, values)| {
            let mut values: Vec<f64> = keep.iter().filter_map(|&i| values[i]).collect();
            if s.kind.reverses_cache_order() {
                values.reverse();
            }
            SeriesData::new(s.name.clone(), s.kind, values)
        })
        .collect();

    Some(ChartData {
        title: chart_title(tree).unwrap_or_default(),
        categories,
        series,
    })
}
