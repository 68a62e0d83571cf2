//! Chart series data

use std::fmt;

/// The supported category-series chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeriesKind {
    Line,
    Bar,
    Pie,
}

impl SeriesKind {
    /// Every supported kind, in extraction order
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Line, SeriesKind::Pie, SeriesKind::Bar];

    /// Element name of the plot-area chart group (`c:lineChart`, ...)
    pub fn chart_element(self) -> &'static str {
        match self {
            SeriesKind::Line => "c:lineChart",
            SeriesKind::Bar => "c:barChart",
            SeriesKind::Pie => "c:pieChart",
        }
    }

    /// Whether series values are stored in reverse of their cache order
    pub fn reverses_cache_order(self) -> bool {
        !matches!(self, SeriesKind::Pie)
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesKind::Line => "line",
            SeriesKind::Bar => "bar",
            SeriesKind::Pie => "pie",
        };
        f.write_str(name)
    }
}

/// One data series
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesData {
    /// Series name
    pub name: String,
    /// Chart kind this series belongs to
    pub kind: SeriesKind,
    /// Values in display order
    pub values: Vec<f64>,
}

impl SeriesData {
    /// Create a new data series
    pub fn new(name: impl Into<String>, kind: SeriesKind, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }
}

/// A chart matched by title
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartData {
    /// Chart title, the case-insensitive match key
    pub title: String,
    /// Category labels
    pub categories: Vec<String>,
    /// Data series
    pub series: Vec<SeriesData>,
}

impl ChartData {
    /// Series of one kind, in extraction order
    pub fn series_of(&self, kind: SeriesKind) -> impl Iterator<Item = &SeriesData> {
        self.series.iter().filter(move |s| s.kind == kind)
    }

    /// Case-insensitive title comparison
    pub fn title_matches(&self, other: &str) -> bool {
        self.title.to_lowercase() == other.to_lowercase()
    }
}
