use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::model::tables::Columnar;

mod draw;
pub mod geometry;
pub mod layout;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart '{chart}': unknown column '{column}'")]
    UnknownColumn { chart: String, column: String },
    #[error("chart '{0}' has no data to draw")]
    Empty(String),
    #[error("drawing {path} failed: {message}")]
    Backend { path: String, message: String },
    #[error("cannot create output directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Box,
    Strip,
    Scatter,
    Violin,
    Histogram,
    Line,
}

/// Which long-form columns go where, plus the few layout knobs the
/// figures need.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub name: String,
    pub kind: ChartKind,
    pub title: Option<String>,
    pub x: String,
    pub y: String,
    pub hue: Option<String>,
    pub size: Option<String>,
    pub x_order: Option<Vec<String>>,
    pub hue_order: Option<Vec<String>>,
    pub size_order: Option<Vec<String>>,
    pub x_display: BTreeMap<String, String>,
    pub y_range: Option<(f64, f64)>,
    pub dodge: bool,
    pub jitter: f64,
    pub line_overlay: bool,
    pub dimensions: (u32, u32),
    pub formats: Vec<ImageFormat>,
}

impl ChartSpec {
    pub fn new(name: &str, kind: ChartKind, x: &str, y: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            title: None,
            x: x.to_string(),
            y: y.to_string(),
            hue: None,
            size: None,
            x_order: None,
            hue_order: None,
            size_order: None,
            x_display: BTreeMap::new(),
            y_range: None,
            dodge: false,
            jitter: if kind == ChartKind::Strip { 0.2 } else { 0.0 },
            line_overlay: false,
            dimensions: (1200, 800),
            formats: vec![ImageFormat::Png],
        }
    }

    pub fn hue(mut self, column: &str) -> Self {
        self.hue = Some(column.to_string());
        self
    }

    pub fn size(mut self, column: &str) -> Self {
        self.size = Some(column.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn x_order(mut self, order: Vec<String>) -> Self {
        self.x_order = Some(order);
        self
    }

    pub fn hue_order(mut self, order: Vec<String>) -> Self {
        self.hue_order = Some(order);
        self
    }

    pub fn size_order(mut self, order: Vec<String>) -> Self {
        self.size_order = Some(order);
        self
    }

    pub fn y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }

    pub fn dodge(mut self) -> Self {
        self.dodge = true;
        self
    }

    pub fn jitter(mut self, width: f64) -> Self {
        self.jitter = width;
        self
    }

    pub fn with_line_overlay(mut self) -> Self {
        self.line_overlay = true;
        self
    }

    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    pub fn formats(mut self, formats: &[ImageFormat]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    pub fn display_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.x_display = names;
        self
    }

    /// Hue groups sit side by side unless hue just repeats the x column.
    pub fn dodges_hue(&self) -> bool {
        match (&self.hue, self.kind) {
            (Some(hue), ChartKind::Box | ChartKind::Violin) => hue != &self.x,
            (Some(hue), _) => self.dodge && hue != &self.x,
            (None, _) => false,
        }
    }
}

/// One plotted observation. `offset` overrides jitter with a fixed shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: String,
    pub y: f64,
    pub hue: Option<String>,
    pub size: Option<String>,
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: String,
    pub values: Vec<f64>,
    pub color: (u8, u8, u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Points(Vec<Point>),
    Histogram {
        edges: Vec<f64>,
        series: Vec<HistogramSeries>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub spec: ChartSpec,
    pub data: ChartData,
}

impl Chart {
    pub fn observations(&self) -> usize {
        match &self.data {
            ChartData::Points(points) => points.len(),
            ChartData::Histogram { series, .. } => series.iter().map(|s| s.values.len()).sum(),
        }
    }
}

/// Pulls the spec's columns out of `rows`. Rows without a y value (blank
/// overview cells) are left out and counted in the debug log.
pub fn collect_points<R: Columnar>(rows: &[R], spec: &ChartSpec) -> Result<Vec<Point>, RenderError> {
    let Some(first) = rows.first() else {
        return Err(RenderError::Empty(spec.name.clone()));
    };
    let columns = [Some(&spec.x), Some(&spec.y), spec.hue.as_ref(), spec.size.as_ref()];
    for column in columns.into_iter().flatten() {
        if !first.has_column(column) {
            return Err(RenderError::UnknownColumn {
                chart: spec.name.clone(),
                column: column.clone(),
            });
        }
    }

    let mut points = Vec::with_capacity(rows.len());
    let mut missing = 0usize;
    for row in rows {
        let Some(y) = row.number(&spec.y) else {
            missing += 1;
            continue;
        };
        points.push(Point {
            x: row.label(&spec.x).unwrap_or_default(),
            y,
            hue: spec.hue.as_ref().and_then(|c| row.label(c)),
            size: spec.size.as_ref().and_then(|c| row.label(c)),
            offset: None,
        });
    }
    if missing > 0 {
        tracing::debug!(chart = %spec.name, missing, "rows without a value left out");
    }
    if points.is_empty() {
        return Err(RenderError::Empty(spec.name.clone()));
    }
    Ok(points)
}

pub fn points_chart<R: Columnar>(rows: &[R], spec: ChartSpec) -> Result<Chart, RenderError> {
    let points = collect_points(rows, &spec)?;
    Ok(Chart {
        spec,
        data: ChartData::Points(points),
    })
}

/// Draws `chart` once per requested format into `out_dir`, returning the
/// written paths.
pub fn render_chart(
    chart: &Chart,
    out_dir: &Path,
    formats: &[ImageFormat],
) -> Result<Vec<PathBuf>, RenderError> {
    if chart.observations() == 0 {
        return Err(RenderError::Empty(chart.spec.name.clone()));
    }
    std::fs::create_dir_all(out_dir).map_err(|source| RenderError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = out_dir.join(format!("{}.{}", chart.spec.name, format.extension()));
        let dims = chart.spec.dimensions;
        let result = match format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, dims).into_drawing_area();
                draw::draw_chart(&root, chart).and_then(|_| root.present().map_err(|e| e.to_string()))
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, dims).into_drawing_area();
                draw::draw_chart(&root, chart).and_then(|_| root.present().map_err(|e| e.to_string()))
            }
        };
        result.map_err(|message| RenderError::Backend {
            path: path.display().to_string(),
            message,
        })?;
        tracing::info!(path = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/tests.rs"]
mod tests;
