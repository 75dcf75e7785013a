use std::collections::BTreeMap;

use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::render::geometry::{box_stats, histogram, kde, padded_range};
use crate::render::layout::{
    CategoryAxis, dodge_offset, hue_axis, jitter, marker_radius, size_axis, slot_width, x_axis,
};
use crate::render::{Chart, ChartData, ChartKind, ChartSpec, HistogramSeries, Point};
use crate::report::mean;

type Plot<DB> = DrawingArea<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";
const KDE_GRID: usize = 64;

pub(super) fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;
    match &chart.data {
        ChartData::Points(points) => draw_categorical(root, &chart.spec, points),
        ChartData::Histogram { edges, series } => draw_histogram(root, &chart.spec, edges, series),
    }
}

/// Resolved category axes for one chart.
struct Layout {
    x: CategoryAxis,
    hue: Option<CategoryAxis>,
    size: Option<CategoryAxis>,
    dodge: bool,
}

impl Layout {
    fn new(spec: &ChartSpec, points: &[Point]) -> Self {
        Self {
            x: x_axis(points, spec.x_order.as_deref()),
            hue: spec
                .hue
                .as_ref()
                .map(|_| hue_axis(points, spec.hue_order.as_deref())),
            size: spec
                .size
                .as_ref()
                .map(|_| size_axis(points, spec.size_order.as_deref())),
            dodge: spec.dodges_hue(),
        }
    }

    fn slots(&self) -> usize {
        match (&self.hue, self.dodge) {
            (Some(hue), true) => hue.len().max(1),
            _ => 1,
        }
    }

    fn x_index(&self, point: &Point) -> usize {
        self.x.index_of(&point.x).unwrap_or(0)
    }

    fn hue_index(&self, point: &Point) -> Option<usize> {
        let hue = self.hue.as_ref()?;
        hue.index_of(point.hue.as_deref()?)
    }

    fn slot(&self, point: &Point) -> usize {
        if self.dodge {
            self.hue_index(point).unwrap_or(0)
        } else {
            0
        }
    }

    fn center(&self, x_idx: usize, slot: usize) -> f64 {
        x_idx as f64 + dodge_offset(slot, self.slots())
    }

    fn color(&self, point: &Point) -> RGBAColor {
        let idx = match &self.hue {
            Some(_) => self.hue_index(point).unwrap_or(0),
            None => self.x_index(point),
        };
        Palette99::pick(idx).to_rgba()
    }

    fn radius(&self, point: &Point) -> u32 {
        match &self.size {
            Some(axis) => marker_radius(
                point.size.as_deref().and_then(|s| axis.index_of(s)),
                axis.len(),
            ),
            None => 4,
        }
    }
}

fn draw_categorical<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    points: &[Point],
) -> Result<(), String> {
    let layout = Layout::new(spec, points);
    let (y_lo, y_hi) = spec
        .y_range
        .unwrap_or_else(|| padded_range(points.iter().map(|p| p.y)));
    let x_hi = layout.x.len() as f64 - 0.5;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(60);
    if let Some(title) = &spec.title {
        builder.caption(title, (FONT, 22));
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5..x_hi, y_lo..y_hi)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .x_desc(spec.x.as_str())
        .y_desc(spec.y.as_str())
        .draw()
        .map_err(|e| e.to_string())?;

    // Category names go under the axis by hand; the numeric x labels are blank.
    let label_style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for (idx, category) in layout.x.categories.iter().enumerate() {
        let text = spec.x_display.get(category).unwrap_or(category);
        let (px, py) = chart.plotting_area().map_coordinate(&(idx as f64, y_lo));
        root.draw(&Text::new(text.clone(), (px, py + 6), label_style.clone()))
            .map_err(|e| e.to_string())?;
    }

    {
        let area = chart.plotting_area();
        match spec.kind {
            ChartKind::Box => draw_boxes(area, &layout, points)?,
            ChartKind::Violin => draw_violins(area, &layout, points)?,
            ChartKind::Strip | ChartKind::Scatter => draw_points(area, spec, &layout, points)?,
            ChartKind::Line => draw_lines(area, &layout, points)?,
            ChartKind::Histogram => return Err("histogram chart without bin edges".to_string()),
        }
        if spec.line_overlay && spec.kind != ChartKind::Line {
            draw_mean_line(area, &layout, points, BLACK.to_rgba())?;
        }
    }

    if let Some(hue) = &layout.hue {
        for (idx, name) in hue.categories.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())
                .map_err(|e| e.to_string())?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }
    if let Some(size) = &layout.size {
        for (idx, name) in size.categories.iter().enumerate() {
            let radius = marker_radius(Some(idx), size.len());
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())
                .map_err(|e| e.to_string())?
                .label(name.as_str())
                .legend(move |(x, y)| Circle::new((x + 5, y), radius, BLACK.mix(0.6).filled()));
        }
    }
    if layout.hue.is_some() || layout.size.is_some() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Values per (x category, hue slot), keeping the colour of the group.
fn groups(layout: &Layout, points: &[Point]) -> BTreeMap<(usize, usize), (RGBAColor, Vec<f64>)> {
    let mut out: BTreeMap<(usize, usize), (RGBAColor, Vec<f64>)> = BTreeMap::new();
    for point in points {
        let key = (layout.x_index(point), layout.slot(point));
        out.entry(key)
            .or_insert_with(|| (layout.color(point), Vec::new()))
            .1
            .push(point.y);
    }
    out
}

fn draw_boxes<DB: DrawingBackend>(
    area: &Plot<DB>,
    layout: &Layout,
    points: &[Point],
) -> Result<(), String> {
    let half = slot_width(layout.slots()) * 0.4;
    for ((x_idx, slot), (color, values)) in groups(layout, points) {
        let Some(stats) = box_stats(&values) else {
            continue;
        };
        let cx = layout.center(x_idx, slot);
        let (left, right) = (cx - half, cx + half);

        area.draw(&Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            color.mix(0.7).filled(),
        ))
        .map_err(|e| e.to_string())?;
        area.draw(&Rectangle::new([(left, stats.q1), (right, stats.q3)], BLACK))
            .map_err(|e| e.to_string())?;
        area.draw(&PathElement::new(
            vec![(left, stats.median), (right, stats.median)],
            BLACK.stroke_width(2),
        ))
        .map_err(|e| e.to_string())?;

        let cap = half * 0.5;
        for (from, to) in [(stats.q1, stats.whisker_low), (stats.q3, stats.whisker_high)] {
            area.draw(&PathElement::new(vec![(cx, from), (cx, to)], BLACK))
                .map_err(|e| e.to_string())?;
            area.draw(&PathElement::new(vec![(cx - cap, to), (cx + cap, to)], BLACK))
                .map_err(|e| e.to_string())?;
        }
        for outlier in stats.outliers {
            area.draw(&Circle::new((cx, outlier), 3u32, BLACK))
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn draw_violins<DB: DrawingBackend>(
    area: &Plot<DB>,
    layout: &Layout,
    points: &[Point],
) -> Result<(), String> {
    let half = slot_width(layout.slots()) * 0.45;
    for ((x_idx, slot), (color, values)) in groups(layout, points) {
        let density = kde(&values, KDE_GRID);
        let peak = density.iter().map(|(_, d)| *d).fold(0.0, f64::max);
        if peak <= 0.0 {
            continue;
        }
        let cx = layout.center(x_idx, slot);
        let mut outline = density
            .iter()
            .map(|(y, d)| (cx - d / peak * half, *y))
            .collect::<Vec<_>>();
        outline.extend(density.iter().rev().map(|(y, d)| (cx + d / peak * half, *y)));

        area.draw(&Polygon::new(outline.clone(), color.mix(0.7).filled()))
            .map_err(|e| e.to_string())?;
        if let Some(first) = outline.first().copied() {
            outline.push(first);
        }
        area.draw(&PathElement::new(outline, BLACK))
            .map_err(|e| e.to_string())?;

        if let Some(stats) = box_stats(&values) {
            area.draw(&PathElement::new(
                vec![(cx, stats.q1), (cx, stats.q3)],
                BLACK.stroke_width(3),
            ))
            .map_err(|e| e.to_string())?;
            area.draw(&Circle::new((cx, stats.median), 3u32, WHITE.filled()))
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn draw_points<DB: DrawingBackend>(
    area: &Plot<DB>,
    spec: &ChartSpec,
    layout: &Layout,
    points: &[Point],
) -> Result<(), String> {
    let width = spec.jitter * slot_width(layout.slots()) / 0.8;
    for (idx, point) in points.iter().enumerate() {
        let key = format!(
            "{}|{}|{}|{idx}",
            point.x,
            point.hue.as_deref().unwrap_or(""),
            point.y
        );
        let shift = point.offset.unwrap_or_else(|| jitter(&key, width));
        let x = layout.center(layout.x_index(point), layout.slot(point)) + shift;
        let color = layout.color(point);
        area.draw(&Circle::new((x, point.y), layout.radius(point), color.filled()))
            .map_err(|e| e.to_string())?;
        area.draw(&Circle::new((x, point.y), layout.radius(point), BLACK.mix(0.5)))
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// One line per hue (or a single line) through the per-category means.
fn draw_lines<DB: DrawingBackend>(
    area: &Plot<DB>,
    layout: &Layout,
    points: &[Point],
) -> Result<(), String> {
    match &layout.hue {
        Some(hue) => {
            for (idx, name) in hue.categories.iter().enumerate() {
                let series = points
                    .iter()
                    .filter(|p| p.hue.as_deref() == Some(name.as_str()))
                    .cloned()
                    .collect::<Vec<_>>();
                draw_mean_line(area, layout, &series, Palette99::pick(idx).to_rgba())?;
            }
            Ok(())
        }
        None => draw_mean_line(area, layout, points, Palette99::pick(0).to_rgba()),
    }
}

fn draw_mean_line<DB: DrawingBackend>(
    area: &Plot<DB>,
    layout: &Layout,
    points: &[Point],
    color: RGBAColor,
) -> Result<(), String> {
    let means = category_means(layout, points);
    if means.is_empty() {
        return Ok(());
    }
    area.draw(&PathElement::new(means.clone(), color.stroke_width(2)))
        .map_err(|e| e.to_string())?;
    for point in means {
        area.draw(&Circle::new(point, 4u32, color.filled()))
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// `(x position, mean y)` for every category with data, in axis order.
fn category_means(layout: &Layout, points: &[Point]) -> Vec<(f64, f64)> {
    let mut by_x: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for point in points {
        by_x.entry(layout.x_index(point)).or_default().push(point.y);
    }
    by_x.into_iter()
        .map(|(x, values)| (x as f64, mean(&values)))
        .collect()
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    edges: &[f64],
    series: &[HistogramSeries],
) -> Result<(), String> {
    let (Some(&x_lo), Some(&x_hi)) = (edges.first(), edges.last()) else {
        return Err(format!("chart '{}' has no bin edges", spec.name));
    };
    let counts = series
        .iter()
        .map(|s| histogram(&s.values, edges))
        .collect::<Vec<_>>();
    let peak = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
    let (y_lo, y_hi) = spec.y_range.unwrap_or((0.0, peak * 1.1));

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60);
    if let Some(title) = &spec.title {
        builder.caption(title, (FONT, 22));
    }
    let mut chart = builder
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(|e| e.to_string())?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x.as_str())
        .y_desc(spec.y.as_str())
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(|e| e.to_string())?;

    for (s, bins) in series.iter().zip(&counts) {
        let (r, g, b) = s.color;
        let color = RGBColor(r, g, b);
        chart
            .draw_series(edges.windows(2).zip(bins).map(|(w, &count)| {
                Rectangle::new([(w[0], 0.0), (w[1], count as f64)], color.mix(0.5).filled())
            }))
            .map_err(|e| e.to_string())?
            .label(s.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/draw.rs"]
mod tests;
