use std::collections::BTreeMap;

use crate::figures::{FigureContext, FigureError};
use crate::model::profile::PlotProfile;
use crate::model::tables::{
    ACCURACY_COLUMN, LongFormRow, LongTable, MODEL_NAME_COLUMN, QUANTISATION_COLUMN, TASK_COLUMN,
};
use crate::pipeline::stage4_aggregate::{OrderStat, order_by, select_categories};
use crate::render::layout::jitter;
use crate::render::{Chart, ChartData, ChartKind, ChartSpec, ImageFormat, collect_points, points_chart};

pub const SIZE_COLUMN: &str = "Size";
pub const MEDIAN_ACCURACY_COLUMN: &str = "Median Accuracy";
pub const COARSE_MODEL_COLUMN: &str = "Coarse model name";

pub const RAG_TASKS: [&str; 2] = [
    "explicit_relevance_of_single_fragments",
    "implicit_relevance_of_multiple_fragments",
];
pub const QUERY_GENERATION_TASKS: [&str; 2] =
    ["query_generation", "naive_query_generation_using_schema"];

const VECTOR_AND_RASTER: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Svg];

pub fn accuracy_per_model(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let spec = ChartSpec::new(
        "stripplot-per-model",
        ChartKind::Strip,
        MODEL_NAME_COLUMN,
        ACCURACY_COLUMN,
    )
    .title("Strip plot across tasks, per Model, coloured by size (billions of parameters)")
    .hue(SIZE_COLUMN)
    .hue_order(ctx.profile.model_size_order.clone())
    .y_range(-0.1, 1.1)
    .dimensions(1500, 900);
    Ok(vec![points_chart(&long.rows, spec)?])
}

pub fn accuracy_per_quantisation(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let spec = ChartSpec::new(
        "boxplot-per-quantisation",
        ChartKind::Box,
        MODEL_NAME_COLUMN,
        ACCURACY_COLUMN,
    )
    .title("Boxplot across tasks, per Quantisation")
    .hue(QUANTISATION_COLUMN)
    .hue_order(ctx.profile.quantisation_order.clone())
    .dimensions(1500, 900);
    Ok(vec![points_chart(&long.rows, spec)?])
}

/// Adds the coarse model name (versions merged) as an identifier column.
pub fn with_coarse_model_names(long: &LongTable, profile: &PlotProfile) -> LongTable {
    let mut id_columns = long.id_columns.clone();
    id_columns.push(COARSE_MODEL_COLUMN.to_string());
    let rows = long
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            let coarse = profile.coarse_model_name(row.id(MODEL_NAME_COLUMN).unwrap_or_default());
            row.ids.insert(COARSE_MODEL_COLUMN.to_string(), coarse);
            row
        })
        .collect();
    LongTable {
        id_columns,
        task_columns: long.task_columns.clone(),
        rows,
    }
}

/// Tasks from the highest mean accuracy to the lowest, models side by side.
pub fn accuracy_per_task(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = with_coarse_model_names(&ctx.load_overview_long()?, &ctx.profile);
    let task_order = order_by(&long.rows, TASK_COLUMN, ACCURACY_COLUMN, OrderStat::Mean, true)?;
    let spec = ChartSpec::new("dotplot-per-task", ChartKind::Strip, TASK_COLUMN, ACCURACY_COLUMN)
        .title("Dot plot across models / quantisations, per Task")
        .hue(COARSE_MODEL_COLUMN)
        .x_order(task_order)
        .dodge()
        .jitter(0.2)
        .with_line_overlay()
        .dimensions(2000, 1000)
        .formats(&VECTOR_AND_RASTER);
    Ok(vec![points_chart(&long.rows, spec)?])
}

/// One row per model entry: the task columns are dropped and the remaining
/// identifier tuples deduplicated, first occurrence kept.
pub fn distinct_entities(long: &LongTable) -> Vec<LongFormRow> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for row in &long.rows {
        if seen.contains(&row.ids) {
            continue;
        }
        seen.push(row.ids.clone());
        out.push(LongFormRow {
            ids: row.ids.clone(),
            task: String::new(),
            accuracy: None,
        });
    }
    out
}

/// Horizontal shift of a model's marker within its quantisation column.
/// Reference models sit at fixed offsets so they never overlap; listed
/// models stay centred; everything else gets a stable pseudo-random jitter.
pub fn scatter_offset(profile: &PlotProfile, model: &str, salt: &str) -> f64 {
    if profile.scatter_unjittered.iter().any(|m| m == model) {
        return 0.0;
    }
    let lower = model.to_lowercase();
    let closed = profile
        .scatter_closed_markers
        .iter()
        .any(|m| lower.contains(&m.to_lowercase()));
    if closed {
        return profile
            .scatter_offsets
            .iter()
            .filter(|o| model.contains(o.marker.as_str()))
            .map(|o| o.offset)
            .sum();
    }
    jitter(&format!("{model}|{salt}"), profile.jitter_width)
}

pub fn scatter_per_quantisation(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let entities = distinct_entities(&long);
    let spec = ChartSpec::new(
        "scatter-per-quantisation-name",
        ChartKind::Scatter,
        QUANTISATION_COLUMN,
        MEDIAN_ACCURACY_COLUMN,
    )
    .title("Median accuracy per quantisation, coloured by model, sized by parameters (billions)")
    .hue(MODEL_NAME_COLUMN)
    .size(SIZE_COLUMN)
    .x_order(ctx.profile.quantisation_order.clone())
    .hue_order(ctx.profile.benchmarked_models.clone())
    .size_order(ctx.profile.model_size_order.clone())
    .y_range(0.0, 1.0)
    .dimensions(1600, 1000)
    .formats(&VECTOR_AND_RASTER);

    let mut points = collect_points(&entities, &spec)?;
    for point in &mut points {
        let model = point.hue.as_deref().unwrap_or_default();
        let salt = format!("{}|{}", point.x, point.size.as_deref().unwrap_or_default());
        point.offset = Some(scatter_offset(&ctx.profile, model, &salt));
    }
    Ok(vec![Chart {
        spec,
        data: ChartData::Points(points),
    }])
}

pub fn task_comparison(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let spec = ChartSpec::new("boxplot-tasks", ChartKind::Box, TASK_COLUMN, ACCURACY_COLUMN)
        .hue(TASK_COLUMN)
        .dimensions(1500, 900);
    Ok(vec![points_chart(&long.rows, spec)?])
}

/// Retrieval relevance tasks; models ordered by median overall accuracy,
/// best first.
pub fn rag_tasks(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let rows = select_categories(&long.rows, TASK_COLUMN, &RAG_TASKS)?;
    let model_order = order_by(
        &rows,
        MODEL_NAME_COLUMN,
        MEDIAN_ACCURACY_COLUMN,
        OrderStat::Median,
        true,
    )?;
    let spec = ChartSpec::new(
        "stripplot-rag-tasks",
        ChartKind::Strip,
        MODEL_NAME_COLUMN,
        ACCURACY_COLUMN,
    )
    .hue(QUANTISATION_COLUMN)
    .x_order(model_order)
    .hue_order(ctx.profile.quantisation_order.clone())
    .jitter(0.2)
    .dimensions(1200, 800)
    .formats(&VECTOR_AND_RASTER);
    Ok(vec![points_chart(&rows, spec)?])
}

/// BioChatter query generation against the naive full-schema prompt, as
/// box, strip and violin charts.
pub fn naive_vs_biochatter(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let long = ctx.load_overview_long()?;
    let rows = select_categories(&long.rows, TASK_COLUMN, &QUERY_GENERATION_TASKS)?;
    for task in QUERY_GENERATION_TASKS {
        let n = rows.iter().filter(|r| r.task == task).count();
        tracing::info!(task, rows = n, "query generation comparison");
    }

    let order = QUERY_GENERATION_TASKS
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    let labels = QUERY_GENERATION_TASKS
        .iter()
        .map(|t| (t.to_string(), ctx.profile.task_display_name(t).to_string()))
        .collect::<BTreeMap<_, _>>();
    let base = |name: &str, kind: ChartKind| {
        ChartSpec::new(name, kind, TASK_COLUMN, ACCURACY_COLUMN)
            .x_order(order.clone())
            .display_names(labels.clone())
            .y_range(0.0, 1.0)
            .dimensions(1000, 700)
            .formats(&VECTOR_AND_RASTER)
    };

    Ok(vec![
        points_chart(
            &rows,
            base("boxplot-naive-vs-biochatter", ChartKind::Box)
                .hue(TASK_COLUMN)
                .hue_order(order.clone()),
        )?,
        points_chart(
            &rows,
            base("scatter-naive-vs-biochatter", ChartKind::Strip).jitter(0.2),
        )?,
        points_chart(&rows, base("violin-naive-vs-biochatter", ChartKind::Violin))?,
    ])
}
