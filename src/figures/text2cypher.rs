use crate::figures::{FigureContext, FigureError};
use crate::pipeline::stage1_load::filter_subtask;
use crate::pipeline::stage3_fields::{MODEL_FAMILY_FIELD, MODEL_FIELD};
use crate::pipeline::stage4_aggregate::{OrderStat, order_by};
use crate::render::{Chart, ChartKind, ChartSpec, points_chart};

pub const TEXT2CYPHER_TASKS: [&str; 6] = [
    "entity_selection",
    "relationship_selection",
    "property_selection",
    "property_exists",
    "query_generation",
    "end_to_end_query_generation",
];

/// Accuracy per task, one box per model family. Tasks run from the lowest
/// median accuracy to the highest.
pub fn text2cypher(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let rows = ctx.load_dataset(&TEXT2CYPHER_TASKS)?;
    let task_order = order_by(&rows, "task", "accuracy", OrderStat::Median, false)?;

    let spec = ChartSpec::new("boxplot-text2cypher", ChartKind::Box, "task", "accuracy")
        .hue(MODEL_FAMILY_FIELD)
        .x_order(task_order)
        .hue_order(ctx.profile.family_order.clone())
        .dimensions(1200, 800);
    Ok(vec![points_chart(&rows, spec)?])
}

/// Safety subtasks only: one column of points per model.
pub fn text2cypher_safety(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let raw = ctx.load_raw(&TEXT2CYPHER_TASKS)?;
    let safety = filter_subtask(&raw, "safety");
    tracing::debug!(rows = raw.len(), safety = safety.len(), "safety subtasks selected");
    let rows = ctx.derive(&safety)?;
    let model_order = order_by(&rows, MODEL_FIELD, "accuracy", OrderStat::Median, false)?;

    let spec = ChartSpec::new(
        "stripplot-text2cypher-safety",
        ChartKind::Strip,
        MODEL_FIELD,
        "accuracy",
    )
    .hue("subtask")
    .x_order(model_order)
    .dimensions(1200, 800);
    Ok(vec![points_chart(&rows, spec)?])
}
