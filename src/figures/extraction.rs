use crate::figures::{FigureContext, FigureError};
use crate::pipeline::stage4_aggregate::{AggregationSpec, OrderStat, order_by, run_stage4};
use crate::render::{Chart, ChartKind, ChartSpec, points_chart};

pub const EXTRACTION_TASK: &str = "sourcedata_info_extraction";

/// Accuracy per (model, subtask), scores summed before dividing.
pub fn extraction_tasks(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let rows = ctx.load_dataset(&[EXTRACTION_TASK])?;
    let dataset = ctx.dataset(EXTRACTION_TASK);
    let spec = AggregationSpec::for_policy(dataset.accuracy_policy, &["model_name", "subtask"]);
    let aggregated = run_stage4(&rows, &spec)?;
    let subtask_order = order_by(&aggregated, "subtask", "accuracy", OrderStat::Mean, true)?;

    let chart = ChartSpec::new(
        "stripplot-extraction-tasks",
        ChartKind::Strip,
        "subtask",
        "accuracy",
    )
    .title("Strip plot across models, per subtask, coloured by model name")
    .hue("model_name")
    .x_order(subtask_order)
    .y_range(-0.1, 1.1)
    .dimensions(1200, 800);
    Ok(vec![points_chart(&aggregated, chart)?])
}
