use crate::figures::{FigureContext, FigureError};
use crate::model::tables::{AggregatedRow, DerivedRow};
use crate::pipeline::stage4_aggregate::{
    AggregationSpec, OrderStat, category_order, order_by, run_stage4, unique_in_order,
};
use crate::render::{Chart, ChartKind, ChartSpec, points_chart};

pub const MEDICAL_EXAM_TASK: &str = "medical_exam";

/// Exam task dropped before aggregation; its questions carry no signal.
pub const EXCLUDED_TASK: &str = "short_words";

pub fn without_excluded_task(rows: Vec<DerivedRow>) -> Vec<DerivedRow> {
    rows.into_iter()
        .filter(|row| row.field("task") != Some(EXCLUDED_TASK))
        .collect()
}

/// Four box charts of per-model accuracy: by language, domain per language,
/// task and domain.
pub fn medical_exam(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let rows = without_excluded_task(ctx.load_dataset(&[MEDICAL_EXAM_TASK])?);
    let policy = ctx.dataset(MEDICAL_EXAM_TASK).accuracy_policy;
    let aggregate = |keys: &[&str]| -> Result<Vec<AggregatedRow>, FigureError> {
        Ok(run_stage4(&rows, &AggregationSpec::for_policy(policy, keys))?)
    };

    let by_language = aggregate(&["model_name", "language"])?;
    let language = ChartSpec::new(
        "boxplot-medical-exam-language",
        ChartKind::Box,
        "language",
        "accuracy",
    );

    let by_language_domain = aggregate(&["model_name", "language", "domain"])?;
    let domain_order = unique_in_order(
        category_order(
            &by_language_domain,
            &["language", "domain"],
            "accuracy",
            OrderStat::Mean,
            true,
        )?
        .into_iter()
        .filter_map(|mut key| key.pop()),
    );
    let language_domain = ChartSpec::new(
        "boxplot-medical-exam-language-domain",
        ChartKind::Box,
        "domain",
        "accuracy",
    )
    .hue("language")
    .x_order(domain_order);

    let by_task = aggregate(&["model_name", "task"])?;
    let task = ChartSpec::new(
        "boxplot-medical-exam-task",
        ChartKind::Box,
        "task",
        "accuracy",
    )
    .x_order(order_by(&by_task, "task", "accuracy", OrderStat::Mean, true)?);

    let by_domain = aggregate(&["model_name", "domain"])?;
    let domain = ChartSpec::new(
        "boxplot-medical-exam-domain",
        ChartKind::Box,
        "domain",
        "accuracy",
    )
    .x_order(order_by(&by_domain, "domain", "accuracy", OrderStat::Mean, true)?);

    Ok(vec![
        points_chart(&by_language, language)?,
        points_chart(&by_language_domain, language_domain)?,
        points_chart(&by_task, task)?,
        points_chart(&by_domain, domain)?,
    ])
}
