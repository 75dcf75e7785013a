use crate::figures::{FigureContext, FigureError};
use crate::input::confidence::load_confidence;
use crate::input::find_result_file;
use crate::render::{Chart, ChartData, ChartKind, ChartSpec, HistogramSeries};

pub const CONFIDENCE_TASK: &str = "multimodal_answer_confidence";

/// Ratings are integers 1..=10; one bin per rating.
pub fn rating_edges() -> Vec<f64> {
    (1..=11).map(f64::from).collect()
}

pub fn image_caption_confidence(ctx: &FigureContext) -> Result<Vec<Chart>, FigureError> {
    let path = find_result_file(&ctx.results_dir, CONFIDENCE_TASK)?;
    let ratings = load_confidence(&path)?;
    tracing::debug!(
        correct = ratings.correct.len(),
        incorrect = ratings.incorrect.len(),
        "confidence ratings loaded"
    );

    let series = vec![
        HistogramSeries {
            label: "Correct".to_string(),
            values: ratings.correct.iter().map(|&v| f64::from(v)).collect(),
            color: (0, 128, 0),
        },
        HistogramSeries {
            label: "Incorrect".to_string(),
            values: ratings.incorrect.iter().map(|&v| f64::from(v)).collect(),
            color: (220, 20, 20),
        },
    ];
    let spec = ChartSpec::new(
        "histogram-image-caption-confidence",
        ChartKind::Histogram,
        "Confidence",
        "Count",
    )
    .dimensions(1000, 700);
    Ok(vec![Chart {
        spec,
        data: ChartData::Histogram {
            edges: rating_edges(),
            series,
        },
    }])
}
