use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::input::results::RawResultRow;
use crate::input::InputError;
use crate::input::overview::load_overview;
use crate::model::policy::MalformedPolicy;
use crate::model::profile::{DatasetProfile, PlotProfile};
use crate::model::tables::{DerivedRow, LongTable};
use crate::pipeline::PipelineError;
use crate::pipeline::stage1_load::{missing_inputs, run_stage1};
use crate::pipeline::stage2_scores::run_stage2;
use crate::pipeline::stage3_fields::run_stage3;
use crate::pipeline::stage4_aggregate::unique_in_order;
use crate::pipeline::stage5_reshape::run_stage5;
use crate::render::{Chart, RenderError};

pub mod confidence;
pub mod extraction;
pub mod medical_exam;
pub mod overview;
pub mod text2cypher;

#[derive(Debug, Error)]
pub enum FigureError {
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error(transparent)]
    Input(InputError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<InputError> for FigureError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::MissingInput(what) => FigureError::MissingInput(what),
            other => FigureError::Input(other),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum,
)]
pub enum FigureId {
    #[value(name = "text2cypher")]
    #[serde(rename = "text2cypher")]
    Text2Cypher,
    #[value(name = "text2cypher-safety")]
    #[serde(rename = "text2cypher-safety")]
    Text2CypherSafety,
    #[value(name = "image-caption-confidence")]
    #[serde(rename = "image-caption-confidence")]
    ImageCaptionConfidence,
    #[value(name = "accuracy-per-model")]
    #[serde(rename = "accuracy-per-model")]
    AccuracyPerModel,
    #[value(name = "accuracy-per-quantisation")]
    #[serde(rename = "accuracy-per-quantisation")]
    AccuracyPerQuantisation,
    #[value(name = "accuracy-per-task")]
    #[serde(rename = "accuracy-per-task")]
    AccuracyPerTask,
    #[value(name = "scatter-per-quantisation")]
    #[serde(rename = "scatter-per-quantisation")]
    ScatterPerQuantisation,
    #[value(name = "task-comparison")]
    #[serde(rename = "task-comparison")]
    TaskComparison,
    #[value(name = "rag-tasks")]
    #[serde(rename = "rag-tasks")]
    RagTasks,
    #[value(name = "extraction-tasks")]
    #[serde(rename = "extraction-tasks")]
    ExtractionTasks,
    #[value(name = "medical-exam")]
    #[serde(rename = "medical-exam")]
    MedicalExam,
    #[value(name = "naive-vs-biochatter")]
    #[serde(rename = "naive-vs-biochatter")]
    NaiveVsBiochatter,
}

impl FigureId {
    pub fn all() -> &'static [FigureId] {
        &[
            FigureId::Text2Cypher,
            FigureId::Text2CypherSafety,
            FigureId::ImageCaptionConfidence,
            FigureId::AccuracyPerModel,
            FigureId::AccuracyPerQuantisation,
            FigureId::AccuracyPerTask,
            FigureId::ScatterPerQuantisation,
            FigureId::TaskComparison,
            FigureId::RagTasks,
            FigureId::ExtractionTasks,
            FigureId::MedicalExam,
            FigureId::NaiveVsBiochatter,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            FigureId::Text2Cypher => "text2cypher",
            FigureId::Text2CypherSafety => "text2cypher-safety",
            FigureId::ImageCaptionConfidence => "image-caption-confidence",
            FigureId::AccuracyPerModel => "accuracy-per-model",
            FigureId::AccuracyPerQuantisation => "accuracy-per-quantisation",
            FigureId::AccuracyPerTask => "accuracy-per-task",
            FigureId::ScatterPerQuantisation => "scatter-per-quantisation",
            FigureId::TaskComparison => "task-comparison",
            FigureId::RagTasks => "rag-tasks",
            FigureId::ExtractionTasks => "extraction-tasks",
            FigureId::MedicalExam => "medical-exam",
            FigureId::NaiveVsBiochatter => "naive-vs-biochatter",
        }
    }

    /// Whether the figure reads the overview table rather than raw results.
    pub fn uses_overview(self) -> bool {
        matches!(
            self,
            FigureId::AccuracyPerModel
                | FigureId::AccuracyPerQuantisation
                | FigureId::AccuracyPerTask
                | FigureId::ScatterPerQuantisation
                | FigureId::TaskComparison
                | FigureId::RagTasks
                | FigureId::NaiveVsBiochatter
        )
    }
}

/// Everything a figure job reads. Jobs share nothing else.
#[derive(Debug, Clone)]
pub struct FigureContext {
    pub results_dir: PathBuf,
    pub overview: Option<PathBuf>,
    pub profile: PlotProfile,
    pub on_malformed: Option<MalformedPolicy>,
}

impl FigureContext {
    pub fn new(results_dir: &Path, profile: PlotProfile) -> Self {
        Self {
            results_dir: results_dir.to_path_buf(),
            overview: None,
            profile,
            on_malformed: None,
        }
    }

    /// Dataset rules with the command-line malformed-row policy applied.
    pub fn dataset(&self, name: &str) -> DatasetProfile {
        let mut dataset = self.profile.dataset(name);
        if let Some(policy) = self.on_malformed {
            dataset.on_malformed = policy;
        }
        dataset
    }

    /// Stage 1 over `tasks`, failing with `MissingInput` naming every
    /// absent file.
    pub fn load_raw(&self, tasks: &[&str]) -> Result<Vec<RawResultRow>, FigureError> {
        let missing = missing_inputs(&self.results_dir, tasks);
        if !missing.is_empty() {
            return Err(FigureError::MissingInput(format!(
                "{} not found in {}",
                missing.join(", "),
                self.results_dir.display()
            )));
        }
        Ok(run_stage1(&self.results_dir, tasks)?)
    }

    /// Stages 2 and 3. Each task's rows get that task's dataset rules.
    pub fn derive(&self, raw: &[RawResultRow]) -> Result<Vec<DerivedRow>, FigureError> {
        let derived = run_stage2(raw)?;
        let mut out = Vec::with_capacity(derived.len());
        for task in unique_in_order(derived.iter().map(|r| r.raw.task.clone())) {
            let subset = derived
                .iter()
                .filter(|r| r.raw.task == task)
                .cloned()
                .collect();
            out.extend(run_stage3(subset, &self.dataset(&task), &self.profile)?);
        }
        Ok(out)
    }

    pub fn load_dataset(&self, tasks: &[&str]) -> Result<Vec<DerivedRow>, FigureError> {
        let raw = self.load_raw(tasks)?;
        self.derive(&raw)
    }

    /// The overview table melted to long form with quantisation buckets.
    pub fn load_overview_long(&self) -> Result<LongTable, FigureError> {
        let Some(path) = &self.overview else {
            return Err(FigureError::MissingInput(
                "no overview table given (--overview)".to_string(),
            ));
        };
        if !path.exists() {
            return Err(FigureError::MissingInput(format!(
                "overview table {} not found",
                path.display()
            )));
        }
        let wide = load_overview(path, &self.profile.overview_id_columns)?;
        Ok(run_stage5(&wide, &self.profile)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub id: FigureId,
    pub charts: Vec<Chart>,
}

/// Runs one figure job up to (not including) drawing.
pub fn build_figure(id: FigureId, ctx: &FigureContext) -> Result<Figure, FigureError> {
    let charts = match id {
        FigureId::Text2Cypher => text2cypher::text2cypher(ctx)?,
        FigureId::Text2CypherSafety => text2cypher::text2cypher_safety(ctx)?,
        FigureId::ImageCaptionConfidence => confidence::image_caption_confidence(ctx)?,
        FigureId::AccuracyPerModel => overview::accuracy_per_model(ctx)?,
        FigureId::AccuracyPerQuantisation => overview::accuracy_per_quantisation(ctx)?,
        FigureId::AccuracyPerTask => overview::accuracy_per_task(ctx)?,
        FigureId::ScatterPerQuantisation => overview::scatter_per_quantisation(ctx)?,
        FigureId::TaskComparison => overview::task_comparison(ctx)?,
        FigureId::RagTasks => overview::rag_tasks(ctx)?,
        FigureId::ExtractionTasks => extraction::extraction_tasks(ctx)?,
        FigureId::MedicalExam => medical_exam::medical_exam(ctx)?,
        FigureId::NaiveVsBiochatter => overview::naive_vs_biochatter(ctx)?,
    };
    tracing::debug!(figure = id.name(), charts = charts.len(), "figure built");
    Ok(Figure { id, charts })
}

#[cfg(test)]
#[path = "../../tests/src_inline/figures/tests.rs"]
mod tests;
