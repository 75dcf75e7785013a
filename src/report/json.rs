use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::render::{ChartKind, ImageFormat};

/// Machine-readable record of one `render` run, written as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub tool: &'static str,
    pub version: &'static str,
    pub results_dir: String,
    pub overview: Option<String>,
    pub formats: Vec<ImageFormat>,
    pub figures: Vec<FigureSummary>,
}

impl RunSummary {
    pub fn new(results_dir: &Path, overview: Option<&Path>, formats: &[ImageFormat]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            results_dir: results_dir.display().to_string(),
            overview: overview.map(|p| p.display().to_string()),
            formats: formats.to_vec(),
            figures: Vec::new(),
        }
    }

    pub fn rendered(&self) -> usize {
        self.figures
            .iter()
            .filter(|f| f.status == FigureStatus::Rendered)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureStatus {
    Rendered,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureSummary {
    pub id: String,
    pub status: FigureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub charts: Vec<ChartSummary>,
}

impl FigureSummary {
    pub fn skipped(id: &str, reason: String) -> Self {
        Self {
            id: id.to_string(),
            status: FigureStatus::Skipped,
            reason: Some(reason),
            charts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub name: String,
    pub kind: ChartKind,
    pub observations: usize,
    pub files: Vec<String>,
    pub data: String,
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, summary)?;
    writeln!(w)?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/json.rs"]
mod tests;
