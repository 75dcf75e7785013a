mod figures;
mod input;
mod logging;
mod model;
mod pipeline;
mod render;
mod report;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::figures::{FigureContext, FigureError, FigureId, build_figure};
use crate::input::InputError;
use crate::input::overview::load_overview;
use crate::input::results::load_results;
use crate::model::identifiers::IdentifierSplit;
use crate::model::policy::{AccuracyPolicy, MalformedPolicy};
use crate::model::profile::{DatasetProfile, PlotProfile, ProfileError};
use crate::pipeline::PipelineError;
use crate::pipeline::stage2_scores::run_stage2;
use crate::pipeline::stage3_fields::run_stage3;
use crate::pipeline::stage4_aggregate::{AggregationSpec, run_stage4};
use crate::pipeline::stage5_reshape::{run_stage5, widen};
use crate::render::{ImageFormat, render_chart};
use crate::report::json::{ChartSummary, FigureStatus, FigureSummary, RunSummary, write_summary};
use crate::report::tsv::{write_aggregated, write_chart_data, write_long_table, write_tsv_file};

#[derive(Parser, Debug)]
#[command(name = "benchplot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate LLM benchmark results and render accuracy charts", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render figures from a results directory and the overview table
    Render(RenderArgs),
    /// Score, derive and aggregate one result file into a TSV table
    Aggregate(AggregateArgs),
    /// Reshape the overview table to long form
    Melt(MeltArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Directory holding `<task>.csv` result files
    #[arg(long)]
    results: PathBuf,

    /// Benchmark overview CSV (wide, one column per task)
    #[arg(long)]
    overview: Option<PathBuf>,

    /// Output directory for images, chart data and summary.json
    #[arg(long)]
    out: PathBuf,

    /// Figure to render; repeat for several (default: all)
    #[arg(long = "figure", value_enum)]
    figures: Vec<FigureId>,

    /// Image format; repeat for several (default: per figure)
    #[arg(long = "format", value_enum)]
    formats: Vec<ImageFormat>,

    /// JSON file overriding built-in orderings and dataset rules
    #[arg(long)]
    profile: Option<PathBuf>,

    /// What to do with rows whose identifiers do not split as expected
    #[arg(long, value_enum)]
    on_malformed: Option<MalformedPolicy>,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// Result CSV (optionally .csv.gz)
    #[arg(long)]
    input: PathBuf,

    /// Group key column; repeat or comma-separate for several
    #[arg(long = "group-by", required = true, value_delimiter = ',')]
    group_by: Vec<String>,

    /// Accuracy aggregation (default: the dataset's)
    #[arg(long, value_enum)]
    policy: Option<AccuracyPolicy>,

    /// Identifier split `<column>:<delimiter>:<count>:<name,name,...>`
    #[arg(long = "split", value_parser = parse_split)]
    splits: Vec<IdentifierSplit>,

    /// Group that must have rows, key values comma-separated in group-by
    /// order; repeat for several
    #[arg(long = "require")]
    required: Vec<String>,

    /// Dataset name used to pick profile rules (default: file stem)
    #[arg(long)]
    dataset: Option<String>,

    #[arg(long, value_enum)]
    on_malformed: Option<MalformedPolicy>,

    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output TSV (default: stdout)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MeltArgs {
    #[arg(long)]
    overview: PathBuf,

    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output TSV (default: stdout)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("figure '{figure}': {source}")]
    Figure {
        figure: &'static str,
        #[source]
        source: FigureError,
    },
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Tsv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli.command) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Render(args) => {
            let summary = run_render(&args)?;
            tracing::info!(
                rendered = summary.rendered(),
                skipped = summary.figures.len() - summary.rendered(),
                out = %args.out.display(),
                "render finished"
            );
            Ok(())
        }
        Command::Aggregate(args) => run_aggregate(&args),
        Command::Melt(args) => run_melt(&args),
    }
}

fn load_profile(path: Option<&Path>) -> Result<PlotProfile, AppError> {
    match path {
        Some(path) => Ok(PlotProfile::load(path)?),
        None => Ok(PlotProfile::builtin()),
    }
}

/// `<column>:<delimiter>:<count>:<names>`; the delimiter may itself be `:`,
/// so the column is taken from the front and count and names from the back.
fn parse_split(raw: &str) -> Result<IdentifierSplit, String> {
    let usage = || format!("'{raw}': expected <column>:<delimiter>:<count>:<name,name,...>");
    let mut tail = raw.rsplitn(3, ':');
    let names = tail.next().ok_or_else(usage)?;
    let count = tail.next().ok_or_else(usage)?;
    let head = tail.next().ok_or_else(usage)?;
    let (column, delimiter) = head.split_once(':').ok_or_else(usage)?;
    let expected = count
        .parse::<usize>()
        .map_err(|_| format!("'{raw}': component count '{count}' is not a number"))?;

    let targets = names
        .split(',')
        .map(str::trim)
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && *name != "_")
        .collect::<Vec<_>>();
    let split = IdentifierSplit::new(column, delimiter, expected, &targets);
    split.validate()?;
    Ok(split)
}

fn dataset_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    name.strip_suffix(".csv").unwrap_or(name).to_string()
}

fn run_render(args: &RenderArgs) -> Result<RunSummary, AppError> {
    let mut ctx = FigureContext::new(&args.results, load_profile(args.profile.as_deref())?);
    ctx.overview = args.overview.clone();
    ctx.on_malformed = args.on_malformed;

    let mut figures = if args.figures.is_empty() {
        FigureId::all().to_vec()
    } else {
        args.figures.clone()
    };
    let mut seen = Vec::with_capacity(figures.len());
    figures.retain(|id| {
        let first = !seen.contains(id);
        seen.push(*id);
        first
    });

    std::fs::create_dir_all(&args.out).map_err(|source| AppError::Io {
        path: args.out.display().to_string(),
        source,
    })?;

    let mut summary = RunSummary::new(&args.results, args.overview.as_deref(), &args.formats);
    for id in figures {
        tracing::debug!(
            figure = id.name(),
            source = if id.uses_overview() { "overview" } else { "results" },
            "building figure"
        );
        let figure = match build_figure(id, &ctx) {
            Ok(figure) => figure,
            Err(FigureError::MissingInput(reason)) => {
                tracing::warn!(figure = id.name(), "skipped: {reason}");
                summary.figures.push(FigureSummary::skipped(id.name(), reason));
                continue;
            }
            Err(source) => {
                return Err(AppError::Figure {
                    figure: id.name(),
                    source,
                });
            }
        };

        let mut charts = Vec::with_capacity(figure.charts.len());
        for chart in &figure.charts {
            let formats = if args.formats.is_empty() {
                &chart.spec.formats
            } else {
                &args.formats
            };
            let files = render_chart(chart, &args.out, formats).map_err(|e| AppError::Figure {
                figure: id.name(),
                source: e.into(),
            })?;
            let data_path = args.out.join(format!("{}.tsv", chart.spec.name));
            write_tsv_file(&data_path, |file| write_chart_data(file, chart)).map_err(|source| {
                AppError::Tsv {
                    path: data_path.display().to_string(),
                    source,
                }
            })?;
            charts.push(ChartSummary {
                name: chart.spec.name.clone(),
                kind: chart.spec.kind,
                observations: chart.observations(),
                files: files.iter().map(|p| p.display().to_string()).collect(),
                data: data_path.display().to_string(),
            });
        }
        tracing::info!(figure = id.name(), charts = charts.len(), "figure rendered");
        summary.figures.push(FigureSummary {
            id: id.name().to_string(),
            status: FigureStatus::Rendered,
            reason: None,
            charts,
        });
    }

    let summary_path = args.out.join("summary.json");
    write_summary(&summary_path, &summary).map_err(|source| AppError::Io {
        path: summary_path.display().to_string(),
        source,
    })?;
    Ok(summary)
}

fn run_aggregate(args: &AggregateArgs) -> Result<(), AppError> {
    let profile = load_profile(args.profile.as_deref())?;
    let name = args
        .dataset
        .clone()
        .unwrap_or_else(|| dataset_stem(&args.input));

    let mut dataset = profile.dataset(&name);
    if !args.splits.is_empty() {
        dataset.splits = DatasetProfile::default().splits;
        dataset.splits.extend(args.splits.iter().cloned());
    }
    if let Some(policy) = args.on_malformed {
        dataset.on_malformed = policy;
    }
    let policy = args.policy.unwrap_or(dataset.accuracy_policy);

    let raw = load_results(&args.input, &name)?;
    let derived = run_stage3(run_stage2(&raw)?, &dataset, &profile)?;
    let group_by = args.group_by.iter().map(String::as_str).collect::<Vec<_>>();
    let mut spec = AggregationSpec::for_policy(policy, &group_by);
    for key in &args.required {
        spec = spec.require(&key.split(',').map(str::trim).collect::<Vec<_>>());
    }
    let aggregated = run_stage4(&derived, &spec)?;
    tracing::info!(
        dataset = %name,
        rows = derived.len(),
        groups = aggregated.len(),
        "aggregated"
    );

    write_table(args.out.as_deref(), |w| write_aggregated(w, &aggregated))
}

fn run_melt(args: &MeltArgs) -> Result<(), AppError> {
    let profile = load_profile(args.profile.as_deref())?;
    let wide = load_overview(&args.overview, &profile.overview_id_columns)?;
    let long = run_stage5(&wide, &profile)?;
    // duplicate entity rows would not survive the way back
    let rewidened = widen(&long)?;
    tracing::info!(
        entities = rewidened.rows.len(),
        observations = long.rows.len(),
        "overview melted"
    );
    write_table(args.out.as_deref(), |w| write_long_table(w, &long))
}

fn write_table(
    out: Option<&Path>,
    write: impl FnOnce(Box<dyn Write>) -> Result<(), csv::Error>,
) -> Result<(), AppError> {
    let (sink, label): (Box<dyn Write>, String) = match out {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| AppError::Io {
                path: path.display().to_string(),
                source,
            })?;
            (Box::new(file), path.display().to_string())
        }
        None => (Box::new(std::io::stdout().lock()), "stdout".to_string()),
    };
    write(sink).map_err(|source| AppError::Tsv {
        path: label,
        source,
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
