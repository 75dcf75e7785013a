use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("benchplot_main_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_cli_render_defaults() {
    let cli = Cli::try_parse_from(["benchplot", "render", "--results", "r", "--out", "o"]).unwrap();
    match cli.command {
        Command::Render(args) => {
            assert_eq!(args.results, PathBuf::from("r"));
            assert!(args.figures.is_empty());
            assert!(args.formats.is_empty());
            assert!(args.overview.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_cli_render_figures_and_formats() {
    let cli = Cli::try_parse_from([
        "benchplot",
        "-vv",
        "render",
        "--results",
        "r",
        "--out",
        "o",
        "--figure",
        "medical-exam",
        "--figure",
        "rag-tasks",
        "--format",
        "svg",
        "--on-malformed",
        "skip",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    let Command::Render(args) = cli.command else {
        panic!("expected render");
    };
    assert_eq!(args.figures, vec![FigureId::MedicalExam, FigureId::RagTasks]);
    assert_eq!(args.formats, vec![ImageFormat::Svg]);
    assert_eq!(args.on_malformed, Some(MalformedPolicy::Skip));
}

#[test]
fn test_cli_rejects_unknown_figure() {
    let res = Cli::try_parse_from([
        "benchplot",
        "render",
        "--results",
        "r",
        "--out",
        "o",
        "--figure",
        "pie-chart",
    ]);
    assert!(res.is_err());
}

#[test]
fn test_cli_aggregate_group_by_is_required() {
    assert!(Cli::try_parse_from(["benchplot", "aggregate", "--input", "x.csv"]).is_err());
    let cli = Cli::try_parse_from([
        "benchplot",
        "aggregate",
        "--input",
        "x.csv",
        "--group-by",
        "model_name,subtask",
        "--split",
        "subtask:::3:task,domain,language",
    ])
    .unwrap();
    let Command::Aggregate(args) = cli.command else {
        panic!("expected aggregate");
    };
    assert_eq!(args.group_by, vec!["model_name", "subtask"]);
    assert_eq!(args.splits.len(), 1);
    assert_eq!(args.splits[0].delimiter, ":");
}

#[test]
fn test_parse_split_colon_delimiter() {
    let split = parse_split("subtask:::3:task,domain,language").unwrap();
    assert_eq!(split.column, "subtask");
    assert_eq!(split.delimiter, ":");
    assert_eq!(split.expected, 3);
    let names = split.targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["task", "domain", "language"]);
}

#[test]
fn test_parse_split_skips_placeholders() {
    let split = parse_split("subtask:|:2:_,field").unwrap();
    assert_eq!(split.delimiter, "|");
    assert_eq!(split.targets.len(), 1);
    assert_eq!(split.targets[0].index, 1);
    assert_eq!(split.targets[0].name, "field");
}

#[test]
fn test_parse_split_errors() {
    assert!(parse_split("subtask").is_err());
    assert!(parse_split("subtask:::x:task").is_err());
}

#[test]
fn test_dataset_stem() {
    assert_eq!(dataset_stem(Path::new("/a/medical_exam.csv.gz")), "medical_exam");
    assert_eq!(dataset_stem(Path::new("entity_selection.csv")), "entity_selection");
    assert_eq!(dataset_stem(Path::new("plain")), "plain");
}

#[test]
fn test_render_skips_figures_without_inputs() {
    let results = make_temp_dir();
    let out = make_temp_dir().join("figures");
    let args = RenderArgs {
        results: results.clone(),
        overview: None,
        out: out.clone(),
        figures: vec![FigureId::Text2Cypher, FigureId::RagTasks, FigureId::Text2Cypher],
        formats: Vec::new(),
        profile: None,
        on_malformed: None,
    };
    let summary = run_render(&args).unwrap();
    assert_eq!(summary.figures.len(), 2);
    assert_eq!(summary.rendered(), 0);
    assert!(
        summary
            .figures
            .iter()
            .all(|f| f.status == FigureStatus::Skipped && f.reason.is_some())
    );

    let text = fs::read_to_string(out.join("summary.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["figures"][0]["id"], "text2cypher");
    assert_eq!(json["figures"][1]["status"], "skipped");
}

#[test]
fn test_render_aborts_on_bad_data() {
    let results = make_temp_dir();
    fs::write(
        results.join("medical_exam.csv"),
        "model_name,subtask,score\nm,mc:derma:en,1/0\n",
    )
    .unwrap();
    let args = RenderArgs {
        results,
        overview: None,
        out: make_temp_dir(),
        figures: vec![FigureId::MedicalExam],
        formats: Vec::new(),
        profile: None,
        on_malformed: None,
    };
    match run_render(&args).unwrap_err() {
        AppError::Figure { figure, source } => {
            assert_eq!(figure, "medical-exam");
            assert!(matches!(
                source,
                FigureError::Pipeline(PipelineError::DivisionByZero { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_aggregate_writes_tsv() {
    let dir = make_temp_dir();
    let input = dir.join("entity_selection.csv");
    fs::write(
        &input,
        "model_name,subtask,score,iterations\n\
         gpt-4:0613,a,3/5,2\n\
         gpt-4:0613,b,1/1,2\n\
         chatglm3:6:ggmlv3:q4_0,a,0/2,2\n",
    )
    .unwrap();
    let out = dir.join("aggregated.tsv");
    let args = AggregateArgs {
        input,
        group_by: vec!["model".to_string()],
        policy: None,
        splits: Vec::new(),
        required: Vec::new(),
        dataset: None,
        on_malformed: None,
        profile: None,
        out: Some(out.clone()),
    };
    run_aggregate(&args).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("model\tscore_possible\tscore_achieved"));
    let gpt = lines.iter().find(|l| l.starts_with("gpt-4\t")).unwrap();
    assert!(gpt.starts_with("gpt-4\t6.000000\t4.000000\t"), "{gpt}");
    assert!(gpt.contains("\t0.666667\t2"), "{gpt}");
}

#[test]
fn test_aggregate_unknown_group_column() {
    let dir = make_temp_dir();
    let input = dir.join("plain.csv");
    fs::write(&input, "model_name,subtask,score\nm,a,1/2\n").unwrap();
    let args = AggregateArgs {
        input,
        group_by: vec!["language".to_string()],
        policy: Some(AccuracyPolicy::MeanOfRatios),
        splits: Vec::new(),
        required: Vec::new(),
        dataset: None,
        on_malformed: None,
        profile: None,
        out: Some(dir.join("out.tsv")),
    };
    assert!(matches!(
        run_aggregate(&args),
        Err(AppError::Pipeline(PipelineError::UnknownColumn { .. }))
    ));
}

#[test]
fn test_melt_writes_long_table() {
    let dir = make_temp_dir();
    let overview = dir.join("overview.csv");
    fs::write(
        &overview,
        "Full model name,Model name,Size,Version,Quantisation,Mean Accuracy,Median Accuracy,SD,query_generation,entity_selection\n\
         gpt-4-0613,gpt-4-0613,Unknown,0613,,0.9,0.9,0.1,0.9,\n",
    )
    .unwrap();
    let out = dir.join("long.tsv");
    let args = MeltArgs {
        overview,
        profile: None,
        out: Some(out.clone()),
    };
    run_melt(&args).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("\tTask\tAccuracy"));
    assert!(lines[1].contains(">= 16-bit*"));
    assert!(lines[2].ends_with("\tentity_selection\t"));
}

#[test]
fn test_aggregate_required_group_missing() {
    let dir = make_temp_dir();
    let input = dir.join("medical_exam.csv");
    fs::write(&input, "model_name,subtask,score\nm,mc:derma:en,1/2\n").unwrap();
    let args = AggregateArgs {
        input,
        group_by: vec!["model".to_string(), "language".to_string()],
        policy: None,
        splits: Vec::new(),
        required: vec!["m, de".to_string()],
        dataset: None,
        on_malformed: None,
        profile: None,
        out: Some(dir.join("out.tsv")),
    };
    match run_aggregate(&args).unwrap_err() {
        AppError::Pipeline(PipelineError::EmptyGroup { key }) => {
            assert_eq!(key, "model=m, language=de");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_aggregate_input_errors_stay_input_errors() {
    let dir = make_temp_dir();
    let input = dir.join("broken.csv");
    fs::write(&input, "model_name,score\nm,1/2\n").unwrap();
    let args = AggregateArgs {
        input,
        group_by: vec!["model".to_string()],
        policy: None,
        splits: Vec::new(),
        required: Vec::new(),
        dataset: None,
        on_malformed: None,
        profile: None,
        out: Some(dir.join("out.tsv")),
    };
    assert!(matches!(
        run_aggregate(&args),
        Err(AppError::Input(InputError::MissingColumn { .. }))
    ));
}
