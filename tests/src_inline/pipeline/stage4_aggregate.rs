use super::*;
use crate::input::results::RawResultRow;
use crate::model::score::ScoreParts;
use crate::pipeline::stage2_scores::derive_row;

fn row(model: &str, language: &str, score: &str) -> DerivedRow {
    let raw = RawResultRow {
        model_name: model.to_string(),
        subtask: format!("mc:derma:{language}"),
        score: score.to_string(),
        iterations: Some(2),
        task: "medical_exam".to_string(),
        source: String::new(),
        row: 2,
    };
    let mut derived = derive_row(&raw).unwrap();
    derived
        .fields
        .insert("language".to_string(), language.to_string());
    derived
}

#[test]
fn test_summed_vs_mean_of_ratios_diverge() {
    let rows = vec![row("m", "en", "3/5"), row("m", "en", "1/1")];

    let summed = run_stage4(&rows, &AggregationSpec::summed_scores(&["model_name"])).unwrap();
    assert_eq!(summed.len(), 1);
    assert_eq!(summed[0].score_possible, 6.0);
    assert_eq!(summed[0].score_achieved, 4.0);
    assert!((summed[0].accuracy - 0.6667).abs() < 1e-3);

    let ratios = run_stage4(&rows, &AggregationSpec::mean_of_ratios(&["model_name"])).unwrap();
    assert!((ratios[0].accuracy - 0.8).abs() < 1e-12);
    assert_eq!(ratios[0].n_rows, 2);
}

#[test]
fn test_output_sorted_by_key_regardless_of_input_order() {
    let a = vec![
        row("b", "en", "1/2"),
        row("a", "de", "1/1"),
        row("a", "en", "0/1"),
    ];
    let mut b = a.clone();
    b.reverse();
    let spec = AggregationSpec::summed_scores(&["model_name", "language"]);
    let out_a = run_stage4(&a, &spec).unwrap();
    let out_b = run_stage4(&b, &spec).unwrap();
    assert_eq!(out_a, out_b);
    let keys = out_a.iter().map(|r| r.key_values().join("/")).collect::<Vec<_>>();
    assert_eq!(keys, vec!["a/de", "a/en", "b/en"]);
    assert_eq!(out_a[0].key("language"), Some("de"));
}

#[test]
fn test_first_reduction_and_iterations() {
    let rows = vec![row("m", "en", "1;3/4"), row("m", "en", "2/4")];
    let out = run_stage4(&rows, &AggregationSpec::summed_scores(&["model_name"])).unwrap();
    assert!((out[0].score_sd - 2.0f64.sqrt()).abs() < 1e-12);
    assert_eq!(out[0].iterations, Some(2.0));
}

#[test]
fn test_first_iterations_follows_group_first_row() {
    let mut blank = row("m", "en", "1/2");
    blank.raw.iterations = None;
    let mut later = row("m", "en", "2/2");
    later.raw.iterations = Some(5);

    let spec = AggregationSpec::summed_scores(&["model_name"]);
    let out = run_stage4(&[blank.clone(), later.clone()], &spec).unwrap();
    assert_eq!(out[0].iterations, None);

    let out = run_stage4(&[later, blank], &spec).unwrap();
    assert_eq!(out[0].iterations, Some(5.0));

    let mut mean_spec = AggregationSpec::mean_of_ratios(&["model_name"]);
    mean_spec.iterations = Reduction::Mean;
    let mut a = row("m", "en", "1/2");
    a.raw.iterations = None;
    let out = run_stage4(&[a, row("m", "en", "1/2")], &mean_spec).unwrap();
    assert_eq!(out[0].iterations, Some(2.0));
}

#[test]
fn test_absent_group_is_empty_group_error() {
    let rows = vec![row("m", "en", "1/1")];
    let spec = AggregationSpec::summed_scores(&["model_name", "language"]).require(&["m", "fr"]);
    match run_stage4(&rows, &spec).unwrap_err() {
        PipelineError::EmptyGroup { key } => assert_eq!(key, "model_name=m, language=fr"),
        other => panic!("unexpected error: {other}"),
    }

    let spec = AggregationSpec::summed_scores(&["language"]).require(&["fr"]);
    assert!(matches!(
        run_stage4(&rows, &spec),
        Err(PipelineError::EmptyGroup { .. })
    ));
}

#[test]
fn test_empty_input_is_empty_group_error() {
    let err = run_stage4(&[], &AggregationSpec::mean_of_ratios(&["model_name"])).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyGroup { .. }));
}

#[test]
fn test_unknown_group_column() {
    let rows = vec![row("m", "en", "1/1")];
    let err = run_stage4(&rows, &AggregationSpec::summed_scores(&["domain"])).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownColumn { .. }));
}

#[test]
fn test_category_order_median_and_ties() {
    let rows = vec![
        row("x", "en", "1/1"),
        row("x", "en", "0/1"),
        row("y", "en", "1/2"),
        row("z", "en", "1/2"),
        row("w", "en", "1/4"),
    ];
    let asc = order_by(&rows, "model_name", "accuracy", OrderStat::Median, false).unwrap();
    assert_eq!(asc, vec!["w", "x", "y", "z"]);
    let desc = order_by(&rows, "model_name", "accuracy", OrderStat::Mean, true).unwrap();
    assert_eq!(desc, vec!["x", "y", "z", "w"]);
}

#[test]
fn test_select_categories() {
    let rows = vec![row("a", "en", "1/1"), row("b", "de", "1/1")];
    let picked = select_categories(&rows, "language", &["de"]).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].raw.model_name, "b");
    let err = select_categories(&rows, "language", &["de", "fr"]).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyGroup { .. }));
}

#[test]
fn test_unique_in_order() {
    let v = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string());
    assert_eq!(unique_in_order(v), vec!["b", "a", "c"]);
}

#[test]
fn test_zero_possible_total_is_division_error() {
    let mut zero = row("m", "en", "1/1");
    zero.score = ScoreParts {
        score_possible: 0.0,
        score_achieved: 0.0,
        score_sd: 0.0,
    };
    let err = run_stage4(&[zero], &AggregationSpec::summed_scores(&["model_name"])).unwrap_err();
    assert!(matches!(err, PipelineError::DivisionByZero { .. }));
}
