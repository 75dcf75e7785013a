use super::*;

fn raw(score: &str) -> RawResultRow {
    RawResultRow {
        model_name: "gpt-4:0613".to_string(),
        subtask: "single_word".to_string(),
        score: score.to_string(),
        iterations: Some(3),
        task: "entity_selection".to_string(),
        source: "entity_selection.csv".to_string(),
        row: 2,
    }
}

#[test]
fn test_multi_valued_numerator() {
    let parts = parse_score("3;5;4/5").unwrap();
    assert_eq!(parts.score_possible, 5.0);
    assert_eq!(parts.score_achieved, 4.0);
    assert_eq!(parts.score_sd, 1.0);
    assert_eq!(compute_accuracy(&parts, "3;5;4/5").unwrap(), 0.8);
}

#[test]
fn test_single_numerator_has_zero_sd() {
    let parts = parse_score("2/4").unwrap();
    assert_eq!(parts.score_possible, 4.0);
    assert_eq!(parts.score_achieved, 2.0);
    assert_eq!(parts.score_sd, 0.0);
    assert_eq!(compute_accuracy(&parts, "2/4").unwrap(), 0.5);
}

#[test]
fn test_accuracy_above_one_is_kept() {
    let row = derive_row(&raw("6/5")).unwrap();
    assert!((row.accuracy - 1.2).abs() < 1e-12);
}

#[test]
fn test_parse_errors() {
    for bad in ["", "3", "1/2/3", "a/5", "3;x/5", "3/", "/5", "-1/5", "3;;4/5", "inf/5"] {
        let err = parse_score(bad).unwrap_err();
        assert!(
            matches!(err, PipelineError::Parse { .. }),
            "{bad:?} gave {err}"
        );
    }
}

#[test]
fn test_zero_denominator_is_division_error_with_location() {
    let err = derive_row(&raw("0/0")).unwrap_err();
    match err {
        PipelineError::DivisionByZero { location, value } => {
            assert_eq!(location, "entity_selection.csv row 2");
            assert_eq!(value, "0/0");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_error_names_row_and_value() {
    let err = run_stage2(&[raw("1/1"), raw("x/1")]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("entity_selection.csv row 2"), "{msg}");
    assert!(msg.contains("'x/1'"), "{msg}");
    assert!(msg.contains("score"), "{msg}");
}

#[test]
fn test_run_stage2_keeps_raw_row() {
    let rows = run_stage2(&[raw("1;0/1")]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].raw.model_name, "gpt-4:0613");
    assert_eq!(rows[0].score.score_achieved, 0.5);
    assert!(rows[0].fields.is_empty());
}
