use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::confidence::{flatten_ratings, load_confidence};
use super::overview::load_overview;
use super::results::load_results;
use super::{InputError, find_result_file};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("benchplot_input_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn overview_columns() -> Vec<String> {
    ["Full model name", "Model name", "Quantisation"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn test_load_results_labels_rows() {
    let dir = make_temp_dir();
    let path = dir.join("entity_selection.csv");
    write_file(
        &path,
        "model_name,subtask,score,iterations,md5_hash\n\
         gpt-4:0613,single_word,3;5;4/5,3,abc\n\
         llama-3:8:ggufv2:Q4_K_M,multi_word,2/4,,def\n",
    );

    let rows = load_results(&path, "entity_selection").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].score, "3;5;4/5");
    assert_eq!(rows[0].iterations, Some(3));
    assert_eq!(rows[1].iterations, None);
    assert_eq!(rows[1].task, "entity_selection");
    assert_eq!(rows[1].row, 3);
    assert_eq!(rows[1].location(), "entity_selection.csv row 3");
}

#[test]
fn test_load_results_without_iterations_column() {
    let dir = make_temp_dir();
    let path = dir.join("plain.csv");
    write_file(&path, "model_name,subtask,score\nm,s,1/1\n");
    let rows = load_results(&path, "plain").unwrap();
    assert_eq!(rows[0].iterations, None);
}

#[test]
fn test_load_results_missing_column() {
    let dir = make_temp_dir();
    let path = dir.join("broken.csv");
    write_file(&path, "model_name,score\nm,1/1\n");
    let err = load_results(&path, "broken").unwrap_err();
    match err {
        InputError::MissingColumn { column, .. } => assert_eq!(column, "subtask"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_gz_results_are_found_and_read() {
    let dir = make_temp_dir();
    write_gz(
        &dir.join("medical_exam.csv.gz"),
        "model_name,subtask,score\nm,mc:dermatology:en,1/2\n",
    );
    let path = find_result_file(&dir, "medical_exam").unwrap();
    let rows = load_results(&path, "medical_exam").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].subtask, "mc:dermatology:en");
}

#[test]
fn test_find_result_file_missing() {
    let dir = make_temp_dir();
    let err = find_result_file(&dir, "rag_interpretation").unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_confidence_blank_cells_filtered() {
    let dir = make_temp_dir();
    let path = dir.join("multimodal_answer_confidence.csv");
    write_file(
        &path,
        "model_name,correct_confidence,incorrect_confidence\n\
         a,8;9;10,\n\
         b,7,2;3\n\
         c,10,nan\n",
    );
    let values = load_confidence(&path).unwrap();
    assert_eq!(values.correct, vec![8, 9, 10, 7, 10]);
    assert_eq!(values.incorrect, vec![2, 3]);
}

#[test]
fn test_flatten_ratings_rejects_bad_token() {
    let cells = vec![(2, "4;x".to_string()), (3, String::new())];
    let err = flatten_ratings(Path::new("conf.csv"), "correct_confidence", &cells).unwrap_err();
    match err {
        InputError::InvalidValue { row, value, .. } => {
            assert_eq!(row, 2);
            assert_eq!(value, "4;x");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_overview_blank_cells_are_none() {
    let dir = make_temp_dir();
    let path = dir.join("overview.csv");
    write_file(
        &path,
        "Full model name,Model name,Quantisation,query_generation,entity_selection\n\
         gpt-4-0613,gpt-4-0613,,0.9,\n\
         llama-3-instruct:8:ggufv2:Q4_K_M,llama-3-instruct,Q4_K_M,0.5,0.75\n",
    );
    let wide = load_overview(&path, &overview_columns()).unwrap();
    assert_eq!(wide.task_columns, vec!["query_generation", "entity_selection"]);
    assert_eq!(wide.rows[0].values, vec![Some(0.9), None]);
    assert_eq!(wide.rows[1].ids[2], "Q4_K_M");
    assert_eq!(wide.cell_count(), 4);
}

#[test]
fn test_overview_invalid_cell() {
    let dir = make_temp_dir();
    let path = dir.join("overview.csv");
    write_file(
        &path,
        "Full model name,Model name,Quantisation,query_generation\nm,m,4-bit,high\n",
    );
    let err = load_overview(&path, &overview_columns()).unwrap_err();
    match err {
        InputError::InvalidValue { row, column, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, "query_generation");
        }
        other => panic!("unexpected error: {other}"),
    }
}
