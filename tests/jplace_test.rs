//! Tests for jplace document parsing and serialization

use std::path::Path;

use placeqc::errors::PlaceError;
use placeqc::jplace;

#[ctor::ctor]
fn init() {
    placeqc::util::testing::init_test_setup();
}

const TREE: &str = "((A:0.1{0},B:0.2{1}):0.3{2},C:0.4{3},D:0.5{4});";

fn doc(fields: &str, placements: &str) -> String {
    format!(
        r#"{{
            "tree": "{TREE}",
            "fields": [{fields}],
            "placements": [{placements}],
            "version": 3,
            "metadata": {{"invocation": "unit test"}}
        }}"#
    )
}

#[test]
fn given_n_form_document_when_reading_then_names_and_placements_are_parsed() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[0, -1234.5, 0.9, 0.05, 0.01], [1, -1250.0, 0.1, 0.02, 0.03]], "n": ["query_a"]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    assert_eq!(sample.len(), 1);
    let pquery = &sample.pqueries[0];
    assert_eq!(pquery.primary_name(), Some("query_a"));
    assert_eq!(pquery.names[0].multiplicity, 1.0);
    assert_eq!(pquery.placements.len(), 2);
    assert_eq!(pquery.placements[0].edge_num, 0);
    assert!((pquery.placements[0].like_weight_ratio - 0.9).abs() < 1e-12);
}

#[test]
fn given_nm_form_document_when_reading_then_multiplicities_are_kept() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[3, -900.0, 1.0, 0.1, 0.02]], "nm": [["query_b", 2.5]]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    assert_eq!(sample.pqueries[0].names[0].name, "query_b");
    assert!((sample.pqueries[0].names[0].multiplicity - 2.5).abs() < 1e-12);
}

#[test]
fn given_reordered_fields_when_reading_then_layout_is_resolved_by_name() {
    let content = doc(
        r#""pendant_length", "edge_num", "proximal_length", "likelihood", "like_weight_ratio""#,
        r#"{"p": [[0.01, 2, 0.05, -1234.5, 0.9]], "n": ["query_c"]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    let placement = &sample.pqueries[0].placements[0];
    assert_eq!(placement.edge_num, 2);
    assert!((placement.pendant_length - 0.01).abs() < 1e-12);
    assert!((placement.proximal_length - 0.05).abs() < 1e-12);
}

#[test]
fn given_distal_lengths_when_reading_then_they_convert_to_proximal() {
    // edge 3 has branch length 0.4; distal 0.1 means proximal 0.3
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "distal_length", "pendant_length""#,
        r#"{"p": [[3, -900.0, 1.0, 0.1, 0.02]], "n": ["query_d"]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    let placement = &sample.pqueries[0].placements[0];
    assert!((placement.proximal_length - 0.3).abs() < 1e-12);
}

#[test]
fn given_oversized_distal_length_when_reading_then_proximal_clamps_to_zero() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "distal_length", "pendant_length""#,
        r#"{"p": [[3, -900.0, 1.0, 9.9, 0.02]], "n": ["query_e"]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    assert_eq!(sample.pqueries[0].placements[0].proximal_length, 0.0);
}

#[test]
fn given_nan_markers_when_reading_then_fields_become_nan() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[0, "nan", 0.9, null, 0.01]], "n": ["query_f"]}"#,
    );

    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    let placement = &sample.pqueries[0].placements[0];
    assert!(placement.likelihood.is_nan());
    assert!(placement.proximal_length.is_nan());
    assert!(!placement.is_valid());
}

#[test]
fn given_unknown_edge_num_when_reading_then_it_fails() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[99, -900.0, 1.0, 0.1, 0.02]], "n": ["query_g"]}"#,
    );

    let result = jplace::read_str(Path::new("test.jplace"), &content);

    assert!(matches!(result, Err(PlaceError::UnknownEdgeNum(99))));
}

#[test]
fn given_missing_field_when_reading_then_it_fails() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "pendant_length""#,
        r#"{"p": [[0, -900.0, 1.0, 0.02]], "n": ["query_h"]}"#,
    );

    let result = jplace::read_str(Path::new("test.jplace"), &content);

    assert!(matches!(result, Err(PlaceError::InvalidJplace { .. })));
}

#[test]
fn given_malformed_json_when_reading_then_it_fails() {
    let result = jplace::read_str(Path::new("test.jplace"), "{\"tree\": ");

    assert!(matches!(result, Err(PlaceError::InvalidJplace { .. })));
}

#[test]
fn given_sample_when_written_and_reread_then_content_survives() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[0, -1234.5, 0.9, 0.05, 0.01]], "nm": [["query_i", 3.0]]}"#,
    );
    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.jplace");

    jplace::write_file(&sample, &path).unwrap();
    let reread = jplace::read_file(&path).unwrap();

    assert_eq!(reread.len(), sample.len());
    assert_eq!(reread.tree.edge_count(), sample.tree.edge_count());
    assert_eq!(reread.tree.leaf_names(), sample.tree.leaf_names());
    let pquery = &reread.pqueries[0];
    assert_eq!(pquery.primary_name(), Some("query_i"));
    assert!((pquery.names[0].multiplicity - 3.0).abs() < 1e-12);
    assert_eq!(pquery.placements[0].edge_num, 0);
}

#[test]
fn given_nan_pendant_when_writing_then_it_serializes_as_null() {
    let content = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[0, -900.0, 1.0, 0.1, "nan"]], "n": ["query_j"]}"#,
    );
    let sample = jplace::read_str(Path::new("test.jplace"), &content).unwrap();

    let text = jplace::write_string(&sample).unwrap();

    assert!(text.contains("null"));
    let reread = jplace::read_str(Path::new("rewritten.jplace"), &text).unwrap();
    assert!(reread.pqueries[0].placements[0].pendant_length.is_nan());
}

#[test]
fn given_many_files_when_reading_in_bulk_then_each_gets_its_own_result() {
    let good = doc(
        r#""edge_num", "likelihood", "like_weight_ratio", "proximal_length", "pendant_length""#,
        r#"{"p": [[0, -900.0, 1.0, 0.1, 0.02]], "n": ["query_k"]}"#,
    );
    let dir = tempfile::tempdir().unwrap();
    let good_path = dir.path().join("good.jplace");
    let bad_path = dir.path().join("bad.jplace");
    std::fs::write(&good_path, &good).unwrap();
    std::fs::write(&bad_path, "not json").unwrap();

    let results = jplace::read_files(&[good_path, bad_path]);

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}
