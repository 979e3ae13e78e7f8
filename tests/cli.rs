mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use dataset_preview::{infer::ColumnType, schema::Schema};
use predicates::prelude::*;
use predicates::str::contains;

fn bin() -> Command {
    Command::cargo_bin("dataset-preview").expect("binary exists")
}

fn path_arg(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn preview_prints_requested_page_and_status() {
    let input = fixture_path("orders.csv");
    bin()
        .args(["preview", "-i", path_arg(&input), "--page-size", "5", "--page", "3"])
        .assert()
        .success()
        .stdout(contains("1011"))
        .stdout(contains("1001").not())
        .stdout(contains(
            "Showing 2 of 12 row(s) (12 total) | page 3/3 | status: loaded",
        ));
}

#[test]
fn preview_out_of_range_page_stays_on_first_page() {
    let input = fixture_path("orders.csv");
    bin()
        .args(["preview", "-i", path_arg(&input), "--page", "9"])
        .assert()
        .success()
        .stdout(contains("page 1/2"));
}

#[test]
fn preview_reads_envelope_with_schema() {
    let input = fixture_path("envelope.json");
    bin()
        .args(["preview", "-i", path_arg(&input), "--show-schema"])
        .assert()
        .success()
        .stdout(contains("(250 total)"))
        .stdout(contains("type: boolean"));
}

#[test]
fn unrecognized_payload_previews_fallback_table() {
    let input = fixture_path("unknown.json");
    bin()
        .args(["preview", "-i", path_arg(&input)])
        .assert()
        .success()
        .stdout(contains("Sample A"))
        .stdout(contains("status: fallback (mock; unrecognized payload)"));

    bin()
        .args(["preview", "-i", path_arg(&input), "--fallback", "empty"])
        .assert()
        .success()
        .stdout(contains("Sample A").not())
        .stdout(contains("status: fallback (empty; unrecognized payload)"));
}

#[test]
fn schema_command_enriches_explicit_schema_as_json() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("schema.json");
    bin()
        .args([
            "schema",
            "-i",
            path_arg(&fixture_path("orders.csv")),
            "--explicit",
            path_arg(&fixture_path("orders.schema.json")),
            "--format",
            "json",
            "-o",
            path_arg(&output),
        ])
        .assert()
        .success();

    let schema: Schema =
        serde_json::from_str(&fs::read_to_string(&output).expect("read schema")).expect("parse");
    assert_eq!(schema.len(), 6);
    let order_id = schema.column("order_id").expect("order_id");
    assert!(!order_id.nullable);
    assert_eq!(
        schema.column("paid").map(|c| c.column_type),
        Some(ColumnType::Boolean)
    );
}

#[test]
fn schema_command_rejects_unrecognized_payload() {
    bin()
        .args(["schema", "-i", path_arg(&fixture_path("unknown.json"))])
        .assert()
        .failure()
        .stderr(contains("not a recognized table"));
}

#[test]
fn export_writes_canonical_rows_as_csv() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("matrix.csv");
    bin()
        .args([
            "export",
            "-i",
            path_arg(&fixture_path("matrix.json")),
            "-o",
            path_arg(&output),
        ])
        .assert()
        .success();

    let mut reader = csv::Reader::from_path(&output).expect("open export");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["city", "population"]);
    let records = reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert_eq!(
        records,
        vec![
            vec!["Oslo".to_string(), "709000".to_string()],
            vec!["Bergen".to_string(), String::new()],
            vec!["Tromsø".to_string(), "77000".to_string()],
        ]
    );
}

#[test]
fn annotate_appends_summary_row() {
    bin()
        .args([
            "annotate",
            "-i",
            path_arg(&fixture_path("envelope.json")),
            "--kind",
            "split",
            "--message",
            "Split complete: 2 train / 1 test",
        ])
        .assert()
        .success()
        .stdout(contains("SplitSummary"))
        .stdout(contains("Split complete: 2 train / 1 test"))
        .stdout(contains("Showing 4 of 4 row(s) (250 total)"));
}

#[test]
fn stdin_payload_with_custom_delimiter() {
    bin()
        .args(["preview", "-i", "-", "--delimiter", "semicolon"])
        .write_stdin("name;score\nAnn;3\n\"Lee; Jr\";4\n")
        .assert()
        .success()
        .stdout(contains("Lee; Jr"))
        .stdout(contains("Showing 2 of 2 row(s)"));
}

#[test]
fn legacy_encoding_requires_matching_label() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_bytes("legacy.csv", b"drink,price\ncaf\xe9,3\n");
    bin()
        .args(["preview", "-i", path_arg(&input), "--input-encoding", "windows-1252"])
        .assert()
        .success()
        .stdout(contains("café"));

    bin()
        .args(["preview", "-i", path_arg(&input)])
        .assert()
        .failure()
        .stderr(contains("Failed to decode"));
}

#[test]
fn config_file_sets_page_size() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("preview.yml", "page_size: 4\nfallback: empty\n");
    bin()
        .args([
            "preview",
            "-i",
            path_arg(&fixture_path("orders.csv")),
            "-c",
            path_arg(&config),
        ])
        .assert()
        .success()
        .stdout(contains("page 1/3"));
}

#[test]
fn invalid_config_is_reported() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("bad.yml", "page_size: 0\n");
    bin()
        .args([
            "preview",
            "-i",
            path_arg(&fixture_path("orders.csv")),
            "-c",
            path_arg(&config),
        ])
        .assert()
        .failure()
        .stderr(contains("page_size must be positive"));
}
