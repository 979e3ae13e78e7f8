#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dataset_preview::{
    normalize::ResponseNormalizer,
    preview::PreviewTable,
    schema::{InferenceOptions, infer_schema},
};
use serde_json::Value as JsonValue;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("read fixture")
}

pub fn fixture_json(name: &str) -> JsonValue {
    serde_json::from_str(&fixture_text(name)).expect("parse fixture JSON")
}

/// Normalizes `payload` and infers its schema with default options.
pub fn preview_table(payload: JsonValue) -> PreviewTable {
    let canonical = ResponseNormalizer::default().normalize_value(payload).table;
    let schema = infer_schema(&canonical.rows, &canonical.headers, &InferenceOptions::default());
    PreviewTable::from_canonical(canonical, schema)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
