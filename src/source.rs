//! Fetch collaborators feeding the engine.
//!
//! The engine never performs I/O itself; a session is handed implementations
//! of these traits. Closures with the matching signature implement them
//! directly, which keeps tests and embedders free of boilerplate types.

use std::{
    fmt,
    fs,
    io,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    error::FetchError,
    io_utils::{decode_bytes, text_to_payload},
    payload::PagedPreview,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Returns a preview payload in any of the recognized shapes.
pub trait PreviewSource {
    /// `row_hint` is advisory; a source may return more or fewer rows.
    fn fetch_preview(&self, id: &DatasetId, row_hint: Option<usize>)
    -> Result<JsonValue, FetchError>;
}

/// Returns one server-paginated page (1-based).
pub trait PagedPreviewSource {
    fn fetch_page(
        &self,
        id: &DatasetId,
        page: usize,
        page_size: usize,
    ) -> Result<PagedPreview, FetchError>;
}

/// Returns a backend field list: a bare array or an object wrapping one.
pub trait SchemaSource {
    fn fetch_schema(&self, id: &DatasetId) -> Result<JsonValue, FetchError>;
}

impl<F> PreviewSource for F
where
    F: Fn(&DatasetId, Option<usize>) -> Result<JsonValue, FetchError>,
{
    fn fetch_preview(
        &self,
        id: &DatasetId,
        row_hint: Option<usize>,
    ) -> Result<JsonValue, FetchError> {
        self(id, row_hint)
    }
}

impl<F> PagedPreviewSource for F
where
    F: Fn(&DatasetId, usize, usize) -> Result<PagedPreview, FetchError>,
{
    fn fetch_page(
        &self,
        id: &DatasetId,
        page: usize,
        page_size: usize,
    ) -> Result<PagedPreview, FetchError> {
        self(id, page, page_size)
    }
}

impl<F> SchemaSource for F
where
    F: Fn(&DatasetId) -> Result<JsonValue, FetchError>,
{
    fn fetch_schema(&self, id: &DatasetId) -> Result<JsonValue, FetchError> {
        self(id)
    }
}

/// A schema source for callers that have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaSource for NoSchema {
    fn fetch_schema(&self, id: &DatasetId) -> Result<JsonValue, FetchError> {
        Err(FetchError::NotFound(format!("no schema source for {id}")))
    }
}

/// Filesystem layout rooted at a directory:
///
/// ```text
/// <id>.preview.json | <id>.csv | <id>.txt   preview payload
/// <id>.schema.json                          explicit schema
/// <id>.page-<n>.json                        server page n
/// ```
pub struct FsSource {
    root: PathBuf,
    encoding: &'static Encoding,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encoding: UTF_8,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: &DatasetId, suffix: &str) -> PathBuf {
        self.root.join(format!("{}{suffix}", id.as_str()))
    }

    fn read(&self, path: &Path) -> Result<String, FetchError> {
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(err),
        })?;
        decode_bytes(&bytes, self.encoding)
            .map_err(|err| FetchError::InvalidPayload(format!("{}: {err}", path.display())))
    }

    fn read_json(&self, path: &Path) -> Result<JsonValue, FetchError> {
        let text = self.read(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl PreviewSource for FsSource {
    fn fetch_preview(
        &self,
        id: &DatasetId,
        row_hint: Option<usize>,
    ) -> Result<JsonValue, FetchError> {
        if let Some(hint) = row_hint {
            debug!("Row hint {hint} ignored by filesystem source");
        }
        let json = self.path(id, ".preview.json");
        if json.exists() {
            return self.read_json(&json);
        }
        for suffix in [".csv", ".txt"] {
            let path = self.path(id, suffix);
            if path.exists() {
                debug!("Reading preview text from {path:?}");
                return self.read(&path).map(JsonValue::String);
            }
        }
        Err(FetchError::NotFound(format!(
            "no preview for '{id}' under {}",
            self.root.display()
        )))
    }
}

impl PagedPreviewSource for FsSource {
    fn fetch_page(
        &self,
        id: &DatasetId,
        page: usize,
        page_size: usize,
    ) -> Result<PagedPreview, FetchError> {
        let path = self.path(id, &format!(".page-{page}.json"));
        debug!("Reading page {page} (size {page_size}) from {path:?}");
        let value = self.read_json(&path)?;
        PagedPreview::from_wire(&value)
    }
}

impl SchemaSource for FsSource {
    fn fetch_schema(&self, id: &DatasetId) -> Result<JsonValue, FetchError> {
        let path = self.path(id, ".schema.json");
        self.read(&path).map(text_to_payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn closures_act_as_sources() {
        let source = |id: &DatasetId, _hint: Option<usize>| -> Result<JsonValue, FetchError> {
            Ok(json!({"content": format!("id\n{id}")}))
        };
        let payload = source.fetch_preview(&"42".into(), None).unwrap();
        assert_eq!(payload, json!({"content": "id\n42"}));
        assert!(matches!(
            NoSchema.fetch_schema(&"42".into()),
            Err(FetchError::NotFound(_))
        ));
    }

    #[test]
    fn filesystem_source_prefers_json_then_text() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "x,y\n1,2\n").unwrap();
        fs::write(dir.path().join("b.preview.json"), r#"{"data": []}"#).unwrap();
        fs::write(dir.path().join("b.csv"), "ignored").unwrap();
        let source = FsSource::new(dir.path());

        assert_eq!(
            source.fetch_preview(&"a".into(), Some(5)).unwrap(),
            json!("x,y\n1,2\n")
        );
        assert_eq!(
            source.fetch_preview(&"b".into(), None).unwrap(),
            json!({"data": []})
        );
        assert!(matches!(
            source.fetch_preview(&"missing".into(), None),
            Err(FetchError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_json_surfaces_as_json_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.preview.json"), "{not json").unwrap();
        let source = FsSource::new(dir.path());
        assert!(matches!(
            source.fetch_preview(&"c".into(), None),
            Err(FetchError::Json(_))
        ));
    }

    #[test]
    fn pages_are_read_from_numbered_files() {
        let dir = tempdir().unwrap();
        let wire = json!({
            "Headers": ["id"],
            "Data": [{"Data": {"id": 3}}],
            "Pagination": {"TotalRows": 3, "CurrentPage": 2, "TotalPages": 2}
        });
        fs::write(dir.path().join("d.page-2.json"), wire.to_string()).unwrap();
        let source = FsSource::new(dir.path());
        let page = source.fetch_page(&"d".into(), 2, 2).unwrap();
        assert_eq!(page.pagination.current_page, 2);
        assert!(matches!(
            source.fetch_page(&"d".into(), 1, 2),
            Err(FetchError::NotFound(_))
        ));
    }
}
