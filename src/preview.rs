//! The published preview table.
//!
//! A [`PreviewTable`] is built completely before anyone sees it and is never
//! mutated afterwards; consumers hold it behind an `Arc` and a newer load
//! replaces the whole value.

use std::{borrow::Cow, fmt};

use crate::{
    config::FallbackPolicy,
    normalize::CanonicalTable,
    schema::{InferenceOptions, Schema, infer_schema},
    value::{CELL_PLACEHOLDER, CellValue, Row},
};

/// Why a fallback table was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The preview source failed; carries the error text.
    Fetch(String),
    /// The payload matched no known shape.
    Unrecognized,
    /// A server page reported counts that do not add up.
    InvalidPagination(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Fetch(err) => write!(f, "fetch failed: {err}"),
            FallbackReason::Unrecognized => f.write_str("unrecognized payload"),
            FallbackReason::InvalidPagination(err) => write!(f, "invalid pagination: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableStatus {
    /// Nothing has been published yet.
    #[default]
    Loading,
    Loaded,
    /// The source answered successfully with zero rows.
    Empty,
    Fallback {
        policy: FallbackPolicy,
        reason: FallbackReason,
    },
}

impl TableStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TableStatus::Loading => "loading",
            TableStatus::Loaded => "loaded",
            TableStatus::Empty => "empty",
            TableStatus::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewTable {
    headers: Vec<String>,
    rows: Vec<Row>,
    total_rows: usize,
    schema: Schema,
    status: TableStatus,
}

impl PreviewTable {
    /// The placeholder shown while the first load is in flight.
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn from_canonical(canonical: CanonicalTable, schema: Schema) -> Self {
        let status = if canonical.rows.is_empty() {
            TableStatus::Empty
        } else {
            TableStatus::Loaded
        };
        Self {
            headers: canonical.headers,
            rows: canonical.rows,
            total_rows: canonical.total_rows,
            schema,
            status,
        }
    }

    pub fn fallback(
        policy: FallbackPolicy,
        reason: FallbackReason,
        options: &InferenceOptions,
    ) -> Self {
        let canonical = match policy {
            FallbackPolicy::Mock => mock_table(),
            FallbackPolicy::Empty => CanonicalTable::default(),
        };
        let schema = infer_schema(&canonical.rows, &canonical.headers, options);
        Self {
            headers: canonical.headers,
            rows: canonical.rows,
            total_rows: canonical.total_rows,
            schema,
            status: TableStatus::Fallback { policy, reason },
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub(crate) fn with_rows(mut self, headers: Vec<String>, rows: Vec<Row>) -> Self {
        self.headers = headers;
        self.rows = rows;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, TableStatus::Fallback { .. })
    }

    /// Position of the first header called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Display text of a cell; any missing row or column yields the
    /// placeholder rather than an error.
    pub fn cell(&self, row_index: usize, header: &str) -> Cow<'_, str> {
        match self.rows.get(row_index) {
            Some(row) => row.cell_text(header),
            None => Cow::Borrowed(CELL_PLACEHOLDER),
        }
    }
}

/// Fixed illustrative table used by [`FallbackPolicy::Mock`].
pub fn mock_table() -> CanonicalTable {
    let headers = ["id", "name", "category", "value", "created_at"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let records: [(&str, &str, &str, f64, &str); 5] = [
        ("1", "Sample A", "alpha", 10.5, "2024-01-01"),
        ("2", "Sample B", "beta", 20.0, "2024-01-02"),
        ("3", "Sample C", "alpha", 15.25, "2024-01-03"),
        ("4", "Sample D", "gamma", 8.0, "2024-01-04"),
        ("5", "Sample E", "beta", 12.75, "2024-01-05"),
    ];
    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, (id, name, category, value, created_at))| {
            let mut row = Row::with_row_number(idx + 1);
            row.insert("id", *id);
            row.insert("name", *name);
            row.insert("category", *category);
            row.insert("value", CellValue::Number(*value));
            row.insert("created_at", *created_at);
            row
        })
        .collect::<Vec<_>>();
    CanonicalTable {
        total_rows: rows.len(),
        headers,
        rows,
    }
}
