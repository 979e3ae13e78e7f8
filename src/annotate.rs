//! Synthetic summary rows merged into a preview.
//!
//! Validation and split operations run elsewhere; their textual outcome is
//! attached to the table as one extra row under a dedicated summary column.
//! At most one synthetic row of each kind is live at a time.

use std::fmt;

use log::debug;

use crate::{
    infer::ColumnType,
    preview::PreviewTable,
    schema::ColumnSchema,
    value::{CellValue, Row},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotationKind {
    Validation,
    Split,
}

impl AnnotationKind {
    pub fn header(&self) -> &'static str {
        match self {
            AnnotationKind::Validation => "ValidationSummary",
            AnnotationKind::Split => "SplitSummary",
        }
    }
}

/// Result of a backend validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub issues: usize,
    pub checked_rows: usize,
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            write!(f, "Validation passed: {} row(s) checked", self.checked_rows)
        } else {
            write!(
                f,
                "Validation failed: {} issue(s) across {} row(s)",
                self.issues, self.checked_rows
            )
        }
    }
}

/// Result of a backend train/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOutcome {
    pub train_rows: usize,
    pub test_rows: usize,
}

impl SplitOutcome {
    /// Share of rows assigned to training, `0.0` when there are none.
    pub fn train_ratio(&self) -> f64 {
        let total = self.train_rows + self.test_rows;
        if total == 0 {
            0.0
        } else {
            self.train_rows as f64 / total as f64
        }
    }
}

impl fmt::Display for SplitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let train_pct = self.train_ratio() * 100.0;
        let test_pct = if self.train_rows + self.test_rows == 0 {
            0.0
        } else {
            100.0 - train_pct
        };
        write!(
            f,
            "Split complete: {} train / {} test ({train_pct:.0}/{test_pct:.0})",
            self.train_rows, self.test_rows
        )
    }
}

/// Returns a new table carrying `message` in a synthetic row of `kind`.
///
/// A previous synthetic row of the same kind is removed first. The summary
/// header and its schema entry are added once; every other cell of the new
/// row is blank.
pub fn annotate(table: &PreviewTable, kind: AnnotationKind, message: &str) -> PreviewTable {
    let summary = kind.header();

    let mut rows: Vec<Row> = table
        .rows()
        .iter()
        .filter(|row| row.annotation() != Some(summary))
        .cloned()
        .collect();
    let removed = table.row_count() - rows.len();
    if removed > 0 {
        debug!("Replacing {removed} existing {summary} row(s)");
    }

    let mut headers = table.headers().to_vec();
    if !headers.iter().any(|header| header == summary) {
        headers.push(summary.to_string());
    }

    let mut row = Row::synthetic(summary);
    for header in &headers {
        if header == summary {
            row.insert(header.clone(), message);
        } else {
            row.insert(header.clone(), "");
        }
    }
    rows.push(row);

    let mut schema = table.schema().clone();
    let sample = CellValue::from(message);
    let entry = ColumnSchema {
        name: summary.to_string(),
        column_type: ColumnType::String,
        nullable: true,
        sample_values: if sample.is_blank() { Vec::new() } else { vec![sample] },
    };
    match schema.column_index(summary) {
        Some(idx) => schema.columns[idx] = entry,
        None => schema.columns.push(entry),
    }

    table.clone().with_rows(headers, rows).with_schema(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        normalize::ResponseNormalizer,
        schema::{InferenceOptions, infer_schema},
    };

    fn table() -> PreviewTable {
        let canonical = ResponseNormalizer::default().from_delimited("id,name\n1,Ann\n2,Bob");
        let schema = infer_schema(&canonical.rows, &canonical.headers, &InferenceOptions::default());
        PreviewTable::from_canonical(canonical, schema)
    }

    #[test]
    fn appends_one_blank_row_with_summary_cell() {
        let annotated = annotate(&table(), AnnotationKind::Validation, "ok");
        assert_eq!(annotated.headers(), ["id", "name", "ValidationSummary"]);
        assert_eq!(annotated.row_count(), 3);
        let last = &annotated.rows()[2];
        assert!(last.is_synthetic());
        assert_eq!(last.get("id"), Some(&CellValue::from("")));
        assert_eq!(last.get("ValidationSummary"), Some(&CellValue::from("ok")));
        assert_eq!(annotated.schema().len(), annotated.headers().len());
        assert_eq!(annotated.total_rows(), 2);
    }

    #[test]
    fn reannotating_replaces_row_of_same_kind_only() {
        let first = annotate(&table(), AnnotationKind::Validation, "first");
        let split = annotate(&first, AnnotationKind::Split, "halves");
        let second = annotate(&split, AnnotationKind::Validation, "");

        assert_eq!(
            second.headers(),
            ["id", "name", "ValidationSummary", "SplitSummary"]
        );
        assert_eq!(second.row_count(), 4);
        let synthetic = second
            .rows()
            .iter()
            .filter_map(Row::annotation)
            .collect::<Vec<_>>();
        assert_eq!(synthetic, vec!["SplitSummary", "ValidationSummary"]);
        assert_eq!(second.schema().len(), 4);
        assert_eq!(
            second.schema().column("ValidationSummary").map(|c| c.sample_values.clone()),
            Some(Vec::new())
        );
    }

    #[test]
    fn outcome_messages_read_naturally() {
        let passed = ValidationOutcome {
            passed: true,
            issues: 0,
            checked_rows: 120,
        };
        assert_eq!(passed.to_string(), "Validation passed: 120 row(s) checked");
        let failed = ValidationOutcome {
            passed: false,
            issues: 3,
            checked_rows: 120,
        };
        assert_eq!(failed.to_string(), "Validation failed: 3 issue(s) across 120 row(s)");
        let split = SplitOutcome {
            train_rows: 80,
            test_rows: 20,
        };
        assert_eq!(split.to_string(), "Split complete: 80 train / 20 test (80/20)");
        assert_eq!(SplitOutcome { train_rows: 0, test_rows: 0 }.train_ratio(), 0.0);
    }
}
