//! Bounded, order-preserving sample collection for a single column.

use crate::value::{CellValue, Row};

pub const DEFAULT_MAX_SAMPLES: usize = 5;

/// Returns up to `max_samples` distinct non-blank values of `column`, in the
/// order they first appear.
///
/// The scan stops as soon as the limit is reached, so the cost is bounded by
/// the position of the last new value rather than by the number of rows.
/// Synthetic annotation rows are skipped.
pub fn collect_samples<'a, I>(rows: I, column: &str, max_samples: usize) -> Vec<CellValue>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut samples: Vec<CellValue> = Vec::with_capacity(max_samples);
    if max_samples == 0 {
        return samples;
    }
    for row in rows {
        if row.is_synthetic() {
            continue;
        }
        let Some(value) = row.get(column) else {
            continue;
        };
        if value.is_blank() || samples.contains(value) {
            continue;
        }
        samples.push(value.clone());
        if samples.len() >= max_samples {
            break;
        }
    }
    samples
}

/// Number of rows in `rows` that hold a non-blank value for `column`.
pub fn count_present<'a, I>(rows: I, column: &str) -> usize
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .filter(|row| !row.is_synthetic())
        .filter(|row| row.get(column).is_some_and(|value| !value.is_blank()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows_for(values: &[Option<&str>]) -> Vec<Row> {
        values
            .iter()
            .map(|value| {
                let mut row = Row::new();
                if let Some(v) = value {
                    row.insert("col", *v);
                }
                row
            })
            .collect()
    }

    #[test]
    fn skips_blank_and_absent_values_and_deduplicates() {
        let rows = rows_for(&[Some("a"), None, Some(""), Some("b"), Some("a"), Some("c")]);
        let samples = collect_samples(&rows, "col", 5);
        assert_eq!(
            samples,
            vec![CellValue::from("a"), CellValue::from("b"), CellValue::from("c")]
        );
    }

    #[test]
    fn stops_at_limit() {
        let rows = rows_for(&[Some("1"), Some("2"), Some("3"), Some("4")]);
        let samples = collect_samples(&rows, "col", 2);
        assert_eq!(samples, vec![CellValue::from("1"), CellValue::from("2")]);
        assert!(collect_samples(&rows, "col", 0).is_empty());
    }

    #[test]
    fn numbers_and_strings_are_distinct_values() {
        let mut first = Row::new();
        first.insert("col", CellValue::Number(1.0));
        let mut second = Row::new();
        second.insert("col", "1");
        let samples = collect_samples([&first, &second], "col", 5);
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn count_present_ignores_blank_cells() {
        let rows = rows_for(&[Some("x"), None, Some(""), Some("y")]);
        assert_eq!(count_present(&rows, "col"), 2);
    }

    proptest! {
        #[test]
        fn samples_are_bounded_distinct_and_non_blank(
            values in proptest::collection::vec(proptest::option::of("[a-d]{0,1}"), 0..40),
            limit in 0usize..8
        ) {
            let rows = values
                .iter()
                .map(|value| {
                    let mut row = Row::new();
                    if let Some(v) = value {
                        row.insert("col", v.as_str());
                    }
                    row
                })
                .collect::<Vec<_>>();
            let samples = collect_samples(&rows, "col", limit);
            prop_assert!(samples.len() <= limit);
            prop_assert!(samples.iter().all(|s| !s.is_blank()));
            for (idx, sample) in samples.iter().enumerate() {
                prop_assert!(!samples[..idx].contains(sample));
            }

            let mut expected: Vec<CellValue> = Vec::new();
            for value in values.iter().flatten() {
                let cell = CellValue::from(value.as_str());
                if !cell.is_blank() && !expected.contains(&cell) {
                    expected.push(cell);
                }
            }
            expected.truncate(limit);
            prop_assert_eq!(samples, expected);
        }
    }
}
