//! Canonicalization of classified payloads into `{headers, rows, totalRows}`.
//!
//! [`ResponseNormalizer::normalize`] is total: every payload yields a
//! [`CanonicalTable`], and unrecognized payloads are reported through
//! [`Normalized::shape`] instead of an error. Guarantees on the result:
//!
//! - `rows.len() <= total_rows`
//! - `headers` is non-empty whenever `rows` is non-empty

use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    delimited::{DEFAULT_DELIMITER, content_lines, parse_header_line, parse_line},
    payload::{Payload, PayloadKind, RowsEnvelope, unwrap_data_entry},
    value::{CellValue, Row},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub total_rows: usize,
}

impl CanonicalTable {
    fn new(headers: Vec<String>, mut rows: Vec<Row>, total_rows: Option<usize>) -> Self {
        if headers.is_empty() && !rows.is_empty() {
            debug!("Dropping {} row(s) without any columns", rows.len());
            rows.clear();
        }
        let total_rows = total_rows.unwrap_or(rows.len()).max(rows.len());
        Self {
            headers,
            rows,
            total_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: CanonicalTable,
    /// Shape that produced the rows. For JSON text this is the shape of the
    /// decoded value.
    pub shape: PayloadKind,
}

impl Normalized {
    pub fn is_recognized(&self) -> bool {
        self.shape != PayloadKind::Unrecognized
    }

    fn unrecognized() -> Self {
        Self {
            table: CanonicalTable::default(),
            shape: PayloadKind::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseNormalizer {
    delimiter: char,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

/// Keys of the first row that has any, in row order.
fn derive_headers(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .find(|row| !row.is_empty())
        .map(|row| row.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

fn rows_from_objects(items: &[JsonValue]) -> Vec<Row> {
    let mut skipped = 0usize;
    let rows = items
        .iter()
        .filter_map(|item| match unwrap_data_entry(item) {
            JsonValue::Object(object) => Some(Row::from_json_object(&object)),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        debug!("Skipped {skipped} non-object row entr(ies)");
    }
    rows
}

impl ResponseNormalizer {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn normalize_value(&self, value: JsonValue) -> Normalized {
        self.normalize(Payload::classify(value))
    }

    pub fn normalize(&self, payload: Payload) -> Normalized {
        self.normalize_at(payload, 0)
    }

    fn normalize_at(&self, payload: Payload, depth: usize) -> Normalized {
        let shape = payload.kind();
        debug!("Normalizing {shape} payload");
        let table = match payload {
            Payload::RowArray(items) => {
                let rows = rows_from_objects(&items);
                CanonicalTable::new(derive_headers(&rows), rows, Some(items.len()))
            }
            Payload::Preview(envelope) | Payload::Data(envelope) => self.from_envelope(envelope),
            Payload::Values { matrix, total_rows } => self.from_matrix(&matrix, total_rows),
            Payload::Content(text) => self.from_delimited(&text),
            Payload::Text(text) => return self.from_text(&text, depth),
            Payload::Unrecognized => {
                debug!("Payload matched no known shape");
                return Normalized::unrecognized();
            }
        };
        Normalized { table, shape }
    }

    fn from_envelope(&self, envelope: RowsEnvelope) -> CanonicalTable {
        let rows = rows_from_objects(&envelope.data);
        let headers = match envelope.headers {
            Some(headers) if !headers.is_empty() => headers,
            _ => derive_headers(&rows),
        };
        CanonicalTable::new(headers, rows, envelope.total_rows)
    }

    /// Row 0 holds headers; later rows are zipped positionally, with missing
    /// trailing positions mapped to null.
    fn from_matrix(&self, matrix: &[JsonValue], total_rows: Option<usize>) -> CanonicalTable {
        let Some((header_row, body)) = matrix.split_first() else {
            return CanonicalTable::new(Vec::new(), Vec::new(), total_rows);
        };
        let headers: Vec<String> = header_row
            .as_array()
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| CellValue::from_json(cell).as_display().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let rows = body
            .iter()
            .filter_map(JsonValue::as_array)
            .map(|values| {
                let mut row = Row::new();
                for (idx, header) in headers.iter().enumerate() {
                    let value = values
                        .get(idx)
                        .map(CellValue::from_json)
                        .unwrap_or(CellValue::Null);
                    row.insert(header.clone(), value);
                }
                row
            })
            .collect();
        CanonicalTable::new(headers, rows, total_rows)
    }

    /// First non-empty line is the header; each later line becomes a row
    /// tagged with its 1-based row number. Positions past the end of a line
    /// become empty strings.
    pub fn from_delimited(&self, text: &str) -> CanonicalTable {
        let mut lines = content_lines(text);
        let Some(header_line) = lines.next() else {
            return CanonicalTable::default();
        };
        let headers = parse_header_line(header_line, self.delimiter);
        let rows = lines
            .enumerate()
            .map(|(idx, line)| {
                let fields = parse_line(line, self.delimiter);
                let mut row = Row::with_row_number(idx + 1);
                for (pos, header) in headers.iter().enumerate() {
                    let value = fields.get(pos).cloned().unwrap_or_default();
                    row.insert(header.clone(), value);
                }
                row
            })
            .collect();
        CanonicalTable::new(headers, rows, None)
    }

    /// JSON-looking text is decoded and normalized once more; anything else,
    /// including text that fails to decode, is read as delimited text.
    fn from_text(&self, text: &str, depth: usize) -> Normalized {
        let trimmed = text.trim_start();
        if depth == 0 && (trimmed.starts_with('{') || trimmed.starts_with('[')) {
            match serde_json::from_str::<JsonValue>(trimmed) {
                Ok(value @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
                    return self.normalize_at(Payload::classify(value), depth + 1);
                }
                Ok(_) => debug!("JSON text decoded to a scalar; reading as delimited text"),
                Err(err) => debug!("JSON decode failed ({err}); reading as delimited text"),
            }
        }
        Normalized {
            table: self.from_delimited(text),
            shape: PayloadKind::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_array_derives_headers_from_first_non_empty_row() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize_value(json!([{}, {"a": 1, "b": "x"}, {"a": 2}]));
        assert_eq!(result.shape, PayloadKind::RowArray);
        assert_eq!(result.table.headers, vec!["a", "b"]);
        assert_eq!(result.table.rows.len(), 3);
        assert_eq!(result.table.total_rows, 3);
    }

    #[test]
    fn envelope_total_rows_may_exceed_row_count_but_not_undercut_it() {
        let normalizer = ResponseNormalizer::default();
        let paged = normalizer.normalize_value(json!({"data": [{"a": 1}], "totalRows": 500}));
        assert_eq!(paged.table.total_rows, 500);
        let undercut = normalizer.normalize_value(json!({"data": [{"a": 1}, {"a": 2}], "totalRows": 1}));
        assert_eq!(undercut.table.total_rows, 2);
    }

    #[test]
    fn empty_header_list_is_replaced_when_rows_exist() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize_value(json!({"data": [{"z": 1}], "headers": []}));
        assert_eq!(result.table.headers, vec!["z"]);
    }

    #[test]
    fn matrix_rows_pad_missing_positions_with_null() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize_value(json!({"values": [["a", "b"], [1], [2, "y", "extra"]]}));
        let rows = &result.table.rows;
        assert_eq!(rows[0].get("b"), Some(&CellValue::Null));
        assert_eq!(rows[1].get("b"), Some(&CellValue::from("y")));
        assert_eq!(rows[1].len(), 2);
        assert_eq!(result.table.total_rows, 2);
    }

    #[test]
    fn delimited_rows_default_short_lines_to_empty_strings() {
        let normalizer = ResponseNormalizer::default();
        let table = normalizer.from_delimited("a,b,c\n1\n\n2,3,4,5\n");
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0].get("c"), Some(&CellValue::from("")));
        assert_eq!(table.rows[1].row_number(), Some(2));
        assert_eq!(table.rows[1].get("c"), Some(&CellValue::from("4")));
    }

    #[test]
    fn json_text_is_decoded_once() {
        let normalizer = ResponseNormalizer::default();
        let inner = json!({"content": "x\n1"}).to_string();
        let result = normalizer.normalize(Payload::Text(inner));
        assert_eq!(result.shape, PayloadKind::Content);
        assert_eq!(result.table.rows.len(), 1);

        let scalars = normalizer.normalize(Payload::Text("[1, 2]".to_string()));
        assert_eq!(scalars.shape, PayloadKind::RowArray);
        assert!(scalars.table.rows.is_empty());
        assert_eq!(scalars.table.total_rows, 2);

        let plain = normalizer.normalize(Payload::Text("42".to_string()));
        assert_eq!(plain.shape, PayloadKind::Text);
        assert_eq!(plain.table.headers, vec!["42"]);
    }

    #[test]
    fn broken_json_text_reads_as_delimited() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize(Payload::Text("[broken,json\n1,2".to_string()));
        assert_eq!(result.shape, PayloadKind::Text);
        assert_eq!(result.table.headers, vec!["[broken", "json"]);
        assert_eq!(result.table.rows.len(), 1);
    }

    #[test]
    fn rows_without_columns_are_dropped() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize_value(json!([{}, {}]));
        assert!(result.table.headers.is_empty());
        assert!(result.table.rows.is_empty());
        assert_eq!(result.table.total_rows, 2);

        let blank_header = normalizer.from_delimited(",,\n1,2,3");
        assert!(blank_header.rows.is_empty());
    }

    #[test]
    fn unrecognized_payload_yields_empty_table() {
        let normalizer = ResponseNormalizer::default();
        let result = normalizer.normalize_value(json!({"status": "ok"}));
        assert!(!result.is_recognized());
        assert_eq!(result.table, CanonicalTable::default());
    }
}
