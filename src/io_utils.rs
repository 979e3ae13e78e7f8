//! I/O helpers for payload files and table export.
//!
//! - **Encoding**: input bytes are decoded via `encoding_rs`, defaulting to
//!   UTF-8; undecodable input is an error rather than silently replaced.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Payloads**: a file holding JSON is returned as its decoded value; any
//!   other text is returned as a JSON string so the normalizer can read it as
//!   delimited text.
//! - **Export**: CSV output uses `QuoteStyle::Always` for round-trip safety.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, ensure};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use serde_json::Value as JsonValue;

use crate::{preview::PreviewTable, value::CellValue};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading payload from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("Opening payload file {path:?}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading payload file {path:?}"))?;
    }
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding payload {path:?}"))
}

/// Text holding a JSON object or array yields the parsed value. Anything
/// else, JSON scalars included, is kept as a JSON string of delimited text.
pub fn text_to_payload(text: String) -> JsonValue {
    match serde_json::from_str::<JsonValue>(&text) {
        Ok(value @ (JsonValue::Object(_) | JsonValue::Array(_))) => value,
        _ => JsonValue::String(text),
    }
}

pub fn read_payload(path: &Path, encoding: &'static Encoding) -> Result<JsonValue> {
    read_text(path, encoding).map(text_to_payload)
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: char) -> Result<csv::Writer<Box<dyn Write>>> {
    ensure!(
        delimiter.is_ascii(),
        "CSV output delimiter must be a single ASCII character"
    );
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter as u8)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(open_output(path)?))
}

/// Writes headers then every row; absent and null cells become empty fields.
pub fn write_table_csv<W: Write>(writer: &mut csv::Writer<W>, table: &PreviewTable) -> Result<()> {
    writer
        .write_record(table.headers())
        .context("Writing CSV headers")?;
    for (idx, row) in table.rows().iter().enumerate() {
        let record = table.headers().iter().map(|header| match row.get(header) {
            None | Some(CellValue::Null) => String::new(),
            Some(value) => value.as_display().into_owned(),
        });
        writer
            .write_record(record)
            .with_context(|| format!("Writing CSV row {}", idx + 1))?;
    }
    writer.flush().context("Flushing CSV output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::ResponseNormalizer, schema::Schema};
    use serde_json::json;

    #[test]
    fn unknown_encoding_label_is_an_error() {
        assert!(resolve_encoding(Some("not-a-charset")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some(" windows-1252 ")).unwrap().name(),
            "windows-1252"
        );
    }

    #[test]
    fn legacy_bytes_decode_with_matching_encoding() {
        let latin = resolve_encoding(Some("windows-1252")).unwrap();
        assert_eq!(decode_bytes(b"caf\xe9", latin).unwrap(), "café");
        assert!(decode_bytes(b"caf\xe9", UTF_8).is_err());
    }

    #[test]
    fn non_json_text_becomes_string_payload() {
        assert_eq!(text_to_payload("[1]".into()), json!([1]));
        assert_eq!(text_to_payload("a,b\n1,2".into()), json!("a,b\n1,2"));
    }

    #[test]
    fn scalar_json_text_stays_delimited() {
        assert_eq!(text_to_payload("123".into()), json!("123"));
        assert_eq!(text_to_payload("true\n".into()), json!("true\n"));

        let normalized =
            ResponseNormalizer::default().normalize_value(text_to_payload("123".into()));
        assert!(normalized.is_recognized());
        assert_eq!(normalized.table.headers, vec!["123".to_string()]);
        assert!(normalized.table.rows.is_empty());
    }

    #[test]
    fn csv_export_blanks_missing_cells() {
        let canonical = ResponseNormalizer::default()
            .normalize_value(json!([{"id": 1, "name": "Ann"}, {"id": 2}]))
            .table;
        let table = PreviewTable::from_canonical(canonical, Schema::default());
        let mut writer = csv::WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());
        write_table_csv(&mut writer, &table).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "\"id\",\"name\"\n\"1\",\"Ann\"\n\"2\",\"\"\n");
    }
}
