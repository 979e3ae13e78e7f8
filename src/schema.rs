//! Column schema model, self-inference, and explicit-schema enrichment.
//!
//! A [`Schema`] is an ordered list of [`ColumnSchema`] entries, index-aligned
//! with the table headers once finalized. It is produced in one of two ways:
//!
//! - **Self-inference** ([`infer_schema`]): per header, collect samples and
//!   classify them. Nullability is judged over a bounded window of leading
//!   rows (default 10). This trades precision for cost: a column whose first
//!   blank cell sits past the window reports `nullable: false`.
//! - **Enrichment** ([`enrich_with_explicit_schema`]): a backend-provided field
//!   list is normalized across its naming conventions, and sample values are
//!   recomputed from loaded rows instead of trusted from the backend.
//!
//! [`resolve_schema`] combines both: any failure of the explicit source falls
//! back to self-inference, so a schema is always produced.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use heck::ToSnakeCase;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{
    error::FetchError,
    infer::{ColumnType, InferOptions, infer_type_with},
    samples::{DEFAULT_MAX_SAMPLES, collect_samples, count_present},
    value::{CellValue, Row},
};

/// Leading rows scanned when judging nullability during self-inference.
pub const DEFAULT_INFERENCE_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(rename = "sampleValues", default)]
    pub sample_values: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnSchema>,
}

/// Where a resolved schema came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOrigin {
    Explicit,
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    pub max_samples: usize,
    /// Rows scanned for nullability; `0` scans every row.
    pub window: usize,
    pub infer: InferOptions,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
            window: DEFAULT_INFERENCE_WINDOW,
            infer: InferOptions::default(),
        }
    }
}

impl Schema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML string")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing schema to JSON string")
    }
}

fn window<'a>(rows: &'a [Row], options: &InferenceOptions) -> &'a [Row] {
    if options.window == 0 {
        rows
    } else {
        &rows[..rows.len().min(options.window)]
    }
}

fn data_rows<'a>(rows: &'a [Row]) -> impl Iterator<Item = &'a Row> {
    rows.iter().filter(|row| !row.is_synthetic())
}

fn infer_nullable(rows: &[Row], column: &str, options: &InferenceOptions) -> bool {
    let scanned = window(rows, options);
    let considered = data_rows(scanned).count();
    count_present(scanned, column) < considered
}

pub fn infer_column(rows: &[Row], name: &str, options: &InferenceOptions) -> ColumnSchema {
    let sample_values = collect_samples(rows, name, options.max_samples);
    let column_type = infer_type_with(&sample_values, &options.infer);
    ColumnSchema {
        name: name.to_string(),
        column_type,
        nullable: infer_nullable(rows, name, options),
        sample_values,
    }
}

/// Builds a schema with one column per header. Deterministic and idempotent
/// for a given row set.
pub fn infer_schema(rows: &[Row], headers: &[String], options: &InferenceOptions) -> Schema {
    let columns = headers
        .iter()
        .map(|header| infer_column(rows, header, options))
        .collect();
    Schema { columns }
}

/// A backend field definition after its naming conventions are normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitField {
    pub name: String,
    pub column_type: Option<ColumnType>,
    pub nullable: Option<bool>,
    pub sample_values: Vec<CellValue>,
}

/// Looks up `wanted` (snake_case) among keys compared after snake-casing.
pub(crate) fn lookup<'a>(object: &'a Map<String, JsonValue>, wanted: &[&str]) -> Option<&'a JsonValue> {
    wanted.iter().find_map(|candidate| {
        object
            .iter()
            .find(|(key, _)| key.to_snake_case() == *candidate)
            .map(|(_, value)| value)
    })
}

fn as_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

impl ExplicitField {
    /// Accepts `name|column_name|Name`, `type|data_type|DataType|Type`,
    /// `nullable|IsRequired` (inverted) and
    /// `sampleValues|samples|SampleValues|Sample`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let name = match lookup(object, &["name", "column_name"])? {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        let column_type = lookup(object, &["type", "data_type"])
            .and_then(JsonValue::as_str)
            .map(ColumnType::from_label);
        let nullable = lookup(object, &["nullable"])
            .and_then(as_bool)
            .or_else(|| lookup(object, &["is_required"]).and_then(as_bool).map(|r| !r));
        let sample_values = match lookup(object, &["sample_values", "samples", "sample"]) {
            Some(JsonValue::Array(items)) => items.iter().map(CellValue::from_json).collect(),
            Some(JsonValue::Null) | None => Vec::new(),
            Some(single) => vec![CellValue::from_json(single)],
        };
        Some(Self {
            name,
            column_type,
            nullable,
            sample_values,
        })
    }
}

/// Extracts field definitions from a schema payload: a bare array, or an
/// object carrying `fields`, `schema` or `columns`. Returns `None` when the
/// payload has none of these shapes.
pub fn parse_explicit_fields(payload: &JsonValue) -> Option<Vec<ExplicitField>> {
    parse_explicit_fields_at(payload, 0)
}

fn parse_explicit_fields_at(payload: &JsonValue, depth: usize) -> Option<Vec<ExplicitField>> {
    match payload {
        JsonValue::Array(items) => Some(items.iter().filter_map(ExplicitField::from_json).collect()),
        JsonValue::Object(object) if depth == 0 => {
            let inner = lookup(object, &["fields", "schema", "columns"])?;
            parse_explicit_fields_at(inner, depth + 1)
        }
        JsonValue::Object(object) => {
            let inner = lookup(object, &["fields", "columns"])?;
            inner.as_array()?;
            parse_explicit_fields_at(inner, depth + 1)
        }
        _ => None,
    }
}

fn enrich_field(field: &ExplicitField, rows: &[Row], options: &InferenceOptions) -> ColumnSchema {
    let sample_values = if rows.is_empty() {
        field
            .sample_values
            .iter()
            .filter(|value| !value.is_blank())
            .fold(Vec::new(), |mut acc: Vec<CellValue>, value| {
                if acc.len() < options.max_samples && !acc.contains(value) {
                    acc.push(value.clone());
                }
                acc
            })
    } else {
        collect_samples(rows, &field.name, options.max_samples)
    };
    let column_type = field
        .column_type
        .unwrap_or_else(|| infer_type_with(&sample_values, &options.infer));
    let nullable = match field.nullable {
        Some(nullable) => nullable,
        None if rows.is_empty() => true,
        None => infer_nullable(rows, &field.name, options),
    };
    ColumnSchema {
        name: field.name.clone(),
        column_type,
        nullable,
        sample_values,
    }
}

/// Merges backend field definitions with locally loaded rows.
///
/// With headers present the result follows header order: each header takes
/// the first explicit field of the same name, or is self-inferred when the
/// backend omitted it. Without headers the explicit field order is kept.
pub fn enrich_with_explicit_schema(
    fields: &[ExplicitField],
    rows: &[Row],
    headers: &[String],
    options: &InferenceOptions,
) -> Schema {
    if headers.is_empty() {
        let columns = fields
            .iter()
            .map(|field| enrich_field(field, rows, options))
            .collect();
        return Schema { columns };
    }

    let columns = headers
        .iter()
        .map(|header| match fields.iter().find(|field| field.name == *header) {
            Some(field) => enrich_field(field, rows, options),
            None => {
                debug!("Column '{header}' missing from explicit schema; inferring locally");
                infer_column(rows, header, options)
            }
        })
        .collect();
    let dropped = fields
        .iter()
        .filter(|field| !headers.contains(&field.name))
        .count();
    if dropped > 0 {
        debug!("Ignored {dropped} explicit field(s) with no matching header");
    }
    Schema { columns }
}

/// Produces a schema from an explicit-schema fetch result, falling back to
/// self-inference on any error or unrecognized payload.
pub fn resolve_schema(
    explicit: Result<JsonValue, FetchError>,
    rows: &[Row],
    headers: &[String],
    options: &InferenceOptions,
) -> (Schema, SchemaOrigin) {
    let payload = match explicit {
        Ok(payload) => payload,
        Err(err) => {
            warn!("Schema source failed ({err}); inferring schema from rows");
            return (infer_schema(rows, headers, options), SchemaOrigin::Inferred);
        }
    };
    match parse_explicit_fields(&payload) {
        Some(fields) => (
            enrich_with_explicit_schema(&fields, rows, headers, options),
            SchemaOrigin::Explicit,
        ),
        None => {
            warn!("Schema payload has no recognizable field list; inferring schema from rows");
            (infer_schema(rows, headers, options), SchemaOrigin::Inferred)
        }
    }
}
