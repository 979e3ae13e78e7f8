//! Structural classification of preview payloads.
//!
//! Backends answer preview requests in several shapes. [`Payload::classify`]
//! maps an untyped JSON value onto exactly one variant using a fixed
//! precedence; the order matters because a payload can satisfy more than one
//! shape (an object with both `data` and `values`, for instance).
//!
//! Object keys are matched after snake-casing, so `TotalRows`, `totalRows`
//! and `total_rows` are the same key.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::{error::FetchError, paginate::ServerPagination, schema::lookup};

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A bare array of row objects.
    RowArray(Vec<JsonValue>),
    /// `{preview: {data: [...], headers?, totalRows?}}`.
    Preview(RowsEnvelope),
    /// `{data: [...], headers?, totalRows?}`.
    Data(RowsEnvelope),
    /// `{values: [[header...], [value...], ...]}`.
    Values {
        matrix: Vec<JsonValue>,
        total_rows: Option<usize>,
    },
    /// `{content: "delimited text"}`.
    Content(String),
    /// A string payload: JSON text or delimited text.
    Text(String),
    Unrecognized,
}

/// Row data wrapped with optional headers and a logical row count.
#[derive(Debug, Clone, PartialEq)]
pub struct RowsEnvelope {
    pub data: Vec<JsonValue>,
    pub headers: Option<Vec<String>>,
    pub total_rows: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    RowArray,
    Preview,
    Data,
    Values,
    Content,
    Text,
    Unrecognized,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayloadKind::RowArray => "row array",
            PayloadKind::Preview => "preview envelope",
            PayloadKind::Data => "data envelope",
            PayloadKind::Values => "value matrix",
            PayloadKind::Content => "delimited content",
            PayloadKind::Text => "text",
            PayloadKind::Unrecognized => "unrecognized",
        };
        f.write_str(label)
    }
}

pub(crate) fn as_count(value: &JsonValue) -> Option<usize> {
    match value {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| usize::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn header_list(value: &JsonValue) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

impl RowsEnvelope {
    fn from_object(object: &Map<String, JsonValue>) -> Option<Self> {
        let data = lookup(object, &["data"])?.as_array()?.clone();
        Some(Self {
            data,
            headers: lookup(object, &["headers"]).and_then(header_list),
            total_rows: lookup(object, &["total_rows"]).and_then(as_count),
        })
    }
}

impl Payload {
    pub fn classify(value: JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => Payload::RowArray(items),
            JsonValue::String(text) => Payload::Text(text),
            JsonValue::Object(object) => Self::classify_object(&object),
            _ => Payload::Unrecognized,
        }
    }

    fn classify_object(object: &Map<String, JsonValue>) -> Self {
        if let Some(envelope) = lookup(object, &["preview"])
            .and_then(JsonValue::as_object)
            .and_then(RowsEnvelope::from_object)
        {
            return Payload::Preview(envelope);
        }
        if let Some(envelope) = RowsEnvelope::from_object(object) {
            return Payload::Data(envelope);
        }
        if let Some(matrix) = lookup(object, &["values"]).and_then(JsonValue::as_array) {
            return Payload::Values {
                matrix: matrix.clone(),
                total_rows: lookup(object, &["total_rows"]).and_then(as_count),
            };
        }
        if let Some(content) = lookup(object, &["content"]).and_then(JsonValue::as_str) {
            return Payload::Content(content.to_string());
        }
        Payload::Unrecognized
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::RowArray(_) => PayloadKind::RowArray,
            Payload::Preview(_) => PayloadKind::Preview,
            Payload::Data(_) => PayloadKind::Data,
            Payload::Values { .. } => PayloadKind::Values,
            Payload::Content(_) => PayloadKind::Content,
            Payload::Text(_) => PayloadKind::Text,
            Payload::Unrecognized => PayloadKind::Unrecognized,
        }
    }
}

impl From<JsonValue> for Payload {
    fn from(value: JsonValue) -> Self {
        Payload::classify(value)
    }
}

/// One server-driven page: `{Headers, Data: [{Data: {...}}], Pagination}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedPreview {
    pub headers: Vec<String>,
    pub rows: Vec<JsonValue>,
    pub pagination: ServerPagination,
}

impl PagedPreview {
    /// Normalizes the PascalCase wire shape. Row entries wrapped as
    /// `{Data: {...}}` are unwrapped; bare objects are accepted as-is.
    pub fn from_wire(value: &JsonValue) -> Result<Self, FetchError> {
        let object = value
            .as_object()
            .ok_or_else(|| FetchError::InvalidPayload("paged preview must be an object".into()))?;
        let rows = lookup(object, &["data"])
            .and_then(JsonValue::as_array)
            .ok_or_else(|| FetchError::InvalidPayload("paged preview has no Data array".into()))?
            .iter()
            .map(unwrap_data_entry)
            .collect::<Vec<_>>();
        let headers = lookup(object, &["headers"])
            .and_then(header_list)
            .unwrap_or_default();
        let pagination = lookup(object, &["pagination"])
            .and_then(JsonValue::as_object)
            .ok_or_else(|| FetchError::InvalidPayload("paged preview has no Pagination".into()))?;
        let field = |name: &str| {
            lookup(pagination, &[name]).and_then(as_count).ok_or_else(|| {
                FetchError::InvalidPayload(format!("Pagination is missing '{name}'"))
            })
        };
        Ok(Self {
            headers,
            rows,
            pagination: ServerPagination {
                total_rows: field("total_rows")?,
                current_page: field("current_page")?,
                total_pages: field("total_pages")?,
            },
        })
    }
}

/// `{Data: {...}}` becomes `{...}`; anything else is returned unchanged.
pub(crate) fn unwrap_data_entry(entry: &JsonValue) -> JsonValue {
    if let Some(object) = entry.as_object()
        && object.len() == 1
        && let Some(inner) = lookup(object, &["data"]).filter(|inner| inner.is_object())
    {
        return inner.clone();
    }
    entry.clone()
}
