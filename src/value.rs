//! Cell values and rows of the canonical preview table.
//!
//! A [`Row`] is an ordered mapping from column name to [`CellValue`]. Rows
//! produced from delimited text carry a 1-based row number, which is
//! metadata rather than a data column: it never shows up in [`Row::keys`]
//! and is skipped by sampling and type inference.

use std::{borrow::Cow, fmt};

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value as JsonValue};

/// Reserved wire name of the row-number metadata field.
pub const ROW_NUMBER_FIELD: &str = "rowNumber";

/// Text shown for a cell that is absent or null.
pub const CELL_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl CellValue {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Boolean(*b),
            JsonValue::Number(n) => Self::from_json_number(n),
            JsonValue::String(s) => CellValue::String(s.clone()),
            // Nested structures are not meaningful cell values; keep their text.
            other => CellValue::String(other.to_string()),
        }
    }

    /// Integers beyond 2^53 have no exact `f64`; they keep their digits as text.
    fn from_json_number(n: &serde_json::Number) -> Self {
        const MAX_EXACT: u64 = 1 << 53;
        let exact = match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => u <= MAX_EXACT,
            (None, Some(i)) => i.unsigned_abs() <= MAX_EXACT,
            _ => true,
        };
        match n.as_f64() {
            Some(f) if exact => CellValue::Number(f),
            _ => CellValue::String(n.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Boolean(b) => JsonValue::Bool(*b),
            CellValue::Number(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::String(s) => JsonValue::String(s.clone()),
        }
    }

    /// Null or empty string. Whitespace-only strings count as values.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Boolean(b) => Cow::Owned(b.to_string()),
            CellValue::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Cow::Owned((*f as i64).to_string())
                } else {
                    Cow::Owned(f.to_string())
                }
            }
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(CellValue::from_json(&value))
    }
}

/// One record of the canonical table.
///
/// Cells keep insertion order. Inserting an existing name replaces its value
/// in place, so a row never holds the same name twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    row_number: Option<usize>,
    /// Summary column owned by an engine-appended row.
    annotation: Option<String>,
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_number(row_number: usize) -> Self {
        Self {
            row_number: Some(row_number),
            ..Self::default()
        }
    }

    pub(crate) fn synthetic(annotation: impl Into<String>) -> Self {
        Self {
            annotation: Some(annotation.into()),
            ..Self::default()
        }
    }

    /// Builds a row from a JSON object, lifting a numeric `rowNumber` key into
    /// metadata.
    pub fn from_json_object(object: &Map<String, JsonValue>) -> Self {
        let mut row = Row::new();
        for (key, value) in object {
            if key == ROW_NUMBER_FIELD {
                row.row_number = value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .or(row.row_number);
                continue;
            }
            row.insert(key.clone(), CellValue::from_json(value));
        }
        row
    }

    pub fn row_number(&self) -> Option<usize> {
        self.row_number
    }

    pub fn is_synthetic(&self) -> bool {
        self.annotation.is_some()
    }

    /// Summary column of a synthetic row.
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.cells.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.cells.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in insertion order, excluding row-number metadata.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Display text for `name`; absent and null cells yield [`CELL_PLACEHOLDER`].
    pub fn cell_text(&self, name: &str) -> Cow<'_, str> {
        match self.get(name) {
            None | Some(CellValue::Null) => Cow::Borrowed(CELL_PLACEHOLDER),
            Some(value) => value.as_display(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::with_capacity(self.cells.len() + 1);
        if let Some(number) = self.row_number {
            object.insert(ROW_NUMBER_FIELD.to_string(), JsonValue::from(number));
        }
        for (key, value) in &self.cells {
            object.insert(key.clone(), value.to_json());
        }
        JsonValue::Object(object)
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let extra = usize::from(self.row_number.is_some());
        let mut map = serializer.serialize_map(Some(self.cells.len() + extra))?;
        if let Some(number) = self.row_number {
            map.serialize_entry(ROW_NUMBER_FIELD, &number)?;
        }
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
