//! Column type classification from sample values.
//!
//! Candidates are checked in a fixed precedence: boolean, number, date,
//! category, string. A candidate only wins when every sample satisfies it,
//! so all samples are always examined.

use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Distinct-value ceiling for a textual column to count as categorical.
pub const CATEGORY_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Number,
    Date,
    Category,
    #[default]
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Category => "category",
            ColumnType::String => "string",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["boolean", "number", "date", "category", "string"]
    }

    /// Maps a backend type label onto a column type; unknown labels become
    /// [`ColumnType::String`].
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(ColumnType::String)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "number" | "numeric" | "integer" | "int" | "int64" | "bigint" | "float" | "double"
            | "decimal" | "real" => Ok(ColumnType::Number),
            "date" | "datetime" | "date-time" | "timestamp" => Ok(ColumnType::Date),
            "category" | "categorical" | "enum" => Ok(ColumnType::Category),
            "string" | "text" | "varchar" | "str" | "object" => Ok(ColumnType::String),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                ColumnType::variants().join(", ")
            )),
        }
    }
}

/// How string samples are recognized as dates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "kebab-case")]
pub enum DateDetection {
    /// ISO-8601 pattern only.
    #[default]
    Strict,
    /// ISO-8601 pattern, then common day/month layouts and RFC 2822.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOptions {
    pub date_detection: DateDetection,
    pub category_threshold: usize,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            date_detection: DateDetection::Strict,
            category_threshold: CATEGORY_THRESHOLD,
        }
    }
}

pub fn infer_type(samples: &[CellValue]) -> ColumnType {
    infer_type_with(samples, &InferOptions::default())
}

pub fn infer_type_with(samples: &[CellValue], options: &InferOptions) -> ColumnType {
    if samples.is_empty() {
        return ColumnType::String;
    }
    let mut candidate = TypeCandidate::new();
    for sample in samples {
        candidate.update(sample, options.date_detection);
    }
    candidate.decide(options.category_threshold)
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_boolean: bool,
    possible_number: bool,
    possible_date: bool,
    distinct: Vec<String>,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_boolean: true,
            possible_number: true,
            possible_date: true,
            distinct: Vec::new(),
        }
    }

    fn update(&mut self, value: &CellValue, date_detection: DateDetection) {
        if self.possible_boolean && !is_boolean_literal(value) {
            self.possible_boolean = false;
        }
        if self.possible_number && !is_finite_number(value) {
            self.possible_number = false;
        }
        if self.possible_date && !is_date_like(value, date_detection) {
            self.possible_date = false;
        }
        let text = value.as_display();
        if !self.distinct.iter().any(|seen| *seen == text) {
            self.distinct.push(text.into_owned());
        }
    }

    fn decide(&self, category_threshold: usize) -> ColumnType {
        if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_number {
            ColumnType::Number
        } else if self.possible_date {
            ColumnType::Date
        } else if self.distinct.len() <= category_threshold {
            ColumnType::Category
        } else {
            ColumnType::String
        }
    }
}

/// `true`/`false` as JSON booleans or case-insensitive text. Bare `1`/`0`
/// are numbers, not booleans.
pub fn is_boolean_literal(value: &CellValue) -> bool {
    match value {
        CellValue::Boolean(_) => true,
        CellValue::String(s) => {
            let trimmed = s.trim();
            trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false")
        }
        _ => false,
    }
}

pub fn is_finite_number(value: &CellValue) -> bool {
    match value {
        CellValue::Number(f) => f.is_finite(),
        CellValue::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
        }
        _ => false,
    }
}

pub fn is_date_like(value: &CellValue, date_detection: DateDetection) -> bool {
    let CellValue::String(s) = value else {
        return false;
    };
    let trimmed = s.trim();
    if is_iso_date(trimmed) {
        return true;
    }
    match date_detection {
        DateDetection::Strict => false,
        DateDetection::Lenient => parses_as_common_date(trimmed),
    }
}

fn iso_date_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?)?$").ok()
        })
        .as_ref()
}

/// `YYYY-MM-DD`, optionally followed by `THH:MM:SS`, fractional seconds and
/// a `Z` or `±HH:MM` offset.
pub fn is_iso_date(value: &str) -> bool {
    iso_date_pattern().is_some_and(|pattern| pattern.is_match(value))
}

fn parses_as_common_date(value: &str) -> bool {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
        || DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
}
