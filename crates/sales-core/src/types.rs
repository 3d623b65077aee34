//! Core data types for sales records.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Record`] - One transactional row (date, store, product, amount, ...)
//! - [`Dataset`] - The decoded content of one payload: records plus summary fields

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{DataError, Result};
use crate::unit::AcquisitionUnit;

/// Name of the field used to place a record in time.
pub const DATE_FIELD: &str = "date";

/// Fields consulted, in order, when `date` is absent.
const FALLBACK_DATE_FIELDS: [&str; 2] = ["invoice_date", "create_date"];

/// Accepted day formats for the leading token of a date field.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Name of the record array inside an object-shaped payload.
pub const DETAILS_FIELD: &str = "details";

/// An opaque transactional row.
///
/// Only the `date` field is interpreted by the pipeline itself; everything else is
/// addressed by field name from caller-supplied filters and sort keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the record.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the record's fields.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns every field value.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Parses the record's date.
    ///
    /// Reads `date`, falling back to `invoice_date` then `create_date`. Only the leading
    /// token is parsed (anything after whitespace or a `T` is a time component), as
    /// `YYYY-MM-DD`, `DD.MM.YYYY` or `DD/MM/YYYY`. Day and month may be unpadded.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = std::iter::once(DATE_FIELD)
            .chain(FALLBACK_DATE_FIELDS)
            .find_map(|field| {
                self.0
                    .get(field)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })?;
        let day = raw.split_whitespace().next()?.split('T').next()?;
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(day, format).ok())
    }

    /// Reads a numeric field for aggregation.
    ///
    /// Numbers and numeric strings are converted; missing or unparsable values count as zero.
    #[must_use]
    pub fn number(&self, field: &str) -> f64 {
        match self.0.get(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Returns the string form of a field.
    ///
    /// Strings are returned as-is; other values use their JSON text.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(value_text)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// String form of a JSON value: raw for strings, JSON text otherwise.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The decoded content of one payload.
///
/// Records are held in a shared slice so a dataset can be cloned out of the cache,
/// handed to a view, and kept alive by the renderer without copying rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Transactional rows.
    pub records: Arc<[Record]>,
    /// Summary fields that accompanied the rows (totals, generation time, ...).
    #[serde(default)]
    pub summary: Map<String, Value>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::from_records(Vec::new())
    }
}

impl Dataset {
    /// Creates a dataset without summary fields.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records: Arc::from(records),
            summary: Map::new(),
        }
    }

    /// Builds a dataset from decoded payload JSON.
    ///
    /// Accepts either a bare array of records, or an object whose `details` array holds the
    /// records and whose remaining keys become the summary.
    ///
    /// # Errors
    /// Returns [`DataError::Decode`] if the JSON has neither shape or a row is not an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(rows) => Ok(Self::from_records(parse_rows(rows)?)),
            Value::Object(mut map) => {
                let records = match map.remove(DETAILS_FIELD) {
                    Some(Value::Array(rows)) => parse_rows(rows)?,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(DataError::Decode(format!(
                            "`{DETAILS_FIELD}` must be an array, found {}",
                            json_kind(&other)
                        )));
                    }
                };
                Ok(Self {
                    records: Arc::from(records),
                    summary: map,
                })
            }
            other => Err(DataError::Decode(format!(
                "payload must be an array or object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Derives the subset of records that fall inside `unit`, keeping the summary.
    ///
    /// Records without a parsable date are excluded.
    #[must_use]
    pub fn subset(&self, unit: AcquisitionUnit) -> Self {
        let records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.date().is_some_and(|d| unit.contains(d)))
            .cloned()
            .collect();
        Self {
            records: Arc::from(records),
            summary: self.summary.clone(),
        }
    }

    /// Concatenates the records of several datasets, in order.
    #[must_use]
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Self>) -> Self {
        let records: Vec<Record> = parts
            .into_iter()
            .flat_map(|d| d.records.iter().cloned())
            .collect();
        Self::from_records(records)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Record>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(map) => Ok(Record(map)),
            other => Err(DataError::Decode(format!(
                "row {i} must be an object, found {}",
                json_kind(&other)
            ))),
        })
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
