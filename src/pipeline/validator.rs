//! Row validator - checks one raw row against the field specs
//!
//! Pure with respect to its inputs: a row either becomes a coerced
//! `ValidatedRow` or a list of `RowError`s, never both. Errors are
//! data; the caller decides whether to accumulate or abort.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::collections::HashMap;

use crate::pipeline::error::{ErrorKind, RowError};
use crate::pipeline::parser::RawRow;
use crate::pipeline::spec::{DataType, FieldSpec};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static UID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Raw values accepted as boolean true (case-insensitive)
const TRUE_VALUES: &[&str] = &["true", "1", "yes", "si", "sí"];

/// A row that passed validation, values coerced to their proper types
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub number: usize,
    pub values: JsonMap<String, JsonValue>,
}

/// Map from lowercased header name to column index
#[derive(Debug, Clone)]
pub struct HeaderMap(HashMap<String, usize>);

impl HeaderMap {
    pub fn new(headers: &[String]) -> Self {
        let mut map = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            // First occurrence wins on duplicate headers
            map.entry(header.trim().to_lowercase()).or_insert(index);
        }
        Self(map)
    }

    /// Get a field value from a row, empty cells filtered out
    pub fn get<'a>(&self, row: &'a RawRow, field: &str) -> Option<&'a str> {
        self.0
            .get(&field.to_lowercase())
            .and_then(|&index| row.values.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Validator for one field spec set, patterns compiled up front
pub struct RowValidator<'a> {
    specs: &'a [FieldSpec],
    headers: HeaderMap,
    patterns: HashMap<String, Regex>,
}

impl<'a> RowValidator<'a> {
    pub fn new(specs: &'a [FieldSpec], headers: &[String]) -> Self {
        let mut patterns = HashMap::new();
        for spec in specs {
            if let Some(pattern) = &spec.rules.pattern {
                // Uncompilable declared patterns are skipped
                if let Ok(regex) = Regex::new(pattern) {
                    patterns.insert(spec.name.clone(), regex);
                }
            }
        }
        Self {
            specs,
            headers: HeaderMap::new(headers),
            patterns,
        }
    }

    /// Validate and coerce one row.
    ///
    /// Unknown columns are ignored; the result contains only fields
    /// known to the spec set.
    pub fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<RowError>> {
        let mut errors = Vec::new();
        let mut values = JsonMap::new();

        for spec in self.specs {
            match self.headers.get(row, &spec.name) {
                None => {
                    if spec.required {
                        errors.push(RowError::field(
                            row.number,
                            &spec.name,
                            ErrorKind::RequiredField,
                            format!("the field '{}' is required", spec.name),
                            None,
                        ));
                    } else {
                        values.insert(spec.name.clone(), JsonValue::Null);
                    }
                }
                Some(value) => {
                    let field_errors = self.check_value(spec, value, row.number);
                    if field_errors.is_empty() {
                        values.insert(spec.name.clone(), coerce(spec, value));
                    } else {
                        errors.extend(field_errors);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(ValidatedRow {
                number: row.number,
                values,
            })
        } else {
            Err(errors)
        }
    }

    fn check_value(&self, spec: &FieldSpec, value: &str, row: usize) -> Vec<RowError> {
        let mut errors = Vec::new();
        let rules = &spec.rules;
        let err = |kind, message: String| {
            RowError::field(row, &spec.name, kind, message, Some(value.to_string()))
        };

        match spec.data_type {
            DataType::ShortText | DataType::LongText => {
                let length = value.chars().count();
                if let Some(min) = rules.min_length {
                    if length < min {
                        errors.push(err(
                            ErrorKind::MinLength,
                            format!("'{}' must be at least {} characters", spec.name, min),
                        ));
                    }
                }
                if let Some(max) = rules.max_length {
                    if length > max {
                        errors.push(err(
                            ErrorKind::MaxLength,
                            format!("'{}' must be at most {} characters", spec.name, max),
                        ));
                    }
                }
            }
            DataType::Email => {
                if !EMAIL_RE.is_match(value) {
                    errors.push(err(
                        ErrorKind::InvalidEmail,
                        format!("'{}' must be a valid email address", spec.name),
                    ));
                }
            }
            DataType::Integer | DataType::BigInteger => match value.parse::<i64>() {
                Err(_) => errors.push(err(
                    ErrorKind::InvalidInteger,
                    format!("'{}' must be a whole number", spec.name),
                )),
                Ok(number) => errors.extend(check_range(spec, number as f64, value, row)),
            },
            DataType::Float | DataType::Decimal => match value.parse::<f64>() {
                Err(_) => errors.push(err(
                    ErrorKind::FormatError,
                    format!("'{}' must be a number", spec.name),
                )),
                Ok(number) => errors.extend(check_range(spec, number, value, row)),
            },
            DataType::Boolean => {}
            DataType::Date => {
                if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                    errors.push(err(
                        ErrorKind::FormatError,
                        format!("'{}' must be a date in YYYY-MM-DD format", spec.name),
                    ));
                }
            }
            DataType::DateTime => {
                let ok = DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok();
                if !ok {
                    errors.push(err(
                        ErrorKind::FormatError,
                        format!("'{}' must be a date-time (RFC 3339 or YYYY-MM-DD HH:MM:SS)", spec.name),
                    ));
                }
            }
            DataType::Time => {
                let ok = NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok()
                    || NaiveTime::parse_from_str(value, "%H:%M").is_ok();
                if !ok {
                    errors.push(err(
                        ErrorKind::FormatError,
                        format!("'{}' must be a time in HH:MM[:SS] format", spec.name),
                    ));
                }
            }
            DataType::Enumeration => {
                if !rules.values.iter().any(|allowed| allowed == value) {
                    errors.push(err(
                        ErrorKind::FormatError,
                        format!(
                            "'{}' must be one of: {}",
                            spec.name,
                            rules.values.join(", ")
                        ),
                    ));
                }
            }
            DataType::UniqueIdentifier => {
                if !UID_RE.is_match(value) {
                    errors.push(err(
                        ErrorKind::FormatError,
                        format!(
                            "'{}' may only contain letters, numbers, hyphens and underscores",
                            spec.name
                        ),
                    ));
                }
            }
        }

        if let Some(regex) = self.patterns.get(&spec.name) {
            if !regex.is_match(value) {
                errors.push(err(
                    ErrorKind::FormatError,
                    format!("'{}' does not match the required pattern", spec.name),
                ));
            }
        }

        errors
    }
}

/// Coerce a checked raw value to its typed JSON representation
fn coerce(spec: &FieldSpec, value: &str) -> JsonValue {
    match spec.data_type {
        DataType::Integer | DataType::BigInteger => value
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::String(value.to_string())),
        DataType::Float | DataType::Decimal => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(value.to_string())),
        DataType::Boolean => {
            JsonValue::Bool(TRUE_VALUES.contains(&value.to_lowercase().as_str()))
        }
        _ => JsonValue::String(value.to_string()),
    }
}

fn check_range(spec: &FieldSpec, number: f64, value: &str, row: usize) -> Vec<RowError> {
    let mut errors = Vec::new();
    if let Some(min) = spec.rules.min {
        if number < min {
            errors.push(RowError::field(
                row,
                &spec.name,
                ErrorKind::FormatError,
                format!("'{}' must be at least {}", spec.name, min),
                Some(value.to_string()),
            ));
        }
    }
    if let Some(max) = spec.rules.max {
        if number > max {
            errors.push(RowError::field(
                row,
                &spec.name,
                ErrorKind::FormatError,
                format!("'{}' must be at most {}", spec.name, max),
                Some(value.to_string()),
            ));
        }
    }
    errors
}
