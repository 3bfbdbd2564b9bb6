//! String to typed value coercion.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use siftql_model::{FilterError, FilterValue, ValueType};

use crate::config::FilterConfig;

/// Coerce `raw` into `value_type`.
///
/// Temporal values use `format` when the field declares one, otherwise the
/// configured default for their type. JSON columns compare as text.
///
/// # Errors
///
/// - [`FilterError::ValueParse`] for numbers, booleans and identifiers.
/// - [`FilterError::EnumValue`] for unknown enum constants.
/// - [`FilterError::DateParse`] for temporal values.
pub fn coerce(
    field: &str,
    raw: &str,
    value_type: &ValueType,
    format: Option<&str>,
    config: &FilterConfig,
) -> Result<FilterValue, FilterError> {
    let value_error = |expected: &str| FilterError::ValueParse {
        field: field.to_owned(),
        value: raw.to_owned(),
        expected: expected.to_owned(),
    };

    match value_type {
        ValueType::Text | ValueType::Json => Ok(FilterValue::Text(raw.to_owned())),
        ValueType::Integer => raw
            .trim()
            .parse()
            .map(FilterValue::Integer)
            .map_err(|_| value_error("integer")),
        ValueType::Float => raw
            .trim()
            .parse()
            .map(FilterValue::Float)
            .map_err(|_| value_error("float")),
        ValueType::Boolean => parse_bool(raw)
            .map(FilterValue::Boolean)
            .ok_or_else(|| value_error("boolean")),
        ValueType::Uuid => Uuid::parse_str(raw.trim())
            .map(FilterValue::Uuid)
            .map_err(|_| value_error("uuid")),
        ValueType::Enum(constants) => {
            if constants.iter().any(|c| c == raw) {
                Ok(FilterValue::Enum(raw.to_owned()))
            } else {
                Err(FilterError::EnumValue {
                    field: field.to_owned(),
                    value: raw.to_owned(),
                    allowed: constants.clone(),
                })
            }
        }
        ValueType::Date => {
            let format = format.unwrap_or(config.date_format.as_str());
            NaiveDate::parse_from_str(raw, format)
                .map(FilterValue::Date)
                .map_err(|_| date_error(field, raw, format))
        }
        ValueType::DateTime => {
            let format = format.unwrap_or(config.date_time_format.as_str());
            NaiveDateTime::parse_from_str(raw, format)
                .map(FilterValue::DateTime)
                .map_err(|_| date_error(field, raw, format))
        }
        ValueType::Time => {
            let format = format.unwrap_or(config.time_format.as_str());
            NaiveTime::parse_from_str(raw, format)
                .map(FilterValue::Time)
                .map_err(|_| date_error(field, raw, format))
        }
        ValueType::Entity(name) => Err(value_error(name)),
    }
}

/// Parse `true`/`false` (case-insensitive).
pub fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn date_error(field: &str, raw: &str, format: &str) -> FilterError {
    FilterError::DateParse {
        field: field.to_owned(),
        value: raw.to_owned(),
        format: format.to_owned(),
    }
}
