//! Value types of schema attributes and the typed values produced by coercion.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The value type of a schema attribute.
///
/// `Entity` marks a relationship to another entity; every other variant is a
/// terminal value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Enumeration with its constant names.
    Enum(Vec<String>),
    /// Calendar date.
    Date,
    /// Date and time without zone.
    DateTime,
    /// Time of day.
    Time,
    /// UUID identifier.
    Uuid,
    /// JSON document column.
    Json,
    /// Relationship to the named entity.
    Entity(String),
}

impl ValueType {
    /// Returns `true` for types that can be compared with `gt`/`lt`/`between`.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        !matches!(self, Self::Boolean | Self::Json | Self::Entity(_))
    }

    /// Returns `true` for text types (pattern operations).
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    /// Returns `true` for date, date-time and time types.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Time)
    }

    /// Returns the target entity when this is a relationship.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Entity(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Enum(_) => f.write_str("enum"),
            Self::Date => f.write_str("date"),
            Self::DateTime => f.write_str("datetime"),
            Self::Time => f.write_str("time"),
            Self::Uuid => f.write_str("uuid"),
            Self::Json => f.write_str("json"),
            Self::Entity(name) => write!(f, "entity<{name}>"),
        }
    }
}

/// A coerced filter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// Enumeration constant name.
    Enum(String),
    /// Date value.
    Date(NaiveDate),
    /// Date-time value.
    DateTime(NaiveDateTime),
    /// Time value.
    Time(NaiveTime),
    /// UUID value.
    Uuid(Uuid),
}

impl FilterValue {
    /// Returns the text content for text and enum values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean content.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Enum(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Uuid(u) => write!(f, "{u}"),
        }
    }
}
