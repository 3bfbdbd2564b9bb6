//! Filter engine configuration.
//!
//! Provides [`FilterConfig`], loaded from environment variables via
//! [`FilterConfig::from_env`] or assembled with the typed builder.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::dsl::Grammar;

/// Default `chrono` format for dates.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default `chrono` format for date-times.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Default `chrono` format for times.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Filter engine configuration.
///
/// # Examples
///
/// ```
/// use siftql_core::config::FilterConfig;
/// use siftql_core::dsl::Grammar;
///
/// let config = FilterConfig::default();
/// assert_eq!(config.grammar, Grammar::Colon);
/// assert_eq!(config.value_separator, ',');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Grammar used when the caller does not pick one.
    #[builder(default = Grammar::Colon)]
    pub grammar: Grammar,

    /// Separator between the values of multi-valued operations.
    #[builder(default = ',')]
    pub value_separator: char,

    /// Percent-decode each query segment before matching it.
    #[builder(default = true)]
    pub decode_values: bool,

    /// Skip unknown keys in map-of-arrays input instead of failing.
    #[builder(default = false)]
    pub ignore_unknown_keys: bool,

    /// Format for date values without a field-level format.
    #[builder(default = String::from(DEFAULT_DATE_FORMAT))]
    pub date_format: String,

    /// Format for date-time values without a field-level format.
    #[builder(default = String::from(DEFAULT_DATE_TIME_FORMAT))]
    pub date_time_format: String,

    /// Format for time values without a field-level format.
    #[builder(default = String::from(DEFAULT_TIME_FORMAT))]
    pub time_format: String,

    /// Log level filter string for hosts that initialise tracing.
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            grammar: Grammar::Colon,
            value_separator: ',',
            decode_values: true,
            ignore_unknown_keys: false,
            date_format: String::from(DEFAULT_DATE_FORMAT),
            date_time_format: String::from(DEFAULT_DATE_TIME_FORMAT),
            time_format: String::from(DEFAULT_TIME_FORMAT),
            log_level: String::from("info"),
        }
    }
}

impl FilterConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SIFTQL_GRAMMAR` | `colon` |
    /// | `SIFTQL_VALUE_SEPARATOR` | `,` |
    /// | `SIFTQL_DECODE_VALUES` | `true` |
    /// | `SIFTQL_IGNORE_UNKNOWN_KEYS` | `false` |
    /// | `SIFTQL_DATE_FORMAT` | `%Y-%m-%d` |
    /// | `SIFTQL_DATE_TIME_FORMAT` | `%Y-%m-%dT%H:%M:%S` |
    /// | `SIFTQL_TIME_FORMAT` | `%H:%M:%S` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SIFTQL_GRAMMAR") {
            if let Some(grammar) = Grammar::from_name(&v) {
                config.grammar = grammar;
            }
        }
        if let Ok(v) = std::env::var("SIFTQL_VALUE_SEPARATOR") {
            let mut chars = v.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                config.value_separator = c;
            }
        }
        if let Ok(v) = std::env::var("SIFTQL_DECODE_VALUES") {
            config.decode_values = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("SIFTQL_IGNORE_UNKNOWN_KEYS") {
            config.ignore_unknown_keys = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("SIFTQL_DATE_FORMAT") {
            config.date_format = v;
        }
        if let Ok(v) = std::env::var("SIFTQL_DATE_TIME_FORMAT") {
            config.date_time_format = v;
        }
        if let Ok(v) = std::env::var("SIFTQL_TIME_FORMAT") {
            config.time_format = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
