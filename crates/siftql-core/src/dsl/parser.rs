//! Segment matcher for `&`-separated query strings.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

use siftql_model::{Direction, FilterError};

use super::{Grammar, ParsedQuery, SortToken, ValueToken};
use crate::config::FilterConfig;

static COLON_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)=([A-Za-z]+):(.*)$").expect("valid regex")
});

static BRACKET_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\[([A-Za-z]+)\]=(.*)$").expect("valid regex")
});

static SORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^sort=(.*)$").expect("valid regex"));

static SORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-][A-Za-z_][A-Za-z0-9_]*(?:,[+-][A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid regex")
});

/// Parse a query string under `grammar`.
///
/// Empty segments (`a=eq:1&&b=eq:2`, trailing `&`) are skipped. Each other
/// segment must be a value assignment or a sort assignment. Only the value
/// part of a segment is percent-decoded; field names and operations must
/// appear literally.
///
/// # Errors
///
/// - [`FilterError::Parse`] when a segment matches neither shape or its value
///   cannot be percent-decoded.
/// - [`FilterError::MultipleSort`] when a field is sorted twice.
///
/// # Examples
///
/// ```
/// use siftql_core::config::FilterConfig;
/// use siftql_core::dsl::{parse_query, Grammar};
///
/// let parsed = parse_query("title=like:rust&sort=-date", Grammar::Colon, &FilterConfig::default()).unwrap();
/// assert_eq!(parsed.values[0].operation, "like");
/// assert_eq!(parsed.sorts[0].field, "date");
/// ```
pub fn parse_query(
    input: &str,
    grammar: Grammar,
    config: &FilterConfig,
) -> Result<ParsedQuery, FilterError> {
    let mut parsed = ParsedQuery::default();

    for segment in input.split('&').filter(|s| !s.is_empty()) {
        push_segment(&mut parsed, segment, grammar, input, config.decode_values)?;
    }

    debug!(
        %grammar,
        values = parsed.values.len(),
        sorts = parsed.sorts.len(),
        "parsed query string"
    );
    Ok(parsed)
}

/// Match one segment and append its tokens, decoding the value part when
/// `decode` is set.
pub(crate) fn push_segment(
    parsed: &mut ParsedQuery,
    segment: &str,
    grammar: Grammar,
    input: &str,
    decode: bool,
) -> Result<(), FilterError> {
    let parse_error = || FilterError::Parse {
        segment: segment.to_owned(),
        input: input.to_owned(),
    };
    let value_of = |raw: &str| -> Result<String, FilterError> {
        if !decode {
            return Ok(raw.to_owned());
        }
        percent_decode_str(raw)
            .decode_utf8()
            .map(std::borrow::Cow::into_owned)
            .map_err(|_| parse_error())
    };

    if let Some(caps) = SORT.captures(segment) {
        let list = value_of(&caps[1])?;
        if !SORT_LIST.is_match(&list) {
            return Err(parse_error());
        }
        for part in list.split(',') {
            let mut chars = part.chars();
            let direction = chars
                .next()
                .and_then(Direction::from_sign)
                .ok_or_else(parse_error)?;
            push_sort(parsed, chars.as_str(), direction)?;
        }
        return Ok(());
    }

    let value_pattern = match grammar {
        Grammar::Colon => &*COLON_VALUE,
        Grammar::Bracket => &*BRACKET_VALUE,
    };
    let caps = value_pattern.captures(segment).ok_or_else(parse_error)?;
    parsed.values.push(ValueToken {
        field: caps[1].to_owned(),
        operation: caps[2].to_owned(),
        value: value_of(&caps[3])?,
    });
    Ok(())
}

fn push_sort(parsed: &mut ParsedQuery, field: &str, direction: Direction) -> Result<(), FilterError> {
    if parsed.sorts.iter().any(|s| s.field == field) {
        return Err(FilterError::MultipleSort {
            field: field.to_owned(),
        });
    }
    parsed.sorts.push(SortToken {
        field: field.to_owned(),
        direction,
    });
    Ok(())
}
