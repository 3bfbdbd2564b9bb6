//! Map-of-arrays input, as produced by HTTP frameworks from a query string.
//!
//! Keys and values are taken as already decoded. Each `(key, value)` pair is
//! rebuilt into a `key=value` segment and run through the same matcher as
//! [`parse_query`](super::parse_query), so both inputs accept exactly the same
//! shapes.

use tracing::debug;

use siftql_model::FilterError;

use super::parser::push_segment;
use super::{Grammar, ParsedQuery};
use crate::config::FilterConfig;

const SORT_KEY: &str = "sort";

/// Parse map-of-arrays parameters under `grammar`.
///
/// `known` tells whether a field name is declared. With
/// [`FilterConfig::ignore_unknown_keys`] set, pairs whose key does not name a
/// known field (or does not fit the grammar at all) are skipped; otherwise
/// they go through and fail at parse or match time.
///
/// # Errors
///
/// Same as [`parse_query`](super::parse_query).
pub fn parse_params<I, K, V>(
    params: I,
    grammar: Grammar,
    config: &FilterConfig,
    known: impl Fn(&str) -> bool,
) -> Result<ParsedQuery, FilterError>
where
    I: IntoIterator<Item = (K, Vec<V>)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parsed = ParsedQuery::default();
    let mut skipped = 0usize;

    for (key, values) in params {
        let key = key.as_ref();
        if config.ignore_unknown_keys && key != SORT_KEY {
            let declared = field_of_key(key, grammar).is_some_and(&known);
            if !declared {
                skipped += 1;
                continue;
            }
        }
        for value in values {
            let segment = format!("{key}={}", value.as_ref());
            push_segment(&mut parsed, &segment, grammar, &segment, false)?;
        }
    }

    debug!(
        %grammar,
        values = parsed.values.len(),
        sorts = parsed.sorts.len(),
        skipped,
        "parsed query parameters"
    );
    Ok(parsed)
}

/// Field name carried by a parameter key.
fn field_of_key(key: &str, grammar: Grammar) -> Option<&str> {
    match grammar {
        Grammar::Colon => Some(key),
        Grammar::Bracket => {
            let (field, rest) = key.split_once('[')?;
            rest.ends_with(']').then_some(field)
        }
    }
}
