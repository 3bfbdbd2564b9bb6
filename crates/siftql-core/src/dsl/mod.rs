//! Query-string grammars.
//!
//! Two interchangeable surface syntaxes produce the same token stream:
//!
//! | Grammar | Value segment | Sort segment |
//! |---------|---------------|--------------|
//! | [`Grammar::Colon`] | `field=op:value` | `sort=+a,-b` |
//! | [`Grammar::Bracket`] | `field[op]=value` | `sort=+a,-b` |
//!
//! The parser only checks shape. Binding tokens to field definitions happens
//! in the match engine.

pub mod params;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

use siftql_model::Direction;

pub use params::parse_params;
pub use parser::parse_query;

/// Query-string grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// `field=op:value`.
    #[default]
    Colon,
    /// `field[op]=value`.
    Bracket,
}

impl Grammar {
    /// Looks up a grammar by name (`colon` or `bracket`, case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("colon") {
            Some(Self::Colon)
        } else if name.eq_ignore_ascii_case("bracket") {
            Some(Self::Bracket)
        } else {
            None
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Colon => f.write_str("colon"),
            Self::Bracket => f.write_str("bracket"),
        }
    }
}

/// A `(field, operation, value)` assignment as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueToken {
    /// Filter field name.
    pub field: String,
    /// Operation code, not yet validated.
    pub operation: String,
    /// Raw value.
    pub value: String,
}

/// One `±field` part of a sort assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortToken {
    /// Sortable field name.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

/// Tokens of one query, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Value assignments.
    pub values: Vec<ValueToken>,
    /// Sort parts.
    pub sorts: Vec<SortToken>,
}

impl ParsedQuery {
    /// Returns `true` when no token was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.sorts.is_empty()
    }

    /// Returns `true` when a value token names `field`.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.values.iter().any(|t| t.field == field)
    }
}
