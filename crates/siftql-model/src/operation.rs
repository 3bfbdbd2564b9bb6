//! Filter operations and sort directions.
//!
//! Every operation has a short wire code used by both query grammars
//! (`field=gt:5` and `field[gt]=5`). The code table is the single source of
//! truth for parsing and display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// A filter operation as written in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Equal (`eq`).
    Eq,
    /// Not equal (`ne`).
    Ne,
    /// Greater than (`gt`).
    Gt,
    /// Greater than or equal (`gte`).
    Gte,
    /// Less than (`lt`).
    Lt,
    /// Less than or equal (`lte`).
    Lte,
    /// Inclusive range over exactly two values (`between`).
    Between,
    /// Native pattern match (`regex`).
    Regex,
    /// Substring match (`like`).
    Like,
    /// Negated substring match (`nlike`).
    NotLike,
    /// Prefix match (`starts`).
    StartsWith,
    /// Suffix match (`ends`).
    EndsWith,
    /// Membership (`in`).
    In,
    /// Negated membership (`nin`).
    NotIn,
    /// Null test, the value selects null vs. not-null (`isnull`).
    IsNull,
    /// Array overlap (`ovlp`).
    Overlap,
    /// Negated array overlap (`novlp`).
    NotOverlap,
    /// Array contained-by (`ctd`).
    Contained,
    /// Negated array contained-by (`nctd`).
    NotContained,
}

/// `(operation, wire code)` pairs.
const CODES: &[(Operation, &str)] = &[
    (Operation::Eq, "eq"),
    (Operation::Ne, "ne"),
    (Operation::Gt, "gt"),
    (Operation::Gte, "gte"),
    (Operation::Lt, "lt"),
    (Operation::Lte, "lte"),
    (Operation::Between, "between"),
    (Operation::Regex, "regex"),
    (Operation::Like, "like"),
    (Operation::NotLike, "nlike"),
    (Operation::StartsWith, "starts"),
    (Operation::EndsWith, "ends"),
    (Operation::In, "in"),
    (Operation::NotIn, "nin"),
    (Operation::IsNull, "isnull"),
    (Operation::Overlap, "ovlp"),
    (Operation::NotOverlap, "novlp"),
    (Operation::Contained, "ctd"),
    (Operation::NotContained, "nctd"),
];

impl Operation {
    /// Every operation, in wire-code table order.
    pub const ALL: [Self; 19] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
        Self::Regex,
        Self::Like,
        Self::NotLike,
        Self::StartsWith,
        Self::EndsWith,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::Overlap,
        Self::NotOverlap,
        Self::Contained,
        Self::NotContained,
    ];

    /// Operations accepted by JSON fields.
    pub const JSON: [Self; 5] = [
        Self::Eq,
        Self::Ne,
        Self::Like,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// Operations accepted by discriminator fields.
    pub const DISCRIMINATOR: [Self; 4] = [Self::Eq, Self::Ne, Self::In, Self::NotIn];

    /// Operations accepted by collection (cardinality) fields.
    pub const COLLECTION: [Self; 6] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
    ];

    /// Returns the wire code of this operation.
    #[must_use]
    pub fn code(self) -> &'static str {
        CODES
            .iter()
            .find(|(op, _)| *op == self)
            .map_or("?", |(_, code)| code)
    }

    /// Looks up an operation by its wire code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        CODES
            .iter()
            .find(|(_, c)| c.eq_ignore_ascii_case(code))
            .map(|(op, _)| *op)
    }

    /// Ordering operations need an orderable terminal type.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Between
        )
    }

    /// Pattern operations need a text terminal type.
    #[must_use]
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Self::Regex | Self::Like | Self::NotLike | Self::StartsWith | Self::EndsWith
        )
    }

    /// Array operations are only valid on array-typed fields.
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::Overlap | Self::NotOverlap | Self::Contained | Self::NotContained
        )
    }

    /// Operations whose raw value is a separator-delimited list.
    #[must_use]
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::Between | Self::In | Self::NotIn) || self.is_array()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Operation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| FilterError::OperationNotFound {
            operation: s.to_owned(),
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending (`+field`).
    Asc,
    /// Descending (`-field`).
    Desc,
}

impl Direction {
    /// Parses the leading sign of a sort token.
    #[must_use]
    pub fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '+' => Some(Self::Asc),
            '-' => Some(Self::Desc),
            _ => None,
        }
    }

    /// The sign used in query strings.
    #[must_use]
    pub fn sign(self) -> char {
        match self {
            Self::Asc => '+',
            Self::Desc => '-',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}
