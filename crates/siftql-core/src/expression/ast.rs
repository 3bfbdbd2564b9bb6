//! AST for predicate and path-combination expressions.

use std::collections::BTreeSet;
use std::fmt;

use siftql_model::Condition;

/// Boolean expression over field names or `$n` path placeholders.
///
/// `AND`/`OR` chains are kept n-ary: `a AND b AND c` is one [`BoolExpr::And`]
/// with three children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    /// A field name.
    Name(String),
    /// A 1-based path position (`$1`).
    Placeholder(usize),
    /// Conjunction.
    And(Vec<BoolExpr>),
    /// Disjunction.
    Or(Vec<BoolExpr>),
}

/// A leaf handed to the reducer of [`BoolExpr::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf<'a> {
    /// A field name.
    Name(&'a str),
    /// A 1-based path position.
    Placeholder(usize),
}

impl BoolExpr {
    /// Field names referenced by the expression.
    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |leaf| {
            if let Leaf::Name(name) = leaf {
                out.insert(name);
            }
        });
        out
    }

    /// Placeholder positions referenced by the expression.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.walk(&mut |leaf| {
            if let Leaf::Placeholder(n) = leaf {
                out.insert(n);
            }
        });
        out
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(Leaf<'a>)) {
        match self {
            Self::Name(name) => visit(Leaf::Name(name)),
            Self::Placeholder(n) => visit(Leaf::Placeholder(*n)),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.walk(visit);
                }
            }
        }
    }

    /// Turns the expression into a condition.
    ///
    /// `leaf` yields the condition of each leaf, or `None` to drop it. Inner
    /// nodes drop absent children and collapse like [`Condition::all`] and
    /// [`Condition::any`]; a node without remaining children is dropped too.
    pub fn reduce<E>(
        &self,
        leaf: &mut impl FnMut(Leaf<'_>) -> Result<Option<Condition>, E>,
    ) -> Result<Option<Condition>, E> {
        match self {
            Self::Name(name) => leaf(Leaf::Name(name)),
            Self::Placeholder(n) => leaf(Leaf::Placeholder(*n)),
            Self::And(children) => Ok(Condition::all(reduce_all(children, leaf)?)),
            Self::Or(children) => Ok(Condition::any(reduce_all(children, leaf)?)),
        }
    }
}

fn reduce_all<E>(
    children: &[BoolExpr],
    leaf: &mut impl FnMut(Leaf<'_>) -> Result<Option<Condition>, E>,
) -> Result<Vec<Condition>, E> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if let Some(c) = child.reduce(leaf)? {
            out.push(c);
        }
    }
    Ok(out)
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Placeholder(n) => write!(f, "${n}"),
            Self::And(children) => write_chain(f, children, " AND "),
            Self::Or(children) => write_chain(f, children, " OR "),
        }
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, children: &[BoolExpr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
