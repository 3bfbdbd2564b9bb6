//! Per-build join table with get-or-create semantics.

use std::collections::HashMap;

use tracing::debug;

use siftql_model::{AttributeRef, Join, JoinAlias, JoinKind};

use super::resolver::AttributePath;

/// How a path is used, which decides its join strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinMode {
    /// Navigated to reach a value or an entity.
    Plain,
    /// Navigated to probe a multi-valued relation (cardinality); the
    /// relation itself is not joined.
    Probe,
}

/// Where a path lands once its relationships are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The addressed attribute.
    pub attribute: AttributeRef,
    /// Correlated existence join wrapping the condition, if any.
    pub exists: Option<JoinAlias>,
}

/// Joins created while building one query.
///
/// Joins are memoized by `(dotted prefix, mode)`, so every field and sort
/// instruction navigating the same prefix shares one join instance, joined
/// with the strictest kind any of them asked for. A cache
/// lives for a single build and is never reused.
#[derive(Debug, Default)]
pub struct JoinCache {
    joins: Vec<Join>,
    index: HashMap<(String, JoinMode), JoinAlias>,
}

impl JoinCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins every relationship of `path` but the last segment and returns
    /// the terminal attribute.
    ///
    /// `kinds[i]` is the join kind of level `i`; levels without one use the
    /// natural kind of their relation. A shared join takes the merge of every
    /// requested kind. With `correlated`, the first multi-valued level and
    /// everything below it become a fresh existence join that is not shared.
    pub fn locate_value(
        &mut self,
        path: &AttributePath,
        kinds: &[JoinKind],
        correlated: bool,
    ) -> Location {
        let last = path.segments().len() - 1;
        let (alias, exists) = self.walk(path, last, JoinMode::Plain, kinds, correlated);
        Location {
            attribute: AttributeRef::new(alias, path.last().name.clone()),
            exists,
        }
    }

    /// Joins every relationship of `path`, the last one included, and returns
    /// the alias of the reached entity.
    pub fn locate_entity(&mut self, path: &AttributePath) -> JoinAlias {
        let depth = path.segments().len();
        self.walk(path, depth, JoinMode::Plain, &[], false).0
    }

    /// Joins the relationships leading to the multi-valued relation ending
    /// `path` and returns that relation.
    pub fn locate_probe(&mut self, path: &AttributePath) -> AttributeRef {
        let last = path.segments().len() - 1;
        let (alias, _) = self.walk(path, last, JoinMode::Probe, &[], false);
        AttributeRef::new(alias, path.last().name.clone())
    }

    /// Joins the first `depth` segments of `path`.
    fn walk(
        &mut self,
        path: &AttributePath,
        depth: usize,
        mode: JoinMode,
        kinds: &[JoinKind],
        correlated: bool,
    ) -> (JoinAlias, Option<JoinAlias>) {
        let mut parent = JoinAlias::ROOT;
        let mut exists = None;

        for (i, segment) in path.segments()[..depth].iter().enumerate() {
            let requested = match mode {
                JoinMode::Plain => kinds
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| segment.kind.natural_join()),
                JoinMode::Probe => JoinKind::Left,
            };

            if correlated && (exists.is_some() || segment.kind.is_multi_valued()) {
                let kind = if exists.is_none() {
                    JoinKind::Exists
                } else {
                    requested
                };
                let alias = self.push(parent, &segment.name, kind, segment.treat.clone());
                exists.get_or_insert(alias);
                parent = alias;
                continue;
            }

            let key = (path.prefix_key(i), mode);
            parent = match self.index.get(&key) {
                Some(&alias) => {
                    self.merge_kind(alias, requested);
                    alias
                }
                None => {
                    let alias = self.push(parent, &segment.name, requested, segment.treat.clone());
                    self.index.insert(key, alias);
                    alias
                }
            };
        }

        (parent, exists)
    }

    fn push(
        &mut self,
        parent: JoinAlias,
        attribute: &str,
        kind: JoinKind,
        treat: Option<String>,
    ) -> JoinAlias {
        let alias = JoinAlias(self.joins.len() + 1);
        debug!(%alias, %parent, attribute, ?kind, ?treat, "join created");
        self.joins.push(Join {
            alias,
            parent,
            attribute: attribute.to_owned(),
            kind,
            treat,
        });
        alias
    }

    fn merge_kind(&mut self, alias: JoinAlias, requested: JoinKind) {
        if let Some(join) = self.joins.iter_mut().find(|j| j.alias == alias) {
            let merged = join.kind.merge(requested);
            if merged != join.kind {
                debug!(%alias, from = ?join.kind, to = ?merged, "shared join upgraded");
                join.kind = merged;
            }
        }
    }

    /// Number of joins created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    /// Returns `true` when no join was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Consumes the cache, returning the joins in creation order.
    #[must_use]
    pub fn into_joins(self) -> Vec<Join> {
        self.joins
    }
}
