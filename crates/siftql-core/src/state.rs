//! Request-scoped filter state.
//!
//! A [`QueryFilterState`] holds the active matches (one per field, in the
//! order they were added), the request's sort override and the selected
//! predicate. It is created per request from a shared [`FilterRegistry`] and
//! mutated only through its own API.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use siftql_model::{Direction, FilterError, FilterQuery, Operation};

use crate::build;
use crate::dsl::{self, ParsedQuery};
use crate::matching::{ExpressionEvaluator, FieldValue, Match};
use crate::registry::{FieldDefinition, FieldKind, FilterRegistry};
use crate::required;
use crate::sort;

/// Live filter of one request.
#[derive(Clone)]
pub struct QueryFilterState {
    registry: Arc<FilterRegistry>,
    matches: Vec<Match>,
    sorts: Vec<(String, Direction)>,
    /// Set once the request sorts or clears the sort; the default sort no
    /// longer applies.
    sort_override: bool,
    predicate: Option<String>,
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
}

impl fmt::Debug for QueryFilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFilterState")
            .field("entity", &self.registry.entity())
            .field("matches", &self.matches)
            .field("sorts", &self.sorts)
            .field("sort_override", &self.sort_override)
            .field("predicate", &self.predicate)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

impl QueryFilterState {
    /// Creates a state holding only the defaults of untriggered fields.
    #[must_use]
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        let mut state = Self::empty(registry);
        state.inject_defaults();
        state
    }

    /// Parses `input` with the configured grammar.
    ///
    /// # Errors
    ///
    /// Parse errors, [`FilterError::RequiredField`] for fields required on
    /// string filters, [`FilterError::BlockedField`] and every error of
    /// [`add_new_field`](Self::add_new_field) and
    /// [`add_sort_by`](Self::add_sort_by).
    pub fn parse(registry: Arc<FilterRegistry>, input: &str) -> Result<Self, FilterError> {
        let config = registry.config();
        let parsed = dsl::parse_query(input, config.grammar, config)?;
        Self::from_parsed(registry, &parsed)
    }

    /// Builds a state from a map of parameter arrays, as decoded by an HTTP
    /// layer. Keys are field names (or `field[op]` for the bracket grammar)
    /// and `sort`.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn from_params<I, K, V>(registry: Arc<FilterRegistry>, params: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let config = registry.config();
        let parsed = dsl::parse_params(params, config.grammar, config, |field| {
            registry.field(field).is_some()
        })?;
        Self::from_parsed(registry, &parsed)
    }

    fn from_parsed(registry: Arc<FilterRegistry>, parsed: &ParsedQuery) -> Result<Self, FilterError> {
        required::check_string_filter(&registry, parsed)?;

        let mut state = Self::empty(registry);
        for token in &parsed.values {
            let definition = state.definition(&token.field)?;
            if definition.blocked {
                return Err(FilterError::BlockedField {
                    field: token.field.clone(),
                });
            }
            let operation: Operation = token.operation.parse()?;
            let matched = Match::parsed(definition, operation, &token.value, state.registry.config())?;
            state.insert_new(matched);
        }
        for token in &parsed.sorts {
            state.add_sort_by(&token.field, token.direction)?;
        }
        state.inject_defaults();

        debug!(
            entity = %state.registry.entity(),
            matches = state.matches.len(),
            sorts = state.sorts.len(),
            "filter state parsed"
        );
        Ok(state)
    }

    fn empty(registry: Arc<FilterRegistry>) -> Self {
        Self {
            registry,
            matches: Vec::new(),
            sorts: Vec::new(),
            sort_override: false,
            predicate: None,
            evaluator: None,
        }
    }

    /// Sets the evaluator for computed values.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// The registry this state filters against.
    #[must_use]
    pub fn registry(&self) -> &Arc<FilterRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Field mutation
    // ------------------------------------------------------------------

    /// Adds an element match, replacing any match of the same field and
    /// moving it to the end.
    ///
    /// # Errors
    ///
    /// [`FilterError::FieldNotFound`], [`FilterError::NotValuable`] when the
    /// field is not an element, and every binding error of [`Match`].
    pub fn add_new_field<I, S>(
        &mut self,
        field: &str,
        operation: Operation,
        values: I,
    ) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matched = self.bind(field, Kind::Element, operation, collect(values))?;
        self.insert_new(matched);
        Ok(())
    }

    /// Replaces the element match of `field` in place, or appends it.
    ///
    /// # Errors
    ///
    /// Same as [`add_new_field`](Self::add_new_field).
    pub fn override_field<I, S>(
        &mut self,
        field: &str,
        operation: Operation,
        values: I,
    ) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matched = self.bind(field, Kind::Element, operation, collect(values))?;
        self.insert_override(matched);
        Ok(())
    }

    /// Adds a match whose values are computed from `expression` at build
    /// time, replacing any match of the same field.
    ///
    /// # Errors
    ///
    /// [`FilterError::FieldNotFound`], [`FilterError::NotValuable`] when the
    /// field is not an element, and operation errors.
    pub fn add_computed_field(
        &mut self,
        field: &str,
        operation: Operation,
        expression: impl Into<String>,
    ) -> Result<(), FilterError> {
        let definition = self.definition_of(field, Kind::Element)?;
        let matched = Match::computed(definition, operation, expression)?;
        self.insert_new(matched);
        Ok(())
    }

    /// Adds a JSON match; `value` must be an object of scalar values.
    ///
    /// # Errors
    ///
    /// [`FilterError::NotValuable`] when the field is not a JSON field, and
    /// binding errors.
    pub fn add_json_field(
        &mut self,
        field: &str,
        operation: Operation,
        value: &serde_json::Value,
    ) -> Result<(), FilterError> {
        let matched = self.bind(field, Kind::Json, operation, vec![value.to_string()])?;
        self.insert_new(matched);
        Ok(())
    }

    /// Replaces the JSON match of `field` in place, or appends it.
    ///
    /// # Errors
    ///
    /// Same as [`add_json_field`](Self::add_json_field).
    pub fn override_json_field(
        &mut self,
        field: &str,
        operation: Operation,
        value: &serde_json::Value,
    ) -> Result<(), FilterError> {
        let matched = self.bind(field, Kind::Json, operation, vec![value.to_string()])?;
        self.insert_override(matched);
        Ok(())
    }

    /// Adds a discriminator match over discriminator values.
    ///
    /// # Errors
    ///
    /// [`FilterError::NotValuable`] when the field is not a discriminator,
    /// and binding errors.
    pub fn add_discriminator_field<I, S>(
        &mut self,
        field: &str,
        operation: Operation,
        values: I,
    ) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matched = self.bind(field, Kind::Discriminator, operation, collect(values))?;
        self.insert_new(matched);
        Ok(())
    }

    /// Replaces the discriminator match of `field` in place, or appends it.
    ///
    /// # Errors
    ///
    /// Same as [`add_discriminator_field`](Self::add_discriminator_field).
    pub fn override_discriminator_field<I, S>(
        &mut self,
        field: &str,
        operation: Operation,
        values: I,
    ) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matched = self.bind(field, Kind::Discriminator, operation, collect(values))?;
        self.insert_override(matched);
        Ok(())
    }

    /// Adds a collection size match.
    ///
    /// # Errors
    ///
    /// [`FilterError::NotValuable`] when the field is not a collection, and
    /// operation errors.
    pub fn add_collection_field(
        &mut self,
        field: &str,
        operation: Operation,
        size: i64,
    ) -> Result<(), FilterError> {
        let matched = self.bind(field, Kind::Collection, operation, vec![size.to_string()])?;
        self.insert_new(matched);
        Ok(())
    }

    /// Replaces the collection match of `field` in place, or appends it.
    ///
    /// # Errors
    ///
    /// Same as [`add_collection_field`](Self::add_collection_field).
    pub fn override_collection_field(
        &mut self,
        field: &str,
        operation: Operation,
        size: i64,
    ) -> Result<(), FilterError> {
        let matched = self.bind(field, Kind::Collection, operation, vec![size.to_string()])?;
        self.insert_override(matched);
        Ok(())
    }

    /// Removes the match of `field`. Defaults it injected are removed too
    /// once no other trigger source keeps them. Returns `false` when the
    /// field was not filtered.
    pub fn delete_field(&mut self, field: &str) -> bool {
        let Some(index) = self.index_of(field) else {
            return false;
        };
        self.matches.remove(index);
        self.release_targets(field);
        true
    }

    // ------------------------------------------------------------------
    // Sort and predicate
    // ------------------------------------------------------------------

    /// Appends `field` to the request's sort. The first call replaces the
    /// default sort.
    ///
    /// # Errors
    ///
    /// [`FilterError::FieldNotFound`], [`FilterError::NotValuable`] for a
    /// field that is not sortable, [`FilterError::MultipleSort`] when the
    /// field is already sorted on.
    pub fn add_sort_by(&mut self, field: &str, direction: Direction) -> Result<(), FilterError> {
        sort::sortable(&self.registry, field)?;
        if !self.sort_override {
            self.sorts.clear();
            self.sort_override = true;
        }
        if self.sorts.iter().any(|(f, _)| f == field) {
            return Err(FilterError::MultipleSort {
                field: field.to_owned(),
            });
        }
        self.sorts.push((field.to_owned(), direction));
        Ok(())
    }

    /// Clears the sort. The default sort does not come back.
    pub fn clear_sort(&mut self) {
        self.sorts.clear();
        self.sort_override = true;
    }

    /// Selects a named predicate.
    ///
    /// # Errors
    ///
    /// [`FilterError::PredicateNotFound`].
    pub fn set_predicate(&mut self, name: &str) -> Result<(), FilterError> {
        if self.registry.predicate(name).is_none() {
            return Err(FilterError::PredicateNotFound {
                name: name.to_owned(),
            });
        }
        self.predicate = Some(name.to_owned());
        Ok(())
    }

    /// Goes back to a plain conjunction of all fields.
    pub fn clear_predicate(&mut self) {
        self.predicate = None;
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns `true` when `field` has an active match.
    #[must_use]
    pub fn is_filtering(&self, field: &str) -> bool {
        self.index_of(field).is_some()
    }

    /// Active match of `field`.
    #[must_use]
    pub fn get_actual_value(&self, field: &str) -> Option<FieldValue> {
        self.find(field).map(Match::to_field_value)
    }

    /// Every active match, in state order.
    #[must_use]
    pub fn get_all_field_values(&self) -> Vec<FieldValue> {
        self.matches.iter().map(Match::to_field_value).collect()
    }

    /// Active match of `field`, with its binding.
    #[must_use]
    pub fn find(&self, field: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.field() == field)
    }

    /// Active matches, in state order.
    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Returns `true` when the active sort is not empty.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        !self.get_sort_fields().is_empty()
    }

    /// Returns `true` when `field` takes part in the active sort.
    #[must_use]
    pub fn is_sorted_by(&self, field: &str) -> bool {
        self.get_sort_fields().iter().any(|(f, _)| f == field)
    }

    /// Active sort: the request's override, or the default sort.
    #[must_use]
    pub fn get_sort_fields(&self) -> &[(String, Direction)] {
        if self.sort_override {
            &self.sorts
        } else {
            self.registry.default_sort()
        }
    }

    /// Selected predicate name.
    #[must_use]
    pub fn predicate(&self) -> Option<&str> {
        self.predicate.as_deref()
    }

    /// Builds the condition tree, join table and ordering.
    ///
    /// # Errors
    ///
    /// Required-field errors of the execution and sort phases, evaluation
    /// errors of computed values and resolution errors.
    pub fn build(&self) -> Result<FilterQuery, FilterError> {
        build::build(
            &self.registry,
            &self.matches,
            self.get_sort_fields(),
            self.predicate.as_deref(),
            self.evaluator.as_deref(),
        )
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn definition(&self, field: &str) -> Result<&FieldDefinition, FilterError> {
        self.registry
            .field(field)
            .ok_or_else(|| FilterError::FieldNotFound {
                field: field.to_owned(),
            })
    }

    fn bind(
        &self,
        field: &str,
        kind: Kind,
        operation: Operation,
        values: Vec<String>,
    ) -> Result<Match, FilterError> {
        let definition = self.definition_of(field, kind)?;
        Match::literal(definition, operation, values, self.registry.config())
    }

    fn definition_of(&self, field: &str, kind: Kind) -> Result<&FieldDefinition, FilterError> {
        let definition = self.definition(field)?;
        if !kind.accepts(definition) {
            return Err(FilterError::NotValuable {
                field: field.to_owned(),
                usage: kind.usage().to_owned(),
            });
        }
        Ok(definition)
    }

    fn index_of(&self, field: &str) -> Option<usize> {
        self.matches.iter().position(|m| m.field() == field)
    }

    fn insert_new(&mut self, matched: Match) {
        if let Some(index) = self.index_of(matched.field()) {
            self.matches.remove(index);
        }
        let field = matched.field().to_owned();
        self.matches.push(matched);
        self.inject_targets(&field);
    }

    fn insert_override(&mut self, matched: Match) {
        let field = matched.field().to_owned();
        match self.index_of(&field) {
            Some(index) => self.matches[index] = matched,
            None => self.matches.push(matched),
        }
        self.inject_targets(&field);
    }

    /// Injects the defaults of absent fields that no trigger owns.
    fn inject_defaults(&mut self) {
        let registry = Arc::clone(&self.registry);
        for definition in registry.fields() {
            let name = definition.name.as_str();
            if registry.triggers().is_target(name) || self.is_filtering(name) {
                continue;
            }
            if let Some(default) = registry.default_match(name) {
                debug!(field = %name, "default applied");
                self.matches.push(default.clone());
                self.inject_targets(name);
            }
        }
    }

    /// Injects the defaults of absent trigger targets of `source`,
    /// transitively.
    fn inject_targets(&mut self, source: &str) {
        let registry = Arc::clone(&self.registry);
        let mut pending = vec![source.to_owned()];
        while let Some(source) = pending.pop() {
            for target in registry.triggers().targets_of(&source) {
                if self.is_filtering(target) {
                    continue;
                }
                if let Some(default) = registry.default_match(target) {
                    debug!(%source, field = %target, "default injected");
                    self.matches.push(default.clone().mark_injected());
                    pending.push(target.clone());
                }
            }
        }
    }

    /// Removes injected targets of `source` that lost their last active
    /// source, transitively.
    fn release_targets(&mut self, source: &str) {
        let registry = Arc::clone(&self.registry);
        let mut pending = vec![source.to_owned()];
        while let Some(source) = pending.pop() {
            for target in registry.triggers().targets_of(&source) {
                let Some(index) = self.index_of(target) else {
                    continue;
                };
                if !self.matches[index].is_injected() {
                    continue;
                }
                let kept = registry
                    .triggers()
                    .sources_of(target)
                    .iter()
                    .any(|s| self.is_filtering(s));
                if !kept {
                    debug!(%source, field = %target, "default removed");
                    self.matches.remove(index);
                    pending.push(target.clone());
                }
            }
        }
    }
}

/// Field kind expected by a mutation method.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Element,
    Json,
    Discriminator,
    Collection,
}

impl Kind {
    fn accepts(self, definition: &FieldDefinition) -> bool {
        matches!(
            (self, &definition.kind),
            (Self::Element, FieldKind::Element(_))
                | (Self::Json, FieldKind::Json(_))
                | (Self::Discriminator, FieldKind::Discriminator(_))
                | (Self::Collection, FieldKind::Collection(_))
        )
    }

    fn usage(self) -> &'static str {
        match self {
            Self::Element => "element values",
            Self::Json => "json values",
            Self::Discriminator => "discriminator values",
            Self::Collection => "collection sizes",
        }
    }
}

fn collect<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}
