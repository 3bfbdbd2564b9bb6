//! Required-field tests across the three phases.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use siftql_core::{FilterConfig, FilterRegistry, QueryFilterState};
    use siftql_model::{
        Direction, ElementSpec, FieldSpec, FilterError, Operation, RequiredPhase, RequiredSpec,
    };

    use crate::{registry_of, run, shape};

    fn require(field: &str, required: RequiredSpec) -> Arc<FilterRegistry> {
        let mut shape = shape();
        for spec in &mut shape.fields {
            if spec.name == field {
                spec.required = required;
            }
        }
        registry_of(&shape, FilterConfig::default())
    }

    fn required_field(field: &str, phase: RequiredPhase) -> FilterError {
        FilterError::RequiredField {
            field: field.to_owned(),
            phase,
        }
    }

    #[test]
    fn test_should_defer_execution_requirement_to_build() {
        let registry = require(
            "author",
            RequiredSpec {
                on_execution: true,
                ..RequiredSpec::default()
            },
        );
        let mut state = QueryFilterState::parse(registry, "year=gte:2019").unwrap();
        assert_eq!(
            state.build().unwrap_err(),
            required_field("author", RequiredPhase::Execution)
        );

        state
            .add_new_field("author", Operation::Eq, ["Ann"])
            .unwrap();
        assert_eq!(run(&state).unwrap(), vec![1]);
    }

    #[test]
    fn test_should_reject_query_strings_missing_the_field() {
        let registry = require(
            "year",
            RequiredSpec {
                on_string_filter: true,
                ..RequiredSpec::default()
            },
        );
        let err = QueryFilterState::parse(Arc::clone(&registry), "author=eq:Ann").unwrap_err();
        assert_eq!(err, required_field("year", RequiredPhase::StringFilter));

        // Programmatic construction never checks the string-filter phase.
        let state = QueryFilterState::new(Arc::clone(&registry));
        assert!(state.build().is_ok());
        assert!(QueryFilterState::parse(registry, "year=gt:2000").is_ok());
    }

    #[test]
    fn test_should_require_sort_fields_on_build() {
        let registry = require(
            "byYear",
            RequiredSpec {
                on_sort: true,
                ..RequiredSpec::default()
            },
        );
        let mut state = QueryFilterState::parse(registry, "sort=+byAuthor").unwrap();
        assert_eq!(
            state.build().unwrap_err(),
            required_field("byYear", RequiredPhase::Sort)
        );

        state.add_sort_by("byYear", Direction::Desc).unwrap();
        assert_eq!(run(&state).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_should_reject_blocked_fields_in_query_strings_only() {
        let shape = shape().field(FieldSpec::element("secret", ElementSpec::new(["likes"])).blocked());
        let registry = registry_of(&shape, FilterConfig::default());

        let err = QueryFilterState::parse(Arc::clone(&registry), "secret=gt:0").unwrap_err();
        assert!(matches!(err, FilterError::BlockedField { ref field } if field == "secret"));

        let mut state = QueryFilterState::new(registry);
        state.add_new_field("secret", Operation::Gt, ["0"]).unwrap();
        assert_eq!(run(&state).unwrap(), vec![1]);
    }
}
