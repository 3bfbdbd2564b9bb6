//! Named predicate tests.

#[cfg(test)]
mod tests {
    use siftql_core::{FilterConfig, QueryFilterState};
    use siftql_model::{ElementSpec, FieldSpec, FilterError, Operation, PredicateSpec};

    use crate::{parse, registry_of, run, shape};

    #[test]
    fn test_should_union_groups_that_and_leaves_empty() {
        let mut state = parse("likes=gt:0&shares=gt:0").unwrap();
        assert!(run(&state).unwrap().is_empty());

        state.set_predicate("OR_LIKES").unwrap();
        assert_eq!(run(&state).unwrap(), vec![1, 2]);

        state.clear_predicate();
        assert!(run(&state).unwrap().is_empty());
    }

    #[test]
    fn test_should_and_fields_outside_the_predicate() {
        let mut state = parse("likes=gt:0&shares=gt:0&type=eq:R").unwrap();
        state.set_predicate("OR_LIKES").unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);
    }

    #[test]
    fn test_should_drop_absent_fields_from_the_predicate() {
        let mut state = parse("shares=gt:0").unwrap();
        state.set_predicate("OR_LIKES").unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);
    }

    #[test]
    fn test_should_substitute_absent_fields_when_configured() {
        let shape = shape().predicate(
            PredicateSpec::new("LIKED_OR_UNKNOWN_AUTHOR", "likes OR author")
                .include_missing(Operation::IsNull, ["true"]),
        );
        let registry = registry_of(&shape, FilterConfig::default());
        let mut state = QueryFilterState::parse(registry, "likes=gt:5").unwrap();
        state.set_predicate("LIKED_OR_UNKNOWN_AUTHOR").unwrap();
        // likes > 5 OR author.name IS NULL
        assert_eq!(run(&state).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_should_drop_absent_fields_that_take_no_substitute() {
        let shape = shape()
            .predicate(
                PredicateSpec::new("TYPED", "type OR title")
                    .include_missing(Operation::IsNull, ["true"]),
            )
            .predicate(
                PredicateSpec::new("COMMENTED", "comments OR title")
                    .include_missing(Operation::IsNull, ["true"]),
            );
        let registry = registry_of(&shape, FilterConfig::default());
        assert_eq!(registry.predicate("TYPED").unwrap().unsubstituted, vec!["type"]);

        // type = R OR title IS NULL
        let mut state = QueryFilterState::parse(registry.clone(), "type=eq:R").unwrap();
        state.set_predicate("TYPED").unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);

        // the absent discriminator drops out; published is defaulted by title
        let mut state = QueryFilterState::parse(registry.clone(), "title=like:go").unwrap();
        state.set_predicate("TYPED").unwrap();
        assert_eq!(run(&state).unwrap(), vec![3]);

        let mut state = QueryFilterState::parse(registry, "comments=eq:0").unwrap();
        state.set_predicate("COMMENTED").unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);
    }

    #[test]
    fn test_should_substitute_fields_with_blank_values() {
        let shape = shape()
            .field(FieldSpec::element(
                "authorName",
                ElementSpec::new(["author.name"]).ignore_blank(),
            ))
            .predicate(
                PredicateSpec::new("LIKED_OR_ANONYMOUS", "likes OR authorName")
                    .include_missing(Operation::IsNull, ["true"]),
            );
        let registry = registry_of(&shape, FilterConfig::default());
        let mut state =
            QueryFilterState::parse(registry, "likes=gt:5&authorName=eq:").unwrap();
        assert!(state.is_filtering("authorName"));
        state.set_predicate("LIKED_OR_ANONYMOUS").unwrap();
        // likes > 5 OR author.name IS NULL
        assert_eq!(run(&state).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_should_reject_unknown_predicates() {
        let mut state = parse("").unwrap();
        let err = state.set_predicate("NOPE").unwrap_err();
        assert_eq!(
            err,
            FilterError::PredicateNotFound {
                name: "NOPE".to_owned()
            }
        );
    }
}
