//! Filter state tests: overrides, triggers, introspection and computed values.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use siftql_core::{ExpressionEvaluator, FieldValue, QueryFilterState};
    use siftql_model::{FilterError, Operation};

    use crate::{parse, registry, run};

    fn names(state: &QueryFilterState) -> Vec<String> {
        state
            .get_all_field_values()
            .into_iter()
            .map(|v| v.name)
            .collect()
    }

    #[test]
    fn test_should_round_trip_parsed_values() {
        let parsed = parse("year=between:2000,2010").unwrap();
        let mut built = parse("").unwrap();
        built
            .add_new_field("year", Operation::Between, ["2000", "2010"])
            .unwrap();
        assert_eq!(parsed.get_actual_value("year"), built.get_actual_value("year"));
        assert_eq!(
            parsed.get_actual_value("year"),
            Some(FieldValue {
                name: "year".to_owned(),
                operation: Operation::Between,
                values: vec!["2000".to_owned(), "2010".to_owned()],
            })
        );
    }

    #[test]
    fn test_should_override_idempotently_in_place() {
        let mut once = parse("year=gte:2000&author=eq:Ann").unwrap();
        once.override_field("year", Operation::Lte, ["2021"]).unwrap();
        let mut twice = once.clone();
        twice.override_field("year", Operation::Lte, ["2021"]).unwrap();

        assert_eq!(once.get_all_field_values(), twice.get_all_field_values());
        assert_eq!(once.build().unwrap(), twice.build().unwrap());
        assert_eq!(names(&once), ["year", "author"]);
        assert_eq!(run(&once).unwrap(), vec![1]);
    }

    #[test]
    fn test_should_move_re_added_fields_to_the_end() {
        let mut state = parse("year=gte:2000&author=eq:Ann").unwrap();
        state.add_new_field("year", Operation::Lte, ["2021"]).unwrap();
        assert_eq!(names(&state), ["author", "year"]);
    }

    #[test]
    fn test_should_restore_triggered_defaults_after_delete_and_re_add() {
        let mut state = parse("title=like:rust").unwrap();
        assert!(state.is_filtering("published"));
        let before = state.get_all_field_values();
        assert_eq!(run(&state).unwrap(), vec![1]);

        assert!(state.delete_field("title"));
        assert!(!state.is_filtering("published"));
        assert_eq!(run(&state).unwrap(), vec![1, 2, 3]);

        state
            .add_new_field("title", Operation::Like, ["rust"])
            .unwrap();
        assert_eq!(state.get_all_field_values(), before);
        assert_eq!(run(&state).unwrap(), vec![1]);

        assert!(!state.delete_field("status"));
    }

    #[test]
    fn test_should_keep_overridden_defaults_when_the_trigger_goes() {
        let mut state = parse("title=like:rust").unwrap();
        state
            .override_field("published", Operation::Eq, ["false"])
            .unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);

        state.delete_field("title");
        assert!(state.is_filtering("published"));
        assert_eq!(run(&state).unwrap(), vec![2]);
    }

    #[test]
    fn test_should_reject_api_variants_of_other_kinds() {
        let mut state = parse("").unwrap();
        let err = state
            .add_json_field("year", Operation::Eq, &serde_json::json!({"a": 1}))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::NotValuable { ref field, .. } if field == "year"
        ));
        let err = state.add_new_field("byYear", Operation::Eq, ["1"]).unwrap_err();
        assert!(matches!(err, FilterError::NotValuable { .. }));
        assert!(!state.is_filtering("year"));
    }

    #[derive(Debug)]
    struct Echo;

    impl ExpressionEvaluator for Echo {
        fn evaluate(
            &self,
            expression: &str,
            context: &BTreeMap<String, Vec<String>>,
        ) -> Result<Vec<String>, String> {
            context
                .get(expression)
                .cloned()
                .ok_or_else(|| format!("'{expression}' is not filtered"))
        }
    }

    #[test]
    fn test_should_compute_values_from_earlier_fields() {
        let mut state = QueryFilterState::new(registry()).with_evaluator(Arc::new(Echo));
        state
            .add_computed_field("shares", Operation::Eq, "likes")
            .unwrap();
        state.add_new_field("likes", Operation::Eq, ["0"]).unwrap();
        assert_eq!(run(&state).unwrap(), vec![3]);

        state.delete_field("likes");
        let err = state.build().unwrap_err();
        assert!(matches!(err, FilterError::Expression { ref field, .. } if field == "shares"));
    }

    #[test]
    fn test_should_fail_computed_values_without_evaluator() {
        let mut state = parse("").unwrap();
        state
            .add_computed_field("shares", Operation::Eq, "likes")
            .unwrap();
        assert!(matches!(
            state.build().unwrap_err(),
            FilterError::Expression { .. }
        ));
    }

    #[test]
    fn test_should_reject_computed_values_for_non_element_fields() {
        let mut state = QueryFilterState::new(registry()).with_evaluator(Arc::new(Echo));
        for field in ["type", "comments", "meta", "byYear"] {
            let err = state
                .add_computed_field(field, Operation::Eq, "likes")
                .unwrap_err();
            assert_eq!(
                err,
                FilterError::NotValuable {
                    field: field.to_owned(),
                    usage: "element values".to_owned(),
                }
            );
            assert!(!state.is_filtering(field));
        }
    }
}
