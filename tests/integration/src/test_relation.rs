//! Relationship tests: joins, correlated subqueries and collection sizes.

#[cfg(test)]
mod tests {
    use siftql_core::{FilterConfig, QueryFilterState};
    use siftql_model::{Condition, ElementSpec, FieldSpec, FilterError, JoinKind, Operation};

    use crate::{parse, query_ids, registry_of, run, shape};

    #[test]
    fn test_should_filter_through_to_one_relations() {
        assert_eq!(query_ids("author=eq:Bob").unwrap(), vec![2]);
        assert_eq!(query_ids("author=ne:Bob").unwrap(), vec![1]);
    }

    #[test]
    fn test_should_share_joins_between_filter_and_sort() {
        let state = parse("author=in:Ann,Bob&sort=-byAuthor").unwrap();
        let query = state.build().unwrap();
        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins[0].attribute, "author");
        assert_eq!(query.joins[0].kind, JoinKind::Fetch);
        assert_eq!(run(&state).unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_should_keep_inner_joins_when_sorting_on_the_same_relation() {
        let shape = shape().field(FieldSpec::element(
            "authorInner",
            ElementSpec::new(["author.name"]).joins([JoinKind::Inner]),
        ));
        let registry = registry_of(&shape, FilterConfig::default());

        let unsorted = QueryFilterState::parse(registry.clone(), "authorInner=isnull:true").unwrap();
        assert_eq!(run(&unsorted).unwrap(), Vec::<i64>::new());

        let sorted =
            QueryFilterState::parse(registry, "authorInner=isnull:true&sort=+byAuthor").unwrap();
        let query = sorted.build().unwrap();
        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins[0].kind, JoinKind::InnerFetch);
        assert_eq!(run(&sorted).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_should_correlate_subquery_elements() {
        assert_eq!(query_ids("commentBody=eq:great").unwrap(), vec![1]);
        assert_eq!(query_ids("commentBody=in:meh,nice").unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_should_negate_outside_the_existence_check() {
        let state = parse("commentBody=nin:great").unwrap();
        let query = state.build().unwrap();
        assert!(matches!(
            query.condition,
            Some(Condition::Not { ref condition }) if matches!(**condition, Condition::Exists { .. })
        ));
        assert_eq!(query.joins[0].kind, JoinKind::Exists);
        // Posts without comments have no comment reading "great" either.
        assert_eq!(run(&state).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_should_compare_collection_sizes() {
        assert_eq!(query_ids("comments=eq:0").unwrap(), vec![2]);
        assert_eq!(query_ids("comments=gte:1").unwrap(), vec![1, 3]);
        assert_eq!(query_ids("comments=gt:1").unwrap(), vec![1]);

        let query = parse("comments=gt:1").unwrap().build().unwrap();
        assert!(query.joins.is_empty());
    }

    #[test]
    fn test_should_filter_collection_sizes_through_the_api() {
        let mut state = parse("").unwrap();
        state
            .add_collection_field("comments", Operation::Lt, 2)
            .unwrap();
        assert_eq!(run(&state).unwrap(), vec![2, 3]);

        state
            .override_collection_field("comments", Operation::Eq, 2)
            .unwrap();
        assert_eq!(run(&state).unwrap(), vec![1]);

        let err = state
            .add_collection_field("comments", Operation::Like, 2)
            .unwrap_err();
        assert!(matches!(err, FilterError::OperationNotAllowed { .. }));
    }
}
