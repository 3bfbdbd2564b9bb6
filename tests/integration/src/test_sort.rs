//! Sort tests: order preservation, defaults, grammars and parameter maps.

#[cfg(test)]
mod tests {
    use siftql_core::{FilterConfig, Grammar, QueryFilterState};
    use siftql_model::{Direction, FilterError};

    use crate::{parse, query_ids, registry_of, run, shape, sorts};

    #[test]
    fn test_should_order_rows() {
        assert_eq!(query_ids("sort=-byYear").unwrap(), vec![3, 1, 2]);
        assert_eq!(query_ids("sort=+byYear").unwrap(), vec![2, 1, 3]);
        // Rows without an author sort last.
        assert_eq!(query_ids("sort=-byAuthor").unwrap(), vec![2, 1, 3]);
    }

    #[test]
    fn test_should_preserve_token_order_and_direction() {
        let state = parse("sort=+byAuthor,-byYear").unwrap();
        assert_eq!(
            state.get_sort_fields(),
            sorts(&[("byAuthor", Direction::Asc), ("byYear", Direction::Desc)])
        );
        assert!(state.is_sorted_by("byYear"));

        let state = parse("sort=-byYear&sort=+byAuthor").unwrap();
        assert_eq!(
            state.get_sort_fields(),
            sorts(&[("byYear", Direction::Desc), ("byAuthor", Direction::Asc)])
        );
        let query = state.build().unwrap();
        assert_eq!(query.ordering.len(), 2);
        assert_eq!(query.ordering[0].attribute.attribute, "year");
        assert_eq!(query.ordering[1].attribute.attribute, "name");
    }

    #[test]
    fn test_should_reject_sorting_twice_on_a_field() {
        let err = parse("sort=+byYear,-byYear").unwrap_err();
        assert_eq!(
            err,
            FilterError::MultipleSort {
                field: "byYear".to_owned()
            }
        );
    }

    #[test]
    fn test_should_reject_sorting_on_filter_fields() {
        let err = parse("sort=+year").unwrap_err();
        assert!(matches!(
            err,
            FilterError::NotValuable { ref field, ref usage } if field == "year" && usage == "sorting"
        ));
    }

    #[test]
    fn test_should_fall_back_to_the_default_sort() {
        let shape = shape().sort_by("byYear", Direction::Asc);
        let registry = registry_of(&shape, FilterConfig::default());

        let mut state = QueryFilterState::new(registry);
        assert!(state.is_sorted());
        assert_eq!(run(&state).unwrap(), vec![2, 1, 3]);

        state.add_sort_by("byAuthor", Direction::Desc).unwrap();
        assert_eq!(
            state.get_sort_fields(),
            sorts(&[("byAuthor", Direction::Desc)])
        );

        state.clear_sort();
        assert!(!state.is_sorted());
        assert!(state.build().unwrap().ordering.is_empty());
    }

    #[test]
    fn test_should_parse_the_bracket_grammar() {
        let config = FilterConfig::builder().grammar(Grammar::Bracket).build();
        let registry = registry_of(&shape(), config);
        let state = QueryFilterState::parse(registry, "year[gte]=2021&sort=-byYear").unwrap();
        assert_eq!(run(&state).unwrap(), vec![3, 1]);
    }

    #[test]
    fn test_should_build_from_parameter_maps() {
        let config = FilterConfig::builder().ignore_unknown_keys(true).build();
        let registry = registry_of(&shape(), config);
        let state = QueryFilterState::from_params(
            registry,
            [
                ("year", vec!["gte:2019", "lte:2021"]),
                ("utm_source", vec!["feed"]),
                ("sort", vec!["-byYear"]),
            ],
        )
        .unwrap();
        // The second `year` value replaces the first.
        assert_eq!(run(&state).unwrap(), vec![1, 2]);
    }
}
