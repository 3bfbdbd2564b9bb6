//! Scalar element tests: comparisons, patterns, coercion and arity.

#[cfg(test)]
mod tests {
    use siftql_model::{FilterError, Operation};

    use crate::{parse, query_ids, run};

    #[test]
    fn test_should_compare_numbers() {
        assert_eq!(query_ids("year=gte:2021").unwrap(), vec![1, 3]);
        assert_eq!(query_ids("year=lt:2021").unwrap(), vec![2]);
        assert_eq!(query_ids("year=between:2020,2022").unwrap(), vec![1]);
        assert_eq!(query_ids("year=in:2019,2023").unwrap(), vec![2, 3]);
        assert_eq!(query_ids("year=nin:2019,2023").unwrap(), vec![1]);
    }

    #[test]
    fn test_should_reject_between_with_one_value() {
        let err = query_ids("year=between:2020").unwrap_err();
        assert!(matches!(
            err,
            FilterError::FilterValidity { operation: Operation::Between, .. }
        ));
    }

    #[test]
    fn test_should_reject_in_without_values() {
        let err = query_ids("year=in:").unwrap_err();
        assert!(matches!(
            err,
            FilterError::FilterValidity { operation: Operation::In, .. }
        ));

        let mut state = parse("").unwrap();
        let err = state
            .add_new_field("year", Operation::In, Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err.code().as_str(), "FilterValidityError");
    }

    #[test]
    fn test_should_match_enum_and_boolean_values() {
        assert_eq!(query_ids("status=eq:DRAFT").unwrap(), vec![2]);
        assert_eq!(query_ids("published=eq:false").unwrap(), vec![2]);

        let err = query_ids("status=eq:ARCHIVED").unwrap_err();
        assert!(matches!(err, FilterError::EnumValue { .. }));
        let err = query_ids("year=eq:soon").unwrap_err();
        assert!(matches!(err, FilterError::ValueParse { .. }));
    }

    #[test]
    fn test_should_match_patterns_case_insensitively() {
        // `title` injects `published=eq:true`, which drops the draft review.
        assert_eq!(query_ids("title=like:RUST").unwrap(), vec![1]);
        assert_eq!(query_ids("title=starts:go").unwrap(), vec![3]);
        assert_eq!(query_ids("title=ends:ACTION").unwrap(), vec![1]);
        assert_eq!(query_ids("title=nlike:rust").unwrap(), vec![3]);
    }

    #[test]
    fn test_should_match_text_with_regex() {
        assert_eq!(query_ids("author=regex:^(Ann|Bob)$").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_should_match_null_values() {
        assert_eq!(query_ids("author=isnull:true").unwrap(), vec![3]);
        assert_eq!(query_ids("author=isnull:false").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_should_match_json_keys() {
        assert_eq!(query_ids(r#"meta=eq:{"lang":"en"}"#).unwrap(), vec![1]);
        assert_eq!(query_ids(r#"meta=ne:{"lang":"en"}"#).unwrap(), vec![2]);

        let mut state = parse("").unwrap();
        state
            .add_json_field("meta", Operation::Eq, &serde_json::json!({"lang": "de"}))
            .unwrap();
        assert_eq!(run(&state).unwrap(), vec![2]);

        let err = query_ids("meta=eq:[1]").unwrap_err();
        assert!(matches!(err, FilterError::JsonParse { .. }));
    }

    #[test]
    fn test_should_decode_percent_encoded_values() {
        assert_eq!(query_ids("author=eq:Ann%20").unwrap(), Vec::<i64>::new());
        assert_eq!(query_ids("title=like:rust%20in").unwrap(), vec![1]);
    }

    #[test]
    fn test_should_reject_malformed_segments() {
        assert!(matches!(
            query_ids("year>2020").unwrap_err(),
            FilterError::Parse { .. }
        ));
        assert!(matches!(
            query_ids("nope=eq:1").unwrap_err(),
            FilterError::FieldNotFound { .. }
        ));
        assert!(matches!(
            query_ids("year=almost:1").unwrap_err(),
            FilterError::OperationNotFound { .. }
        ));
    }
}
