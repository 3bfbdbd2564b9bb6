//! Array-typed element tests.

#[cfg(test)]
mod tests {
    use siftql_model::{FilterError, Operation};

    use crate::query_ids;

    #[test]
    fn test_should_select_rows_overlapping_values() {
        assert_eq!(query_ids("tags=ovlp:TAG1,TAG4").unwrap(), vec![1]);
        assert_eq!(query_ids("tags=ovlp:TAG3,TAG5").unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_should_compare_arrays_as_sets() {
        assert_eq!(query_ids("tags=eq:TAG2,TAG1").unwrap(), vec![1]);
        assert_eq!(query_ids("tags=eq:TAG1,TAG2,TAG2").unwrap(), vec![1]);
        assert!(query_ids("tags=eq:TAG1").unwrap().is_empty());
    }

    #[test]
    fn test_should_require_every_value_for_in() {
        assert_eq!(query_ids("tags=in:TAG1").unwrap(), vec![1]);
        assert_eq!(query_ids("tags=in:TAG1,TAG2").unwrap(), vec![1]);
        assert!(query_ids("tags=in:TAG1,TAG3").unwrap().is_empty());
    }

    #[test]
    fn test_should_select_rows_contained_by_values() {
        assert_eq!(query_ids("tags=ctd:TAG1,TAG2,TAG3").unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_should_reject_operations_outside_the_allow_list() {
        let err = query_ids("tags=novlp:TAG1").unwrap_err();
        assert_eq!(
            err,
            FilterError::OperationNotAllowed {
                field: "tags".to_owned(),
                operation: Operation::NotOverlap,
            }
        );
    }

    #[test]
    fn test_should_reject_array_operations_on_scalar_fields() {
        let err = query_ids("year=ovlp:2021").unwrap_err();
        assert!(matches!(
            err,
            FilterError::UnsupportedArrayOperation { ref field, operation: Operation::Overlap } if field == "year"
        ));
    }
}
