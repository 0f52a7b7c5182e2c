//! Sorted-scan accelerator: binary search instead of a linear pass
//!
//! Applies when the scanned chunk carries an `ordered_by` tag for the
//! predicate column. Nulls are grouped at one end per the order mode and
//! excluded from the searched window, so comparison predicates can never
//! emit them.

use strata_common::{ChunkId, ChunkOffset, OrderMode, PredicateCondition, Result, StrataError};
use strata_storage::{Element, PositionList, RowPosition, TypedSegment};

/// Conditions the accelerator answers with one contiguous range.
pub fn supports(condition: PredicateCondition) -> bool {
    matches!(
        condition,
        PredicateCondition::Equals
            | PredicateCondition::LessThan
            | PredicateCondition::LessThanEquals
            | PredicateCondition::GreaterThan
            | PredicateCondition::GreaterThanEquals
            | PredicateCondition::Between
    )
}

/// First offset in `[start, end)` where `pred(value)` turns false. The
/// window must not contain nulls; a null inside it breaks the ordering
/// contract of the tag.
fn partition_offset<T: Element>(
    segment: &TypedSegment<T>,
    start: usize,
    end: usize,
    pred: impl Fn(&T) -> bool,
) -> Result<usize> {
    let mut low = start;
    let mut high = end;
    while low < high {
        let mid = low + (high - low) / 2;
        let value = segment.get(mid).ok_or_else(|| {
            StrataError::Internal(
                "null inside the value window of a sorted-tagged segment".to_string(),
            )
        })?;
        if pred(value) {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    Ok(low)
}

/// Emit the contiguous offset range matching the predicate.
pub fn scan_sorted_segment<T: Element>(
    segment: &TypedSegment<T>,
    chunk_id: ChunkId,
    order: OrderMode,
    condition: PredicateCondition,
    value: &T,
    value2: Option<&T>,
    out: &mut PositionList,
) -> Result<()> {
    let row_count = segment.len();
    let null_count = segment.null_count();
    let (start, end) = if order.nulls_first() {
        (null_count, row_count)
    } else {
        (0, row_count - null_count)
    };

    let (first, last) = if order.is_ascending() {
        let lower = |v| partition_offset(segment, start, end, move |x| x < v);
        let upper = |v| partition_offset(segment, start, end, move |x| x <= v);
        match condition {
            PredicateCondition::Equals => (lower(value)?, upper(value)?),
            PredicateCondition::LessThan => (start, lower(value)?),
            PredicateCondition::LessThanEquals => (start, upper(value)?),
            PredicateCondition::GreaterThan => (upper(value)?, end),
            PredicateCondition::GreaterThanEquals => (lower(value)?, end),
            PredicateCondition::Between => {
                let upper_value = between_upper(value2)?;
                (lower(value)?, upper(upper_value)?)
            }
            other => return unsupported(other),
        }
    } else {
        // descending: the matching block sits mirrored
        let first_le = |v| partition_offset(segment, start, end, move |x| x > v);
        let first_lt = |v| partition_offset(segment, start, end, move |x| x >= v);
        match condition {
            PredicateCondition::Equals => (first_le(value)?, first_lt(value)?),
            PredicateCondition::LessThan => (first_lt(value)?, end),
            PredicateCondition::LessThanEquals => (first_le(value)?, end),
            PredicateCondition::GreaterThan => (start, first_le(value)?),
            PredicateCondition::GreaterThanEquals => (start, first_lt(value)?),
            PredicateCondition::Between => {
                let upper_value = between_upper(value2)?;
                (first_le(upper_value)?, first_lt(value)?)
            }
            other => return unsupported(other),
        }
    };

    for offset in first..last {
        out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
    }
    Ok(())
}

fn between_upper<T>(value2: Option<&T>) -> Result<&T> {
    value2.ok_or_else(|| {
        StrataError::Internal("sorted between scan requires two literals".to_string())
    })
}

fn unsupported(condition: PredicateCondition) -> Result<()> {
    Err(StrataError::Unsupported(format!(
        "no sorted scan for condition {}",
        condition
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::PredicateCondition as Cond;
    use strata_storage::ValueSegment;

    fn ascending() -> TypedSegment<i32> {
        TypedSegment::Value(ValueSegment::new((0..10).collect()))
    }

    fn descending() -> TypedSegment<i32> {
        TypedSegment::Value(ValueSegment::new((0..10).rev().collect()))
    }

    fn scan(
        segment: &TypedSegment<i32>,
        order: OrderMode,
        condition: Cond,
        value: i32,
        value2: Option<i32>,
    ) -> Vec<u32> {
        let mut out = PositionList::new();
        scan_sorted_segment(segment, ChunkId(0), order, condition, &value, value2.as_ref(), &mut out)
            .unwrap();
        out.iter().map(|position| position.chunk_offset.0).collect()
    }

    #[test]
    fn test_ascending() {
        let segment = ascending();
        let order = OrderMode::AscNullsFirst;
        assert_eq!(scan(&segment, order, Cond::Equals, 5, None), vec![5]);
        assert_eq!(scan(&segment, order, Cond::Equals, 42, None), Vec::<u32>::new());
        assert_eq!(scan(&segment, order, Cond::LessThan, 5, None), vec![0, 1, 2, 3, 4]);
        assert_eq!(scan(&segment, order, Cond::LessThanEquals, 5, None), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(scan(&segment, order, Cond::GreaterThan, 6, None), vec![7, 8, 9]);
        assert_eq!(scan(&segment, order, Cond::GreaterThanEquals, 6, None), vec![6, 7, 8, 9]);
        assert_eq!(scan(&segment, order, Cond::Between, 3, Some(6)), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_descending() {
        let segment = descending();
        let order = OrderMode::DescNullsFirst;
        assert_eq!(scan(&segment, order, Cond::Equals, 5, None), vec![4]);
        assert_eq!(scan(&segment, order, Cond::LessThan, 5, None), vec![5, 6, 7, 8, 9]);
        assert_eq!(scan(&segment, order, Cond::LessThanEquals, 5, None), vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(scan(&segment, order, Cond::GreaterThan, 6, None), vec![0, 1, 2]);
        assert_eq!(scan(&segment, order, Cond::GreaterThanEquals, 6, None), vec![0, 1, 2, 3]);
        assert_eq!(scan(&segment, order, Cond::Between, 3, Some(6)), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_nulls_first_window() {
        let mut values: Vec<Option<i32>> = vec![None, None];
        values.extend((0..5).map(Some));
        let segment = TypedSegment::Value(ValueSegment::from_options(values));

        let offsets = scan(&segment, OrderMode::AscNullsFirst, Cond::LessThan, 2, None);
        assert_eq!(offsets, vec![2, 3]);
        // nulls are never part of a comparison result
        let offsets = scan(&segment, OrderMode::AscNullsFirst, Cond::GreaterThanEquals, 0, None);
        assert_eq!(offsets, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_nulls_last_window() {
        let mut values: Vec<Option<i32>> = (0..5).map(Some).collect();
        values.push(None);
        values.push(None);
        let segment = TypedSegment::Value(ValueSegment::from_options(values));

        let offsets = scan(&segment, OrderMode::AscNullsLast, Cond::GreaterThan, 2, None);
        assert_eq!(offsets, vec![3, 4]);
    }

    #[test]
    fn test_descending_nulls_last() {
        let mut values: Vec<Option<i32>> = (0..5).rev().map(Some).collect();
        values.push(None);
        let segment = TypedSegment::Value(ValueSegment::from_options(values));

        let offsets = scan(&segment, OrderMode::DescNullsLast, Cond::LessThanEquals, 1, None);
        assert_eq!(offsets, vec![3, 4]);
    }

    #[test]
    fn test_works_on_dictionary_segments() {
        let values: Vec<Option<i32>> = (0..10).map(Some).collect();
        let segment = TypedSegment::Value(ValueSegment::from_options(values)).to_dictionary();
        let offsets = scan(&segment, OrderMode::AscNullsFirst, Cond::Between, 3, Some(6));
        assert_eq!(offsets, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_not_equals_unsupported() {
        assert!(!supports(Cond::NotEquals));
        let segment = ascending();
        let mut out = PositionList::new();
        let result = scan_sorted_segment(
            &segment,
            ChunkId(0),
            OrderMode::AscNullsFirst,
            Cond::NotEquals,
            &5,
            None,
            &mut out,
        );
        assert!(result.is_err());
    }
}
