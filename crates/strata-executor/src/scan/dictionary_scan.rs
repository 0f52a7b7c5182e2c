//! Dictionary-accelerated scan path
//!
//! The literal is resolved to a single `search_value_id` against the
//! sorted dictionary, after which every row decides on value ids alone:
//!
//! | condition | row matches iff                              |
//! |-----------|----------------------------------------------|
//! | `=`       | `a == search` (dictionary hit checked first) |
//! | `!=`      | `a != search`                                |
//! | `<`, `<=` | `a < search`                                 |
//! | `>`, `>=` | `a >= search`                                |

use strata_common::{
    ChunkId, ChunkOffset, PredicateCondition, Result, StrataError, ValueId, INVALID_VALUE_ID,
};
use strata_storage::{DictionarySegment, Element, PositionList, RowPosition};

fn search_value_id<T: Element>(
    segment: &DictionarySegment<T>,
    condition: PredicateCondition,
    value: &T,
) -> Result<ValueId> {
    match condition {
        PredicateCondition::Equals
        | PredicateCondition::NotEquals
        | PredicateCondition::LessThan
        | PredicateCondition::GreaterThanEquals => Ok(segment.lower_bound(value)),
        PredicateCondition::LessThanEquals | PredicateCondition::GreaterThan => {
            Ok(segment.upper_bound(value))
        }
        other => Err(StrataError::Unsupported(format!(
            "no dictionary scan for condition {}",
            other
        ))),
    }
}

fn matches_all<T: Element>(
    segment: &DictionarySegment<T>,
    condition: PredicateCondition,
    value: &T,
    search: ValueId,
) -> bool {
    match condition {
        PredicateCondition::Equals => {
            search != segment.upper_bound(value) && segment.unique_values_count() == 1
        }
        PredicateCondition::NotEquals => search == segment.upper_bound(value),
        PredicateCondition::LessThan | PredicateCondition::LessThanEquals => {
            search == INVALID_VALUE_ID
        }
        PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
            search == ValueId(0)
        }
        _ => false,
    }
}

fn matches_none<T: Element>(
    segment: &DictionarySegment<T>,
    condition: PredicateCondition,
    value: &T,
    search: ValueId,
) -> bool {
    match condition {
        PredicateCondition::Equals => search == segment.upper_bound(value),
        PredicateCondition::NotEquals => {
            search == segment.upper_bound(value) && segment.unique_values_count() == 1
        }
        PredicateCondition::LessThan | PredicateCondition::LessThanEquals => search == ValueId(0),
        PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
            search == INVALID_VALUE_ID
        }
        _ => false,
    }
}

fn value_id_matches(condition: PredicateCondition, a: ValueId, search: ValueId) -> bool {
    match condition {
        PredicateCondition::Equals => a == search,
        PredicateCondition::NotEquals => a != search,
        PredicateCondition::LessThan | PredicateCondition::LessThanEquals => a < search,
        PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => a >= search,
        _ => false,
    }
}

fn emit_all_non_null<T: Element>(
    segment: &DictionarySegment<T>,
    chunk_id: ChunkId,
    out: &mut PositionList,
) {
    for (offset, id) in segment.attribute_vector().iter().enumerate() {
        if id != INVALID_VALUE_ID {
            out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
        }
    }
}

/// Single-literal comparison on a dictionary segment.
pub fn scan_dictionary_binary<T: Element>(
    segment: &DictionarySegment<T>,
    chunk_id: ChunkId,
    condition: PredicateCondition,
    value: &T,
    out: &mut PositionList,
) -> Result<()> {
    let search = search_value_id(segment, condition, value)?;

    if matches_all(segment, condition, value, search) {
        emit_all_non_null(segment, chunk_id, out);
        return Ok(());
    }
    if matches_none(segment, condition, value, search) {
        return Ok(());
    }

    // Early-outs leave only resolvable searches; null value ids are
    // INVALID and therefore never equal to it.
    debug_assert!(search != INVALID_VALUE_ID);

    for (offset, a) in segment.attribute_vector().iter().enumerate() {
        if a == INVALID_VALUE_ID {
            continue;
        }
        if value_id_matches(condition, a, search) {
            out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
        }
    }
    Ok(())
}

/// Inclusive between on a dictionary segment via the value-id window
/// `(a - left) < (right - left)` in unsigned space; null ids sit outside
/// the window and never match.
pub fn scan_dictionary_between<T: Element>(
    segment: &DictionarySegment<T>,
    chunk_id: ChunkId,
    lower: &T,
    upper: &T,
    out: &mut PositionList,
) {
    let unique = segment.unique_values_count() as u32;
    let left = segment.lower_bound(lower);
    let mut right = segment.upper_bound(upper);
    if right == INVALID_VALUE_ID {
        // bound lookups answer INVALID past the dictionary, the window
        // arithmetic needs the one-past-the-end id instead
        right = ValueId(unique);
    }

    if left == ValueId(0) && right == ValueId(unique) {
        emit_all_non_null(segment, chunk_id, out);
        return;
    }
    // also catches an inverted interval, whose window would be empty
    if left.0 >= unique || right.0 <= left.0 {
        return;
    }

    let window = right.0 - left.0;
    for (offset, a) in segment.attribute_vector().iter().enumerate() {
        if a.0.wrapping_sub(left.0) < window {
            out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::PredicateCondition as Cond;

    // dictionary [10, 20, 30], attribute vector [0, 1, 2, 1, INVALID]
    fn segment() -> DictionarySegment<i32> {
        DictionarySegment::from_options(&[Some(10), Some(20), Some(30), Some(20), None])
    }

    fn scan(condition: Cond, value: i32) -> Vec<u32> {
        let segment = segment();
        let mut out = PositionList::new();
        scan_dictionary_binary(&segment, ChunkId(0), condition, &value, &mut out).unwrap();
        out.iter().map(|position| position.chunk_offset.0).collect()
    }

    fn scan_between(lower: i32, upper: i32) -> Vec<u32> {
        let segment = segment();
        let mut out = PositionList::new();
        scan_dictionary_between(&segment, ChunkId(0), &lower, &upper, &mut out);
        out.iter().map(|position| position.chunk_offset.0).collect()
    }

    #[test]
    fn test_equals() {
        assert_eq!(scan(Cond::Equals, 20), vec![1, 3]);
        // absent value: early-out, nothing scanned
        assert_eq!(scan(Cond::Equals, 25), Vec::<u32>::new());
        assert_eq!(scan(Cond::Equals, 5), Vec::<u32>::new());
    }

    #[test]
    fn test_not_equals() {
        assert_eq!(scan(Cond::NotEquals, 20), vec![0, 2]);
        // absent value matches every non-null row
        assert_eq!(scan(Cond::NotEquals, 25), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_ordered_comparisons() {
        assert_eq!(scan(Cond::LessThan, 20), vec![0]);
        assert_eq!(scan(Cond::LessThanEquals, 20), vec![0, 1, 3]);
        assert_eq!(scan(Cond::GreaterThan, 20), vec![2]);
        assert_eq!(scan(Cond::GreaterThanEquals, 20), vec![1, 2, 3]);
        // literal between two dictionary entries
        assert_eq!(scan(Cond::LessThanEquals, 25), vec![0, 1, 3]);
        assert_eq!(scan(Cond::GreaterThan, 25), vec![2]);
    }

    #[test]
    fn test_early_out_all() {
        // every non-null row is below the literal; nulls stay excluded
        assert_eq!(scan(Cond::LessThan, 100), vec![0, 1, 2, 3]);
        assert_eq!(scan(Cond::GreaterThanEquals, 10), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_early_out_none() {
        assert_eq!(scan(Cond::LessThan, 10), Vec::<u32>::new());
        assert_eq!(scan(Cond::GreaterThan, 30), Vec::<u32>::new());
    }

    #[test]
    fn test_single_entry_dictionary() {
        let segment = DictionarySegment::from_options(&[Some(7), Some(7), None]);
        let mut out = PositionList::new();
        scan_dictionary_binary(&segment, ChunkId(0), Cond::Equals, &7, &mut out).unwrap();
        let offsets: Vec<u32> = out.iter().map(|position| position.chunk_offset.0).collect();
        assert_eq!(offsets, vec![0, 1]);

        let mut out = PositionList::new();
        scan_dictionary_binary(&segment, ChunkId(0), Cond::NotEquals, &7, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_between_window() {
        assert_eq!(scan_between(15, 25), vec![1, 3]);
        assert_eq!(scan_between(10, 30), vec![0, 1, 2, 3]);
        assert_eq!(scan_between(10, 20), vec![0, 1, 3]);
        // empty windows
        assert_eq!(scan_between(21, 29), Vec::<u32>::new());
        assert_eq!(scan_between(31, 40), Vec::<u32>::new());
        assert_eq!(scan_between(25, 15), Vec::<u32>::new());
    }

    #[test]
    fn test_between_upper_bound_past_dictionary() {
        // upper bound beyond the largest value resolves to INVALID and is
        // normalized to the dictionary size
        assert_eq!(scan_between(15, 100), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsupported_condition() {
        let segment = segment();
        let mut out = PositionList::new();
        let result =
            scan_dictionary_binary(&segment, ChunkId(0), Cond::Between, &10, &mut out);
        assert!(result.is_err());
    }
}
