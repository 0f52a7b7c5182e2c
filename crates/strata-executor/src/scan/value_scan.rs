//! Generic scan path: iterate values, evaluate the comparator per row

use strata_common::{ChunkId, ChunkOffset, PredicateCondition};
use strata_storage::{Element, PositionList, RowPosition, TypedSegment};

/// Evaluate a binary comparison; unsupported conditions never match.
pub(crate) fn compare_matches<T: PartialOrd>(
    condition: PredicateCondition,
    left: &T,
    right: &T,
) -> bool {
    match condition {
        PredicateCondition::Equals => left == right,
        PredicateCondition::NotEquals => left != right,
        PredicateCondition::LessThan => left < right,
        PredicateCondition::LessThanEquals => left <= right,
        PredicateCondition::GreaterThan => left > right,
        PredicateCondition::GreaterThanEquals => left >= right,
        _ => false,
    }
}

/// Single-literal comparison over any segment encoding. Null slots never
/// match.
pub fn scan_segment_binary<T: Element>(
    segment: &TypedSegment<T>,
    chunk_id: ChunkId,
    condition: PredicateCondition,
    value: &T,
    out: &mut PositionList,
) {
    for offset in 0..segment.len() {
        if let Some(candidate) = segment.get(offset) {
            if compare_matches(condition, candidate, value) {
                out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
            }
        }
    }
}

/// Inclusive between over any segment encoding. Null slots never match.
pub fn scan_segment_between<T: Element>(
    segment: &TypedSegment<T>,
    chunk_id: ChunkId,
    lower: &T,
    upper: &T,
    out: &mut PositionList,
) {
    for offset in 0..segment.len() {
        if let Some(candidate) = segment.get(offset) {
            if candidate >= lower && candidate <= upper {
                out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
            }
        }
    }
}

/// `IS NULL` / `IS NOT NULL` straight off the null information.
pub fn scan_segment_nulls<T: Element>(
    segment: &TypedSegment<T>,
    chunk_id: ChunkId,
    want_null: bool,
    out: &mut PositionList,
) {
    for offset in 0..segment.len() {
        if segment.is_null(offset) == want_null {
            out.push(RowPosition::new(chunk_id, ChunkOffset(offset as u32)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::PredicateCondition as Cond;
    use strata_storage::ValueSegment;

    fn segment() -> TypedSegment<i32> {
        TypedSegment::Value(ValueSegment::from_options(vec![
            Some(5),
            None,
            Some(10),
            Some(5),
            Some(20),
        ]))
    }

    fn offsets(out: &PositionList) -> Vec<u32> {
        out.iter().map(|position| position.chunk_offset.0).collect()
    }

    #[test]
    fn test_binary_scan() {
        let segment = segment();
        let mut out = PositionList::new();
        scan_segment_binary(&segment, ChunkId(0), Cond::Equals, &5, &mut out);
        assert_eq!(offsets(&out), vec![0, 3]);

        let mut out = PositionList::new();
        scan_segment_binary(&segment, ChunkId(0), Cond::NotEquals, &5, &mut out);
        assert_eq!(offsets(&out), vec![2, 4]);

        let mut out = PositionList::new();
        scan_segment_binary(&segment, ChunkId(0), Cond::GreaterThanEquals, &10, &mut out);
        assert_eq!(offsets(&out), vec![2, 4]);
    }

    #[test]
    fn test_between_scan_is_inclusive() {
        let segment = segment();
        let mut out = PositionList::new();
        scan_segment_between(&segment, ChunkId(0), &5, &10, &mut out);
        assert_eq!(offsets(&out), vec![0, 2, 3]);
    }

    #[test]
    fn test_null_scan() {
        let segment = segment();
        let mut out = PositionList::new();
        scan_segment_nulls(&segment, ChunkId(0), true, &mut out);
        assert_eq!(offsets(&out), vec![1]);

        let mut out = PositionList::new();
        scan_segment_nulls(&segment, ChunkId(0), false, &mut out);
        assert_eq!(offsets(&out), vec![0, 2, 3, 4]);
    }
}
