//! Chunks: horizontal partitions holding one segment per column

use crate::access_counter::AccessCounter;
use crate::segment::Segment;
use crate::value::Datum;
use parking_lot::RwLock;
use std::sync::Arc;
use strata_common::{ColumnId, OrderMode, PredicateCondition, Result, StrataError};

/// Pruning surface a per-segment statistics object exposes to the scan.
///
/// Implemented by the statistics crate; kept as a trait here so chunks can
/// carry statistics without a crate cycle. `true` is a guarantee that no
/// non-null row of the segment satisfies the predicate.
pub trait SegmentStatistics: Send + Sync {
    fn can_prune(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> bool;
}

/// A horizontal partition of a table. All segments share row indices.
///
/// Segment data is immutable once the chunk is assembled; the statistics
/// slots are assigned once after construction and only read afterwards.
pub struct Chunk {
    segments: Vec<Arc<Segment>>,
    ordered_by: Option<(ColumnId, OrderMode)>,
    statistics: RwLock<Vec<Option<Arc<dyn SegmentStatistics>>>>,
    access_counter: AccessCounter,
}

impl Chunk {
    pub fn new(segments: Vec<Arc<Segment>>) -> Result<Self> {
        if let Some(first) = segments.first() {
            let row_count = first.len();
            for (index, segment) in segments.iter().enumerate() {
                if segment.len() != row_count {
                    return Err(StrataError::InvalidArgument(format!(
                        "segment {} holds {} rows, chunk holds {}",
                        index,
                        segment.len(),
                        row_count
                    )));
                }
            }
        }
        let slots = vec![None; segments.len()];
        Ok(Self {
            segments,
            ordered_by: None,
            statistics: RwLock::new(slots),
            access_counter: AccessCounter::default(),
        })
    }

    pub fn with_ordered_by(mut self, column_id: ColumnId, mode: OrderMode) -> Self {
        self.ordered_by = Some((column_id, mode));
        self
    }

    pub fn with_access_history_capacity(mut self, capacity: usize) -> Self {
        self.access_counter = AccessCounter::new(capacity);
        self
    }

    pub fn size(&self) -> usize {
        self.segments.first().map(|segment| segment.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, column_id: ColumnId) -> Option<&Arc<Segment>> {
        self.segments.get(column_id.0 as usize)
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    pub fn ordered_by(&self) -> Option<(ColumnId, OrderMode)> {
        self.ordered_by
    }

    pub fn access_counter(&self) -> &AccessCounter {
        &self.access_counter
    }

    /// Attach a statistics object to one column. Assigned once, after the
    /// chunk's data is final.
    pub fn set_statistics(&self, column_id: ColumnId, statistics: Arc<dyn SegmentStatistics>) {
        let mut slots = self.statistics.write();
        if let Some(slot) = slots.get_mut(column_id.0 as usize) {
            *slot = Some(statistics);
        }
    }

    pub fn statistics(&self, column_id: ColumnId) -> Option<Arc<dyn SegmentStatistics>> {
        self.statistics.read().get(column_id.0 as usize).and_then(|slot| slot.clone())
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("rows", &self.size())
            .field("columns", &self.column_count())
            .field("ordered_by", &self.ordered_by)
            .finish()
    }
}
