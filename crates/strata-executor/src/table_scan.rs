//! Scan orchestrator: statistics pruning, path choice, position assembly

use crate::scan::{dictionary_scan, sorted_scan, value_scan};
use std::sync::Arc;
use strata_common::{
    CancellationToken, ChunkId, ColumnId, PredicateCondition, Result, StrataError,
};
use strata_storage::{
    with_typed_segment, Chunk, Datum, Element, PositionList, RowPosition, SegmentStatistics,
    Table, TypedSegment,
};

/// A single-column predicate scan over one table.
///
/// Produces the positions of all matching rows, chunk by chunk, in
/// ascending offset order within each chunk. Construction validates the
/// predicate shape and literal kinds; execution is a pure function of the
/// table contents.
pub struct TableScan {
    table: Arc<Table>,
    column_id: ColumnId,
    condition: PredicateCondition,
    value: Datum,
    value2: Option<Datum>,
}

impl TableScan {
    pub fn new(
        table: Arc<Table>,
        column_id: ColumnId,
        condition: PredicateCondition,
        value: Datum,
        value2: Option<Datum>,
    ) -> Result<Self> {
        if !condition.is_supported_by_scan() {
            return Err(StrataError::Unsupported(format!(
                "table scan cannot evaluate condition {}",
                condition
            )));
        }
        let column_kind = table.column_kind(column_id).ok_or_else(|| {
            StrataError::InvalidArgument(format!("table has no {}", column_id))
        })?;
        for literal in std::iter::once(&value).chain(value2.as_ref()) {
            if let Some(kind) = literal.kind() {
                if kind != column_kind {
                    return Err(StrataError::TypeMismatch(format!(
                        "{} literal against {} column {}",
                        kind, column_kind, column_id
                    )));
                }
            }
        }
        if condition == PredicateCondition::Between && value2.is_none() {
            return Err(StrataError::InvalidArgument(
                "between requires an upper bound".to_string(),
            ));
        }
        if condition != PredicateCondition::Between && value2.is_some() {
            return Err(StrataError::InvalidArgument(format!(
                "condition {} takes a single literal",
                condition
            )));
        }
        Ok(Self { table, column_id, condition, value, value2 })
    }

    pub fn execute(&self, cancellation: &CancellationToken) -> Result<PositionList> {
        self.execute_with_filter(cancellation, None)
    }

    /// Scan with an optional position filter: the predicate is applied to
    /// the referenced values, and the filter's own positions are emitted
    /// for the matches.
    pub fn execute_with_filter(
        &self,
        cancellation: &CancellationToken,
        position_filter: Option<&PositionList>,
    ) -> Result<PositionList> {
        let mut out = PositionList::new();

        // Comparing against null yields unknown for every row, and
        // unknown filters the row out.
        if !self.condition.is_null_check() {
            let between_bound_is_null = self.condition == PredicateCondition::Between
                && self.value2.as_ref().is_some_and(|value2| value2.is_null());
            if self.value.is_null() || between_bound_is_null {
                return Ok(out);
            }
        }

        match position_filter {
            Some(filter) => self.scan_filtered(filter, cancellation, &mut out)?,
            None => self.scan_chunks(cancellation, &mut out)?,
        }
        Ok(out)
    }

    fn scan_chunks(&self, cancellation: &CancellationToken, out: &mut PositionList) -> Result<()> {
        for (index, chunk) in self.table.chunks().iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(StrataError::Cancelled);
            }
            let chunk_id = ChunkId(index as u32);
            chunk.access_counter().increment();

            if let Some(statistics) = chunk.statistics(self.column_id) {
                if statistics.can_prune(self.condition, &self.value, self.value2.as_ref()) {
                    tracing::debug!(
                        "pruned {} for {} {} scan",
                        chunk_id,
                        self.column_id,
                        self.condition
                    );
                    continue;
                }
            }

            let segment = chunk.segment(self.column_id).ok_or_else(|| {
                StrataError::Internal(format!("{} missing in {}", self.column_id, chunk_id))
            })?;
            with_typed_segment!(segment.as_ref(), |typed| self
                .scan_typed(typed, chunk.as_ref(), chunk_id, out))?;
        }

        if self.table.chunk_count() == 1 {
            if let Some((column, mode)) = self.table.chunks()[0].ordered_by() {
                if column == self.column_id {
                    out.set_ordered_by(Some((column, mode)));
                }
            }
        }
        Ok(())
    }

    fn scan_typed<T: Element>(
        &self,
        typed: &TypedSegment<T>,
        chunk: &Chunk,
        chunk_id: ChunkId,
        out: &mut PositionList,
    ) -> Result<()> {
        if self.condition.is_null_check() {
            let want_null = self.condition == PredicateCondition::IsNull;
            value_scan::scan_segment_nulls(typed, chunk_id, want_null, out);
            return Ok(());
        }

        let value = self.typed_literal::<T>(&self.value)?;
        let value2 = match &self.value2 {
            Some(value2) => Some(self.typed_literal::<T>(value2)?),
            None => None,
        };

        if let Some((column, mode)) = chunk.ordered_by() {
            if column == self.column_id && sorted_scan::supports(self.condition) {
                tracing::trace!("sorted scan of {} ({:?})", chunk_id, mode);
                return sorted_scan::scan_sorted_segment(
                    typed,
                    chunk_id,
                    mode,
                    self.condition,
                    &value,
                    value2.as_ref(),
                    out,
                );
            }
        }

        match typed {
            TypedSegment::Dictionary(dictionary) => {
                if self.condition == PredicateCondition::Between {
                    let upper = self.between_upper(&value2)?;
                    dictionary_scan::scan_dictionary_between(
                        dictionary, chunk_id, &value, upper, out,
                    );
                    Ok(())
                } else {
                    dictionary_scan::scan_dictionary_binary(
                        dictionary,
                        chunk_id,
                        self.condition,
                        &value,
                        out,
                    )
                }
            }
            TypedSegment::Value(_) => {
                if self.condition == PredicateCondition::Between {
                    let upper = self.between_upper(&value2)?;
                    value_scan::scan_segment_between(typed, chunk_id, &value, upper, out);
                } else {
                    value_scan::scan_segment_binary(typed, chunk_id, self.condition, &value, out);
                }
                Ok(())
            }
        }
    }

    fn scan_filtered(
        &self,
        filter: &PositionList,
        cancellation: &CancellationToken,
        out: &mut PositionList,
    ) -> Result<()> {
        let positions = filter.positions();
        let mut index = 0;
        while index < positions.len() {
            if cancellation.is_cancelled() {
                return Err(StrataError::Cancelled);
            }

            let position = positions[index];
            if position.is_null() {
                // a null reference slot is a null value; only IS NULL sees it
                if self.condition == PredicateCondition::IsNull {
                    out.push(position);
                }
                index += 1;
                continue;
            }

            let run_start = index;
            while index < positions.len()
                && !positions[index].is_null()
                && positions[index].chunk_id == position.chunk_id
            {
                index += 1;
            }
            let run = &positions[run_start..index];

            let chunk = self.table.chunk(position.chunk_id).ok_or_else(|| {
                StrataError::InvalidArgument(format!(
                    "position filter references unknown {}",
                    position.chunk_id
                ))
            })?;
            chunk.access_counter().increment();

            if let Some(statistics) = chunk.statistics(self.column_id) {
                if statistics.can_prune(self.condition, &self.value, self.value2.as_ref()) {
                    continue;
                }
            }

            let segment = chunk.segment(self.column_id).ok_or_else(|| {
                StrataError::Internal(format!(
                    "{} missing in {}",
                    self.column_id, position.chunk_id
                ))
            })?;
            with_typed_segment!(segment.as_ref(), |typed| self
                .scan_typed_filtered(typed, run, out))?;
        }
        Ok(())
    }

    fn scan_typed_filtered<T: Element>(
        &self,
        typed: &TypedSegment<T>,
        run: &[RowPosition],
        out: &mut PositionList,
    ) -> Result<()> {
        if self.condition.is_null_check() {
            let want_null = self.condition == PredicateCondition::IsNull;
            for position in run {
                if typed.is_null(self.checked_offset(typed, position)?) == want_null {
                    out.push(*position);
                }
            }
            return Ok(());
        }

        let value = self.typed_literal::<T>(&self.value)?;
        let value2 = match &self.value2 {
            Some(value2) => Some(self.typed_literal::<T>(value2)?),
            None => None,
        };

        for position in run {
            let offset = self.checked_offset(typed, position)?;
            if let Some(candidate) = typed.get(offset) {
                let matched = if self.condition == PredicateCondition::Between {
                    let upper = self.between_upper(&value2)?;
                    candidate >= &value && candidate <= upper
                } else {
                    value_scan::compare_matches(self.condition, candidate, &value)
                };
                if matched {
                    out.push(*position);
                }
            }
        }
        Ok(())
    }

    fn checked_offset<T: Element>(
        &self,
        typed: &TypedSegment<T>,
        position: &RowPosition,
    ) -> Result<usize> {
        let offset = position.chunk_offset.0 as usize;
        if offset >= typed.len() {
            return Err(StrataError::InvalidArgument(format!(
                "position filter offset {} exceeds chunk of {} rows",
                offset,
                typed.len()
            )));
        }
        Ok(offset)
    }

    fn typed_literal<T: Element>(&self, datum: &Datum) -> Result<T> {
        T::from_datum(datum).ok_or_else(|| {
            StrataError::Internal(format!(
                "literal {:?} does not fit the validated column kind",
                datum
            ))
        })
    }

    fn between_upper<'a, T>(&self, value2: &'a Option<T>) -> Result<&'a T> {
        value2.as_ref().ok_or_else(|| {
            StrataError::Internal("between scan requires two literals".to_string())
        })
    }
}
