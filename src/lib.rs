//! Strata - Column-oriented table-scan and segment-statistics core
//!
//! Facade over the workspace crates: the value domain and segment model
//! (`strata-storage`), pruning and estimation statistics
//! (`strata-statistics`), and the scan operators plus orchestrator
//! (`strata-executor`).

pub use strata_common::{
    CancellationToken, ChunkId, ChunkOffset, ColumnId, EngineConfig, OrderMode,
    PredicateCondition, Result, StrataError, ValueId, INVALID_CHUNK_ID, INVALID_CHUNK_OFFSET,
    INVALID_VALUE_ID,
};
pub use strata_executor::TableScan;
pub use strata_statistics::{
    CardinalityEstimate, ChunkStatistics, EqualDistinctCountHistogram, EstimateKind,
    HistogramBin, HistogramVariant, MinMaxFilter, MinMaxVariant, RangeFilter, RangeVariant,
    StatisticsObject, StringHistogramDomain,
};
pub use strata_storage::{
    chunk_from_record_batch, table_from_record_batches, Chunk, ColumnDefinition, Datum,
    DictionarySegment, ElementKind, PositionList, RowPosition, Segment, SegmentStatistics, Table,
    TypedSegment, ValueSegment, NULL_ROW_POSITION,
};
