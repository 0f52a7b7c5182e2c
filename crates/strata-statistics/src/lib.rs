//! Strata Statistics - Per-segment pruning filters and cardinality estimates

pub mod estimate;
pub mod histogram;
pub mod min_max_filter;
pub mod object;
pub mod range_filter;

pub use estimate::{CardinalityEstimate, EstimateKind};
pub use histogram::{
    EqualDistinctCountHistogram, HistogramBin, HistogramElement, StringHistogramDomain,
};
pub use min_max_filter::MinMaxFilter;
pub use object::{ChunkStatistics, HistogramVariant, MinMaxVariant, RangeVariant, StatisticsObject};
pub use range_filter::{RangeElement, RangeFilter};
