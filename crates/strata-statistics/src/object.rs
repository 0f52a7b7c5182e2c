//! Kind-erased statistics objects and their per-segment builders

use crate::estimate::CardinalityEstimate;
use crate::histogram::{EqualDistinctCountHistogram, StringHistogramDomain};
use crate::min_max_filter::MinMaxFilter;
use crate::range_filter::{RangeElement, RangeFilter};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use strata_common::{
    ColumnId, EngineConfig, PredicateCondition, Result, StrataError,
};
use strata_storage::{
    Chunk, Datum, Element, ElementKind, Segment, SegmentStatistics, TypedSegment,
};

/// Min-max filter over any element kind.
#[derive(Debug, Clone)]
pub enum MinMaxVariant {
    Int32(MinMaxFilter<i32>),
    Int64(MinMaxFilter<i64>),
    Float32(MinMaxFilter<f32>),
    Float64(MinMaxFilter<f64>),
    Text(MinMaxFilter<String>),
}

/// Range filter over the scalar element kinds.
#[derive(Debug, Clone)]
pub enum RangeVariant {
    Int32(RangeFilter<i32>),
    Int64(RangeFilter<i64>),
    Float32(RangeFilter<f32>),
    Float64(RangeFilter<f64>),
}

/// Histogram over any element kind; text histograms carry the domain
/// applied to literals before comparison.
#[derive(Debug, Clone)]
pub enum HistogramVariant {
    Int32(EqualDistinctCountHistogram<i32>),
    Int64(EqualDistinctCountHistogram<i64>),
    Float32(EqualDistinctCountHistogram<f32>),
    Float64(EqualDistinctCountHistogram<f64>),
    Text {
        histogram: EqualDistinctCountHistogram<String>,
        domain: StringHistogramDomain,
    },
}

/// One statistic describing one segment: the family tag plus the typed
/// data underneath. Immutable; `sliced`/`scaled` return new objects.
#[derive(Debug, Clone)]
pub enum StatisticsObject {
    MinMax(MinMaxVariant),
    Range(RangeVariant),
    Histogram(HistogramVariant),
}

macro_rules! with_min_max {
    ($variant:expr, |$filter:ident| $body:expr) => {
        match $variant {
            MinMaxVariant::Int32($filter) => $body,
            MinMaxVariant::Int64($filter) => $body,
            MinMaxVariant::Float32($filter) => $body,
            MinMaxVariant::Float64($filter) => $body,
            MinMaxVariant::Text($filter) => $body,
        }
    };
}

macro_rules! with_range {
    ($variant:expr, |$filter:ident| $body:expr) => {
        match $variant {
            RangeVariant::Int32($filter) => $body,
            RangeVariant::Int64($filter) => $body,
            RangeVariant::Float32($filter) => $body,
            RangeVariant::Float64($filter) => $body,
        }
    };
}

impl StatisticsObject {
    /// True only if certainly no non-null row of the described segment
    /// satisfies the predicate. Unsupported conditions, null literals, and
    /// kind mismatches never prune.
    pub fn can_prune(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> bool {
        match self {
            StatisticsObject::MinMax(variant) => {
                with_min_max!(variant, |filter| filter.does_not_contain(condition, value, value2))
            }
            StatisticsObject::Range(variant) => {
                with_range!(variant, |filter| filter.does_not_contain(condition, value, value2))
            }
            StatisticsObject::Histogram(variant) => match variant {
                HistogramVariant::Int32(histogram) => {
                    histogram.does_not_contain(condition, value, value2)
                }
                HistogramVariant::Int64(histogram) => {
                    histogram.does_not_contain(condition, value, value2)
                }
                HistogramVariant::Float32(histogram) => {
                    histogram.does_not_contain(condition, value, value2)
                }
                HistogramVariant::Float64(histogram) => {
                    histogram.does_not_contain(condition, value, value2)
                }
                HistogramVariant::Text { histogram, domain } => {
                    let value = domain.reduce_datum(value);
                    let value2 = value2.map(|value2| domain.reduce_datum(value2));
                    histogram.does_not_contain(condition, &value, value2.as_ref())
                }
            },
        }
    }

    /// Estimate with a three-state tag; `MatchesNone` exactly when
    /// [`Self::can_prune`] holds.
    pub fn estimate_cardinality(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> CardinalityEstimate {
        match self {
            StatisticsObject::MinMax(variant) => {
                with_min_max!(variant, |filter| filter
                    .estimate_cardinality(condition, value, value2))
            }
            StatisticsObject::Range(variant) => {
                with_range!(variant, |filter| filter
                    .estimate_cardinality(condition, value, value2))
            }
            StatisticsObject::Histogram(variant) => match variant {
                HistogramVariant::Int32(histogram) => {
                    histogram.estimate_cardinality(condition, value, value2)
                }
                HistogramVariant::Int64(histogram) => {
                    histogram.estimate_cardinality(condition, value, value2)
                }
                HistogramVariant::Float32(histogram) => {
                    histogram.estimate_cardinality(condition, value, value2)
                }
                HistogramVariant::Float64(histogram) => {
                    histogram.estimate_cardinality(condition, value, value2)
                }
                HistogramVariant::Text { histogram, domain } => {
                    let value = domain.reduce_datum(value);
                    let value2 = value2.map(|value2| domain.reduce_datum(value2));
                    histogram.estimate_cardinality(condition, &value, value2.as_ref())
                }
            },
        }
    }

    /// Statistic describing the segment after the predicate, or `None`
    /// when the result would be empty.
    pub fn sliced(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> Option<StatisticsObject> {
        match self {
            StatisticsObject::MinMax(variant) => match variant {
                MinMaxVariant::Int32(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::MinMax(MinMaxVariant::Int32(f))),
                MinMaxVariant::Int64(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::MinMax(MinMaxVariant::Int64(f))),
                MinMaxVariant::Float32(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::MinMax(MinMaxVariant::Float32(f))),
                MinMaxVariant::Float64(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::MinMax(MinMaxVariant::Float64(f))),
                MinMaxVariant::Text(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::MinMax(MinMaxVariant::Text(f))),
            },
            StatisticsObject::Range(variant) => match variant {
                RangeVariant::Int32(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::Range(RangeVariant::Int32(f))),
                RangeVariant::Int64(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::Range(RangeVariant::Int64(f))),
                RangeVariant::Float32(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::Range(RangeVariant::Float32(f))),
                RangeVariant::Float64(filter) => filter
                    .sliced(condition, value, value2)
                    .map(|f| StatisticsObject::Range(RangeVariant::Float64(f))),
            },
            StatisticsObject::Histogram(variant) => match variant {
                HistogramVariant::Int32(histogram) => histogram
                    .sliced(condition, value, value2)
                    .map(|h| StatisticsObject::Histogram(HistogramVariant::Int32(h))),
                HistogramVariant::Int64(histogram) => histogram
                    .sliced(condition, value, value2)
                    .map(|h| StatisticsObject::Histogram(HistogramVariant::Int64(h))),
                HistogramVariant::Float32(histogram) => histogram
                    .sliced(condition, value, value2)
                    .map(|h| StatisticsObject::Histogram(HistogramVariant::Float32(h))),
                HistogramVariant::Float64(histogram) => histogram
                    .sliced(condition, value, value2)
                    .map(|h| StatisticsObject::Histogram(HistogramVariant::Float64(h))),
                HistogramVariant::Text { histogram, domain } => {
                    let value = domain.reduce_datum(value);
                    let value2 = value2.map(|value2| domain.reduce_datum(value2));
                    histogram.sliced(condition, &value, value2.as_ref()).map(|h| {
                        StatisticsObject::Histogram(HistogramVariant::Text {
                            histogram: h,
                            domain: *domain,
                        })
                    })
                }
            },
        }
    }

    /// Statistic for a selectivity-reduced copy of the segment.
    pub fn scaled(&self, selectivity: f64) -> StatisticsObject {
        match self {
            StatisticsObject::MinMax(variant) => match variant {
                MinMaxVariant::Int32(f) => {
                    StatisticsObject::MinMax(MinMaxVariant::Int32(f.scaled(selectivity)))
                }
                MinMaxVariant::Int64(f) => {
                    StatisticsObject::MinMax(MinMaxVariant::Int64(f.scaled(selectivity)))
                }
                MinMaxVariant::Float32(f) => {
                    StatisticsObject::MinMax(MinMaxVariant::Float32(f.scaled(selectivity)))
                }
                MinMaxVariant::Float64(f) => {
                    StatisticsObject::MinMax(MinMaxVariant::Float64(f.scaled(selectivity)))
                }
                MinMaxVariant::Text(f) => {
                    StatisticsObject::MinMax(MinMaxVariant::Text(f.scaled(selectivity)))
                }
            },
            StatisticsObject::Range(variant) => match variant {
                RangeVariant::Int32(f) => {
                    StatisticsObject::Range(RangeVariant::Int32(f.scaled(selectivity)))
                }
                RangeVariant::Int64(f) => {
                    StatisticsObject::Range(RangeVariant::Int64(f.scaled(selectivity)))
                }
                RangeVariant::Float32(f) => {
                    StatisticsObject::Range(RangeVariant::Float32(f.scaled(selectivity)))
                }
                RangeVariant::Float64(f) => {
                    StatisticsObject::Range(RangeVariant::Float64(f.scaled(selectivity)))
                }
            },
            StatisticsObject::Histogram(variant) => match variant {
                HistogramVariant::Int32(h) => {
                    StatisticsObject::Histogram(HistogramVariant::Int32(h.scaled(selectivity)))
                }
                HistogramVariant::Int64(h) => {
                    StatisticsObject::Histogram(HistogramVariant::Int64(h.scaled(selectivity)))
                }
                HistogramVariant::Float32(h) => {
                    StatisticsObject::Histogram(HistogramVariant::Float32(h.scaled(selectivity)))
                }
                HistogramVariant::Float64(h) => {
                    StatisticsObject::Histogram(HistogramVariant::Float64(h.scaled(selectivity)))
                }
                HistogramVariant::Text { histogram, domain } => {
                    StatisticsObject::Histogram(HistogramVariant::Text {
                        histogram: histogram.scaled(selectivity),
                        domain: *domain,
                    })
                }
            },
        }
    }

    /// Diagnostic JSON: `{"min","max"}`, `{"ranges":[[l,h],…]}`, or
    /// `{"bins":[{"lo","hi","height","distinct"},…]}`.
    pub fn to_json(&self) -> JsonValue {
        fn datum_json<T: Element>(value: T) -> JsonValue {
            match value.into_datum() {
                Datum::Int32(v) => json!(v),
                Datum::Int64(v) => json!(v),
                Datum::Float32(v) => json!(v),
                Datum::Float64(v) => json!(v),
                Datum::Text(v) => json!(v),
                Datum::Null => JsonValue::Null,
            }
        }

        match self {
            StatisticsObject::MinMax(variant) => with_min_max!(variant, |filter| json!({
                "min": datum_json(filter.min().clone()),
                "max": datum_json(filter.max().clone()),
            })),
            StatisticsObject::Range(variant) => with_range!(variant, |filter| {
                let ranges: Vec<JsonValue> = filter
                    .ranges()
                    .iter()
                    .map(|(lo, hi)| json!([datum_json(*lo), datum_json(*hi)]))
                    .collect();
                json!({ "ranges": ranges })
            }),
            StatisticsObject::Histogram(variant) => {
                fn bins_json<T: crate::histogram::HistogramElement>(
                    histogram: &EqualDistinctCountHistogram<T>,
                ) -> JsonValue {
                    let bins: Vec<JsonValue> = histogram
                        .bins()
                        .iter()
                        .map(|bin| {
                            json!({
                                "lo": datum_json(bin.lo.clone()),
                                "hi": datum_json(bin.hi.clone()),
                                "height": bin.height,
                                "distinct": bin.distinct_count,
                            })
                        })
                        .collect();
                    json!({ "bins": bins })
                }

                match variant {
                    HistogramVariant::Int32(h) => bins_json(h),
                    HistogramVariant::Int64(h) => bins_json(h),
                    HistogramVariant::Float32(h) => bins_json(h),
                    HistogramVariant::Float64(h) => bins_json(h),
                    HistogramVariant::Text { histogram, .. } => bins_json(histogram),
                }
            }
        }
    }
}

impl SegmentStatistics for StatisticsObject {
    fn can_prune(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> bool {
        StatisticsObject::can_prune(self, condition, value, value2)
    }
}

/// Sorted distinct non-null values of a segment with their row counts.
fn sorted_distinct_counts<T: Element>(segment: &TypedSegment<T>) -> Vec<(T, u64)> {
    match segment {
        TypedSegment::Value(segment) => {
            let mut values: Vec<T> =
                (0..segment.len()).filter_map(|offset| segment.get(offset).cloned()).collect();
            values.sort_by(|a, b| a.total_cmp(b));

            let mut pairs: Vec<(T, u64)> = Vec::new();
            for value in values {
                if let Some(last) = pairs.last_mut() {
                    if last.0.total_cmp(&value).is_eq() {
                        last.1 += 1;
                        continue;
                    }
                }
                pairs.push((value, 1));
            }
            pairs
        }
        TypedSegment::Dictionary(segment) => {
            let mut counts = vec![0u64; segment.unique_values_count()];
            for id in segment.attribute_vector().iter() {
                if id != strata_common::INVALID_VALUE_ID {
                    counts[id.0 as usize] += 1;
                }
            }
            segment
                .dictionary()
                .iter()
                .zip(counts)
                .filter(|(_, count)| *count > 0)
                .map(|(value, count)| (value.clone(), count))
                .collect()
        }
    }
}

fn min_max_from_pairs<T: Element>(pairs: &[(T, u64)]) -> Option<MinMaxFilter<T>> {
    let (min, _) = pairs.first()?;
    let (max, _) = pairs.last()?;
    let row_count: u64 = pairs.iter().map(|(_, count)| count).sum();
    let filter = MinMaxFilter::new(min.clone(), max.clone())
        .expect("sorted input yields min <= max")
        .with_counts(row_count, pairs.len() as u64);
    Some(filter)
}

fn range_from_pairs<T: RangeElement>(
    pairs: &[(T, u64)],
    max_ranges: u32,
) -> Result<Option<RangeFilter<T>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let values: Vec<T> = pairs.iter().map(|(value, _)| *value).collect();
    let mut filter = RangeFilter::build_filter(&values, max_ranges)?;
    filter.row_count = pairs.iter().map(|(_, count)| count).sum();
    filter.distinct_count = pairs.len() as u64;
    Ok(Some(filter))
}

impl StatisticsObject {
    /// Min-max filter over a segment's non-null values, or `None` when the
    /// segment holds only nulls.
    pub fn min_max_from_segment(segment: &Segment) -> Option<StatisticsObject> {
        match segment {
            Segment::Int32(typed) => min_max_from_pairs(&sorted_distinct_counts(typed))
                .map(|f| StatisticsObject::MinMax(MinMaxVariant::Int32(f))),
            Segment::Int64(typed) => min_max_from_pairs(&sorted_distinct_counts(typed))
                .map(|f| StatisticsObject::MinMax(MinMaxVariant::Int64(f))),
            Segment::Float32(typed) => min_max_from_pairs(&sorted_distinct_counts(typed))
                .map(|f| StatisticsObject::MinMax(MinMaxVariant::Float32(f))),
            Segment::Float64(typed) => min_max_from_pairs(&sorted_distinct_counts(typed))
                .map(|f| StatisticsObject::MinMax(MinMaxVariant::Float64(f))),
            Segment::Text(typed) => min_max_from_pairs(&sorted_distinct_counts(typed))
                .map(|f| StatisticsObject::MinMax(MinMaxVariant::Text(f))),
        }
    }

    /// Range filter over a scalar segment, or `None` when the segment
    /// holds only nulls. Text segments are not rangeable.
    pub fn range_from_segment(
        segment: &Segment,
        max_ranges: u32,
    ) -> Result<Option<StatisticsObject>> {
        match segment {
            Segment::Int32(typed) => Ok(range_from_pairs(&sorted_distinct_counts(typed), max_ranges)?
                .map(|f| StatisticsObject::Range(RangeVariant::Int32(f)))),
            Segment::Int64(typed) => Ok(range_from_pairs(&sorted_distinct_counts(typed), max_ranges)?
                .map(|f| StatisticsObject::Range(RangeVariant::Int64(f)))),
            Segment::Float32(typed) => Ok(range_from_pairs(&sorted_distinct_counts(typed), max_ranges)?
                .map(|f| StatisticsObject::Range(RangeVariant::Float32(f)))),
            Segment::Float64(typed) => Ok(range_from_pairs(&sorted_distinct_counts(typed), max_ranges)?
                .map(|f| StatisticsObject::Range(RangeVariant::Float64(f)))),
            Segment::Text(_) => Err(StrataError::Unsupported(
                "range filters cover scalar segments only".to_string(),
            )),
        }
    }

    /// Equal-distinct-count histogram over a segment, or `None` when the
    /// segment holds only nulls. Text values pass through `domain` first.
    pub fn histogram_from_segment(
        segment: &Segment,
        bin_count: usize,
        domain: &StringHistogramDomain,
    ) -> Result<Option<StatisticsObject>> {
        fn build<T: crate::histogram::HistogramElement>(
            typed: &TypedSegment<T>,
            bin_count: usize,
        ) -> Result<Option<EqualDistinctCountHistogram<T>>> {
            let pairs = sorted_distinct_counts(typed);
            if pairs.is_empty() {
                return Ok(None);
            }
            EqualDistinctCountHistogram::from_distinct_counts(&pairs, bin_count).map(Some)
        }

        match segment {
            Segment::Int32(typed) => Ok(build(typed, bin_count)?
                .map(|h| StatisticsObject::Histogram(HistogramVariant::Int32(h)))),
            Segment::Int64(typed) => Ok(build(typed, bin_count)?
                .map(|h| StatisticsObject::Histogram(HistogramVariant::Int64(h)))),
            Segment::Float32(typed) => Ok(build(typed, bin_count)?
                .map(|h| StatisticsObject::Histogram(HistogramVariant::Float32(h)))),
            Segment::Float64(typed) => Ok(build(typed, bin_count)?
                .map(|h| StatisticsObject::Histogram(HistogramVariant::Float64(h)))),
            Segment::Text(typed) => {
                let mut pairs: Vec<(String, u64)> = Vec::new();
                for (value, count) in sorted_distinct_counts(typed) {
                    let reduced = domain.reduce(&value);
                    if let Some(last) = pairs.last_mut() {
                        if last.0 == reduced {
                            last.1 += count;
                            continue;
                        }
                    }
                    pairs.push((reduced, count));
                }
                if pairs.is_empty() {
                    return Ok(None);
                }
                let histogram =
                    EqualDistinctCountHistogram::from_distinct_counts(&pairs, bin_count)?;
                Ok(Some(StatisticsObject::Histogram(HistogramVariant::Text {
                    histogram,
                    domain: *domain,
                })))
            }
        }
    }
}

/// Per-column statistics of one chunk.
///
/// Scalar columns get a range filter, text columns an equal-distinct-count
/// histogram; all-null columns keep an empty slot.
pub struct ChunkStatistics {
    row_count: u64,
    objects: Vec<Option<Arc<StatisticsObject>>>,
}

impl ChunkStatistics {
    pub fn from_chunk(chunk: &Chunk, config: &EngineConfig) -> Result<Self> {
        let mut objects = Vec::with_capacity(chunk.column_count());
        for segment in chunk.segments() {
            let segment = segment.as_ref();
            let object = match segment.element_kind() {
                ElementKind::Text => StatisticsObject::histogram_from_segment(
                    segment,
                    config.histogram_bins,
                    &StringHistogramDomain::default(),
                )?,
                _ => StatisticsObject::range_from_segment(segment, config.max_ranges)?,
            };
            objects.push(object.map(Arc::new));
        }
        Ok(Self { row_count: chunk.size() as u64, objects })
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn object(&self, column_id: ColumnId) -> Option<&Arc<StatisticsObject>> {
        self.objects.get(column_id.0 as usize).and_then(|slot| slot.as_ref())
    }

    /// Install the objects into the chunk's statistics slots so the scan
    /// orchestrator can consult them.
    pub fn install(&self, chunk: &Chunk) {
        for (index, slot) in self.objects.iter().enumerate() {
            if let Some(object) = slot {
                chunk.set_statistics(ColumnId(index as u16), object.clone());
            }
        }
    }
}
