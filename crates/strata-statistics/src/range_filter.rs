//! Range filter: disjoint value ranges split at the largest gaps

use crate::estimate::CardinalityEstimate;
use std::cmp::Ordering;
use strata_common::{PredicateCondition, Result, StrataError};
use strata_storage::{Datum, Element};

/// Scalar element with a wide domain for overflow-safe gap arithmetic.
pub trait RangeElement: Element + Copy {
    type Wide: PartialOrd + Copy;

    /// Width of the gap `hi - lo`, or `None` when it exceeds the type's
    /// representable span. Such gaps must not become split points; wrapping
    /// here would hide the largest gap.
    fn checked_gap(lo: &Self, hi: &Self) -> Option<Self::Wide>;
}

impl RangeElement for i32 {
    type Wide = i64;

    fn checked_gap(lo: &Self, hi: &Self) -> Option<i64> {
        let gap = *hi as i64 - *lo as i64;
        (gap <= i32::MAX as i64).then_some(gap)
    }
}

impl RangeElement for i64 {
    type Wide = i128;

    fn checked_gap(lo: &Self, hi: &Self) -> Option<i128> {
        let gap = *hi as i128 - *lo as i128;
        (gap <= i64::MAX as i128).then_some(gap)
    }
}

impl RangeElement for f32 {
    type Wide = f64;

    fn checked_gap(lo: &Self, hi: &Self) -> Option<f64> {
        let gap = *hi as f64 - *lo as f64;
        (gap.is_finite() && gap <= f32::MAX as f64).then_some(gap)
    }
}

impl RangeElement for f64 {
    type Wide = f64;

    fn checked_gap(lo: &Self, hi: &Self) -> Option<f64> {
        let gap = *hi - *lo;
        gap.is_finite().then_some(gap)
    }
}

/// Sorted, non-overlapping closed ranges covering every value of a
/// segment. A value between two ranges provably does not occur.
///
/// Built with a single range, this filter answers exactly like a min-max
/// filter over the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter<T: RangeElement> {
    ranges: Vec<(T, T)>,
    pub(crate) row_count: u64,
    pub(crate) distinct_count: u64,
}

impl<T: RangeElement> RangeFilter<T> {
    /// Build from sorted distinct values, keeping at most `max_ranges`
    /// ranges by splitting at the `max_ranges - 1` widest representable
    /// gaps. The sortedness precondition is only checked in debug builds.
    pub fn build_filter(values: &[T], max_ranges: u32) -> Result<Self> {
        if max_ranges == 0 {
            return Err(StrataError::InvalidArgument(
                "range filter needs at least one range".to_string(),
            ));
        }
        if values.is_empty() {
            return Err(StrataError::InvalidArgument(
                "range filter needs at least one value".to_string(),
            ));
        }
        debug_assert!(
            values.windows(2).all(|pair| pair[0] < pair[1]),
            "range filter input must be sorted and distinct"
        );

        let ranges = if values.len() == 1 || max_ranges == 1 {
            vec![(values[0], values[values.len() - 1])]
        } else {
            let mut gaps: Vec<(T::Wide, usize)> = values
                .windows(2)
                .enumerate()
                .filter_map(|(index, pair)| {
                    T::checked_gap(&pair[0], &pair[1]).map(|gap| (gap, index))
                })
                .collect();
            gaps.sort_by(|a, b| {
                b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1))
            });
            gaps.truncate(max_ranges as usize - 1);

            let mut split_points: Vec<usize> = gaps.into_iter().map(|(_, index)| index).collect();
            split_points.sort_unstable();

            let mut ranges = Vec::with_capacity(split_points.len() + 1);
            let mut start = 0;
            for split in split_points {
                ranges.push((values[start], values[split]));
                start = split + 1;
            }
            ranges.push((values[start], values[values.len() - 1]));
            ranges
        };

        Ok(Self {
            ranges,
            row_count: values.len() as u64,
            distinct_count: values.len() as u64,
        })
    }

    pub fn ranges(&self) -> &[(T, T)] {
        &self.ranges
    }

    fn lower_edge(&self) -> T {
        self.ranges[0].0
    }

    fn upper_edge(&self) -> T {
        self.ranges[self.ranges.len() - 1].1
    }

    /// True iff `v` lies inside one of the ranges.
    fn contains_value(&self, v: &T) -> bool {
        let index = self.ranges.partition_point(|range| range.1 < *v);
        self.ranges.get(index).is_some_and(|range| range.0 <= *v)
    }

    /// True only if certainly no non-null row satisfies the predicate.
    pub fn does_not_contain(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> bool {
        if value.is_null() {
            return false;
        }
        if condition != PredicateCondition::Between && value2.is_some() {
            return false;
        }
        let v = match T::from_datum(value) {
            Some(v) => v,
            None => return false,
        };

        match condition {
            PredicateCondition::Equals => !self.contains_value(&v),
            PredicateCondition::NotEquals => {
                self.ranges.len() == 1
                    && self.ranges[0].0 == self.ranges[0].1
                    && self.ranges[0].0 == v
            }
            PredicateCondition::LessThan => v <= self.lower_edge(),
            PredicateCondition::LessThanEquals => v < self.lower_edge(),
            PredicateCondition::GreaterThan => v >= self.upper_edge(),
            PredicateCondition::GreaterThanEquals => v > self.upper_edge(),
            PredicateCondition::Between => {
                let v2 = match value2 {
                    Some(value2) if !value2.is_null() => match T::from_datum(value2) {
                        Some(v2) => v2,
                        None => return false,
                    },
                    _ => return false,
                };
                if v2 < v {
                    return true;
                }
                if v2 < self.lower_edge() || v > self.upper_edge() {
                    return true;
                }
                // prunable iff [v, v2] sits entirely inside one inter-range gap
                let index = self.ranges.partition_point(|range| range.1 < v);
                self.ranges.get(index).is_some_and(|range| range.0 > v2)
            }
            _ => false,
        }
    }

    /// `MatchesNone` exactly when [`Self::does_not_contain`] holds.
    pub fn estimate_cardinality(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> CardinalityEstimate {
        if self.does_not_contain(condition, value, value2) {
            return CardinalityEstimate::none();
        }

        let row_count = self.row_count as f64;
        let distinct = self.distinct_count.max(1) as f64;
        let v = T::from_datum(value);
        let v2 = value2.and_then(T::from_datum);

        match (condition, v) {
            (PredicateCondition::Equals, _) => {
                CardinalityEstimate::approximately(row_count / distinct)
            }
            (PredicateCondition::NotEquals, Some(v)) if !self.contains_value(&v) => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::NotEquals, _) => {
                CardinalityEstimate::approximately(row_count * (1.0 - 1.0 / distinct))
            }
            (PredicateCondition::LessThan, Some(v)) if v > self.upper_edge() => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::LessThanEquals, Some(v)) if v >= self.upper_edge() => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::GreaterThan, Some(v)) if v < self.lower_edge() => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::GreaterThanEquals, Some(v)) if v <= self.lower_edge() => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::Between, Some(v)) => match v2 {
                Some(v2) if v <= self.lower_edge() && v2 >= self.upper_edge() => {
                    CardinalityEstimate::all(row_count)
                }
                _ => CardinalityEstimate::approximately(row_count / 3.0),
            },
            (
                PredicateCondition::LessThan
                | PredicateCondition::LessThanEquals
                | PredicateCondition::GreaterThan
                | PredicateCondition::GreaterThanEquals,
                _,
            ) => CardinalityEstimate::approximately(row_count / 3.0),
            _ => CardinalityEstimate::approximately(row_count),
        }
    }

    /// Filter describing the segment after the predicate, or `None` when
    /// nothing would remain.
    pub fn sliced(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> Option<RangeFilter<T>> {
        if self.does_not_contain(condition, value, value2) {
            return None;
        }
        let v = match T::from_datum(value) {
            Some(v) => v,
            None => return Some(self.clone()),
        };

        let ranges = match condition {
            PredicateCondition::Equals => vec![(v, v)],
            PredicateCondition::LessThan | PredicateCondition::LessThanEquals => {
                self.clip_upper(&v)
            }
            PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
                self.clip_lower(&v)
            }
            PredicateCondition::Between => match value2.and_then(T::from_datum) {
                Some(v2) => clip_upper_of(&self.clip_lower(&v), &v2),
                None => self.ranges.clone(),
            },
            _ => self.ranges.clone(),
        };
        if ranges.is_empty() {
            return None;
        }

        let estimate = self.estimate_cardinality(condition, value, value2);
        let row_count = estimate.cardinality.round() as u64;
        Some(RangeFilter {
            ranges,
            row_count,
            distinct_count: self.distinct_count.min(row_count.max(1)),
        })
    }

    /// Filter for a selectivity-reduced copy: ranges unchanged, counts
    /// scaled.
    pub fn scaled(&self, selectivity: f64) -> RangeFilter<T> {
        let row_count = (self.row_count as f64 * selectivity).round() as u64;
        RangeFilter {
            ranges: self.ranges.clone(),
            row_count,
            distinct_count: self.distinct_count.min(row_count.max(1)),
        }
    }

    fn clip_upper(&self, bound: &T) -> Vec<(T, T)> {
        clip_upper_of(&self.ranges, bound)
    }

    fn clip_lower(&self, bound: &T) -> Vec<(T, T)> {
        self.ranges
            .iter()
            .filter(|range| range.1 >= *bound)
            .map(|range| (if range.0 > *bound { range.0 } else { *bound }, range.1))
            .collect()
    }
}

fn clip_upper_of<T: RangeElement>(ranges: &[(T, T)], bound: &T) -> Vec<(T, T)> {
    ranges
        .iter()
        .filter(|range| range.0 <= *bound)
        .map(|range| (range.0, if range.1 < *bound { range.1 } else { *bound }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::EstimateKind;
    use strata_common::PredicateCondition as Cond;

    // Largest gap is 103..123456, second largest -1000..2, third 17..100.
    const VALUES: [i32; 13] = [-1000, 2, 3, 4, 7, 8, 10, 17, 100, 101, 102, 103, 123456];

    fn datum(v: i32) -> Datum {
        Datum::Int32(v)
    }

    #[test]
    fn test_zero_ranges_rejected() {
        assert!(RangeFilter::<i32>::build_filter(&VALUES, 0).is_err());
        assert!(RangeFilter::<i32>::build_filter(&[], 4).is_err());
    }

    #[test]
    fn test_four_ranges_split_at_largest_gaps() {
        let filter = RangeFilter::build_filter(&VALUES, 4).unwrap();
        assert_eq!(
            filter.ranges(),
            &[(-1000, -1000), (2, 17), (100, 103), (123456, 123456)]
        );

        assert!(filter.does_not_contain(Cond::Equals, &datum(1024), None));
        assert!(!filter.does_not_contain(Cond::Equals, &datum(17), None));
        assert!(filter.does_not_contain(Cond::Between, &datum(104), Some(&datum(123455))));
        assert!(!filter.does_not_contain(Cond::Between, &datum(103), Some(&datum(123456))));
    }

    #[test]
    fn test_single_range_behaves_like_min_max() {
        let filter = RangeFilter::build_filter(&VALUES, 1).unwrap();
        assert_eq!(filter.ranges(), &[(-1000, 123456)]);

        assert!(filter.does_not_contain(Cond::LessThan, &datum(-1000), None));
        assert!(!filter.does_not_contain(Cond::GreaterThan, &datum(-1000), None));
        assert!(!filter.does_not_contain(Cond::Equals, &datum(1024), None));
        assert!(filter.does_not_contain(Cond::Between, &datum(-3000), Some(&datum(-2000))));
    }

    #[test]
    fn test_more_ranges_than_values() {
        let filter = RangeFilter::build_filter(&VALUES, 10_000).unwrap();
        assert_eq!(filter.ranges().len(), VALUES.len());

        for value in VALUES {
            assert!(!filter.does_not_contain(Cond::Equals, &datum(value), None));
        }
        assert!(filter.does_not_contain(Cond::Equals, &datum(1024), None));
        assert!(filter.does_not_contain(Cond::LessThan, &datum(-1000), None));
        assert!(!filter.does_not_contain(Cond::LessThanEquals, &datum(123456), None));
        assert!(filter.does_not_contain(Cond::GreaterThan, &datum(123456), None));
    }

    #[test]
    fn test_prune_on_bounds() {
        let filter = RangeFilter::build_filter(&VALUES, 10).unwrap();

        assert!(filter.does_not_contain(Cond::LessThan, &datum(-1001), None));
        assert!(filter.does_not_contain(Cond::LessThan, &datum(-1000), None));
        assert!(!filter.does_not_contain(Cond::LessThan, &datum(1024), None));

        assert!(filter.does_not_contain(Cond::LessThanEquals, &datum(-1001), None));
        assert!(!filter.does_not_contain(Cond::LessThanEquals, &datum(-1000), None));

        assert!(filter.does_not_contain(Cond::Equals, &datum(-1001), None));
        assert!(!filter.does_not_contain(Cond::Equals, &datum(-1000), None));
        assert!(filter.does_not_contain(Cond::Equals, &datum(123457), None));

        assert!(!filter.does_not_contain(Cond::GreaterThanEquals, &datum(123456), None));
        assert!(filter.does_not_contain(Cond::GreaterThanEquals, &datum(123457), None));

        assert!(!filter.does_not_contain(Cond::GreaterThan, &datum(103), None));
        assert!(filter.does_not_contain(Cond::GreaterThan, &datum(123456), None));
    }

    #[test]
    fn test_literal_on_inner_range_bound_never_prunes_le_ge() {
        let filter = RangeFilter::build_filter(&VALUES, 4).unwrap();
        for (lo, hi) in filter.ranges().to_vec() {
            assert!(!filter.does_not_contain(Cond::LessThanEquals, &datum(hi), None));
            assert!(!filter.does_not_contain(Cond::GreaterThanEquals, &datum(lo), None));
        }
    }

    #[test]
    fn test_between() {
        let filter = RangeFilter::build_filter(&VALUES, 10).unwrap();

        assert!(filter.does_not_contain(Cond::Between, &datum(-3000), Some(&datum(-2000))));
        assert!(filter.does_not_contain(Cond::Between, &datum(-999), Some(&datum(1))));
        assert!(filter.does_not_contain(Cond::Between, &datum(104), Some(&datum(1004))));
        assert!(
            filter.does_not_contain(Cond::Between, &datum(10_000_000), Some(&datum(20_000_000)))
        );

        assert!(!filter.does_not_contain(Cond::Between, &datum(-3000), Some(&datum(-500))));
        assert!(!filter.does_not_contain(Cond::Between, &datum(101), Some(&datum(103))));
        assert!(!filter.does_not_contain(Cond::Between, &datum(102), Some(&datum(1004))));
        // between is inclusive on both ends
        assert!(!filter.does_not_contain(Cond::Between, &datum(103), Some(&datum(123456))));
    }

    #[test]
    fn test_overflowing_gap_is_not_a_split_point() {
        let lowest = i32::MIN;
        let max = i32::MAX;
        let values = [
            (0.9 * lowest as f64) as i32,
            (0.8 * lowest as f64) as i32,
            (0.8 * max as f64) as i32,
            (0.9 * max as f64) as i32,
        ];

        let filter = RangeFilter::build_filter(&values, 5).unwrap();
        // the middle gap overflows i32 and must stay inside one range,
        // so a value right in that gap is not prunable
        assert!(!filter.does_not_contain(Cond::Equals, &datum(0), None));
        // values outside the outer bounds still are
        assert!(filter.does_not_contain(Cond::Equals, &datum((0.95 * lowest as f64) as i32), None));
        assert_eq!(filter.ranges().len(), 3);
    }

    #[test]
    fn test_wide_gaps_on_floats() {
        let lowest = f64::MIN;
        let max = f64::MAX;
        let values = [
            0.4 * lowest,
            0.38 * lowest,
            0.36 * lowest,
            0.30 * lowest,
            0.28 * lowest,
            0.36 * max,
            0.38 * max,
            0.4 * max,
        ];

        let filter = RangeFilter::build_filter(&values, 3).unwrap();
        assert_eq!(
            filter.ranges(),
            &[(0.4 * lowest, 0.36 * lowest), (0.30 * lowest, 0.28 * lowest), (0.36 * max, 0.4 * max)]
        );

        assert!(filter
            .does_not_contain(Cond::Between, &Datum::Float64(0.27 * lowest), Some(&Datum::Float64(0.35 * max))));
        assert!(filter
            .does_not_contain(Cond::Between, &Datum::Float64(0.35 * lowest), Some(&Datum::Float64(0.31 * lowest))));
        assert!(filter.does_not_contain(Cond::Equals, &Datum::Float64(0.0), None));
        assert!(!filter.does_not_contain(Cond::Equals, &Datum::Float64(0.4 * lowest), None));
    }

    #[test]
    fn test_unsupported_predicates_never_prune() {
        let filter = RangeFilter::build_filter(&[-1000, -900, 900, 1000], 10).unwrap();

        assert!(!filter.does_not_contain(Cond::IsNull, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::IsNotNull, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::Like, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::NotLike, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::In, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::NotIn, &datum(17), None));
        assert!(!filter.does_not_contain(Cond::IsNull, &Datum::Null, None));

        // prunable in principle, but malformed predicates are skipped
        assert!(filter.does_not_contain(Cond::Equals, &datum(1), None));
        assert!(!filter.does_not_contain(Cond::Equals, &datum(1), Some(&Datum::Null)));
    }

    #[test]
    fn test_estimate_tags() {
        let filter = RangeFilter::build_filter(&VALUES, 4).unwrap();
        assert_eq!(
            filter.estimate_cardinality(Cond::Equals, &datum(1024), None).kind,
            EstimateKind::MatchesNone
        );
        assert_eq!(
            filter.estimate_cardinality(Cond::Equals, &datum(17), None).kind,
            EstimateKind::MatchesApproximately
        );
        assert_eq!(
            filter.estimate_cardinality(Cond::LessThanEquals, &datum(123456), None).kind,
            EstimateKind::MatchesAll
        );
    }

    #[test]
    fn test_sliced() {
        let filter = RangeFilter::build_filter(&VALUES, 4).unwrap();

        let sliced = filter.sliced(Cond::LessThanEquals, &datum(17), None).unwrap();
        assert_eq!(sliced.ranges(), &[(-1000, -1000), (2, 17)]);

        let sliced = filter.sliced(Cond::GreaterThan, &datum(17), None).unwrap();
        assert_eq!(sliced.ranges(), &[(17, 17), (100, 103), (123456, 123456)]);

        let sliced = filter.sliced(Cond::Equals, &datum(17), None).unwrap();
        assert_eq!(sliced.ranges(), &[(17, 17)]);

        let sliced = filter
            .sliced(Cond::Between, &datum(3), Some(&datum(101)))
            .unwrap();
        assert_eq!(sliced.ranges(), &[(3, 17), (100, 101)]);

        assert!(filter.sliced(Cond::LessThan, &datum(-1000), None).is_none());
    }

    #[test]
    fn test_sliced_idempotent() {
        let filter = RangeFilter::build_filter(&VALUES, 4).unwrap();
        let once = filter.sliced(Cond::LessThanEquals, &datum(17), None).unwrap();
        let twice = once.sliced(Cond::LessThanEquals, &datum(17), None).unwrap();
        assert_eq!(once.ranges(), twice.ranges());
    }
}
