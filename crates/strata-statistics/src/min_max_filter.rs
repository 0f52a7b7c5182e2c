//! Min-max filter: the cheapest pruning statistic

use crate::estimate::CardinalityEstimate;
use strata_common::{PredicateCondition, Result, StrataError};
use strata_storage::{Datum, Element};

/// Smallest and largest non-null value of one segment.
///
/// `row_count`/`distinct_count` of zero mean "unknown"; pruning answers
/// stay exact either way, only the advisory estimate numbers degrade.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxFilter<T: Element> {
    min: T,
    max: T,
    row_count: u64,
    distinct_count: u64,
}

impl<T: Element> MinMaxFilter<T> {
    pub fn new(min: T, max: T) -> Result<Self> {
        if min > max {
            return Err(StrataError::InvalidArgument(
                "min-max filter requires min <= max".to_string(),
            ));
        }
        Ok(Self { min, max, row_count: 0, distinct_count: 0 })
    }

    pub fn with_counts(mut self, row_count: u64, distinct_count: u64) -> Self {
        self.row_count = row_count;
        self.distinct_count = distinct_count;
        self
    }

    pub fn min(&self) -> &T {
        &self.min
    }

    pub fn max(&self) -> &T {
        &self.max
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// True only if certainly no non-null row satisfies the predicate.
    ///
    /// Null literals, kind mismatches, and malformed shapes (a second
    /// literal on anything but `Between`, a missing one on `Between`)
    /// never prune.
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
            PredicateCondition::Equals => v < self.min || v > self.max,
            PredicateCondition::NotEquals => self.min == self.max && self.min == v,
            PredicateCondition::LessThan => v <= self.min,
            PredicateCondition::LessThanEquals => v < self.min,
            PredicateCondition::GreaterThan => v >= self.max,
            PredicateCondition::GreaterThanEquals => v > self.max,
            PredicateCondition::Between => {
                let v2 = match value2 {
                    Some(value2) if !value2.is_null() => match T::from_datum(value2) {
                        Some(v2) => v2,
                        None => return false,
                    },
                    _ => return false,
                };
                v2 < self.min || v > self.max
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
            (PredicateCondition::NotEquals, Some(v)) if v < self.min || v > self.max => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::NotEquals, _) => {
                CardinalityEstimate::approximately(row_count * (1.0 - 1.0 / distinct))
            }
            (PredicateCondition::LessThan, Some(v)) if v > self.max => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::LessThanEquals, Some(v)) if v >= self.max => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::GreaterThan, Some(v)) if v < self.min => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::GreaterThanEquals, Some(v)) if v <= self.min => {
                CardinalityEstimate::all(row_count)
            }
            (PredicateCondition::Between, Some(v)) => match v2 {
                Some(v2) if v <= self.min && v2 >= self.max => {
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
    /// nothing would remain. Bounds stay closed, so a half-open result
    /// keeps the excluded bound.
    pub fn sliced(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> Option<MinMaxFilter<T>> {
        if self.does_not_contain(condition, value, value2) {
            return None;
        }
        let v = match T::from_datum(value) {
            Some(v) => v,
            None => return Some(self.clone()),
        };

        let (min, max) = match condition {
            PredicateCondition::Equals => (v.clone(), v),
            PredicateCondition::LessThan | PredicateCondition::LessThanEquals => {
                (self.min.clone(), clamp_max(self.max.clone(), v))
            }
            PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
                (clamp_min(self.min.clone(), v), self.max.clone())
            }
            PredicateCondition::Between => match value2.and_then(T::from_datum) {
                Some(v2) => (clamp_min(self.min.clone(), v), clamp_max(self.max.clone(), v2)),
                None => (self.min.clone(), self.max.clone()),
            },
            _ => (self.min.clone(), self.max.clone()),
        };

        let estimate = self.estimate_cardinality(condition, value, value2);
        let row_count = estimate.cardinality.round() as u64;
        Some(MinMaxFilter {
            min,
            max,
            row_count,
            distinct_count: self.distinct_count.min(row_count.max(1)),
        })
    }

    /// Filter for a selectivity-reduced copy of the segment. Bounds are
    /// unchanged; only the recorded counts shrink.
    pub fn scaled(&self, selectivity: f64) -> MinMaxFilter<T> {
        let row_count = (self.row_count as f64 * selectivity).round() as u64;
        MinMaxFilter {
            min: self.min.clone(),
            max: self.max.clone(),
            row_count,
            distinct_count: self.distinct_count.min(row_count.max(1)),
        }
    }
}

fn clamp_max<T: PartialOrd>(current: T, bound: T) -> T {
    if bound < current {
        bound
    } else {
        current
    }
}

fn clamp_min<T: PartialOrd>(current: T, bound: T) -> T {
    if bound > current {
        bound
    } else {
        current
    }
}
