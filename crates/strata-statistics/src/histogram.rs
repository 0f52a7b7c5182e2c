//! Equal-distinct-count histogram

use crate::estimate::CardinalityEstimate;
use strata_common::{PredicateCondition, Result, StrataError};
use strata_storage::{Datum, Element};

/// Which characters of a text value take part in histogram comparisons.
///
/// Values are reduced to `prefix_length` characters, each clamped into
/// `[min_char, max_char]`, before they are binned or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringHistogramDomain {
    pub min_char: u8,
    pub max_char: u8,
    pub prefix_length: usize,
}

impl StringHistogramDomain {
    pub fn new(min_char: u8, max_char: u8, prefix_length: usize) -> Self {
        Self { min_char, max_char, prefix_length }
    }

    pub fn reduce(&self, value: &str) -> String {
        value
            .bytes()
            .take(self.prefix_length)
            .map(|byte| byte.clamp(self.min_char, self.max_char) as char)
            .collect()
    }

    pub fn reduce_datum(&self, datum: &Datum) -> Datum {
        match datum {
            Datum::Text(value) => Datum::Text(self.reduce(value)),
            other => other.clone(),
        }
    }
}

impl Default for StringHistogramDomain {
    fn default() -> Self {
        Self { min_char: b'a', max_char: b'z', prefix_length: 9 }
    }
}

/// One histogram bin over the closed value interval `[lo, hi]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin<T> {
    pub lo: T,
    pub hi: T,
    pub height: u64,
    pub distinct_count: u64,
}

impl<T> HistogramBin<T> {
    pub fn new(lo: T, hi: T, height: u64, distinct_count: u64) -> Self {
        Self { lo, hi, height, distinct_count }
    }
}

/// Fraction of a bin's rows assumed to lie strictly below a value.
pub trait HistogramElement: Element {
    fn ratio_below(lo: &Self, hi: &Self, value: &Self) -> f64;
}

impl HistogramElement for i32 {
    fn ratio_below(lo: &Self, hi: &Self, value: &Self) -> f64 {
        (*value as i64 - *lo as i64) as f64 / ((*hi as i64 - *lo as i64) as f64 + 1.0)
    }
}

impl HistogramElement for i64 {
    fn ratio_below(lo: &Self, hi: &Self, value: &Self) -> f64 {
        (*value as i128 - *lo as i128) as f64 / ((*hi as i128 - *lo as i128) as f64 + 1.0)
    }
}

impl HistogramElement for f32 {
    fn ratio_below(lo: &Self, hi: &Self, value: &Self) -> f64 {
        if hi <= lo {
            0.0
        } else {
            ((*value - *lo) as f64 / (*hi - *lo) as f64).clamp(0.0, 1.0)
        }
    }
}

impl HistogramElement for f64 {
    fn ratio_below(lo: &Self, hi: &Self, value: &Self) -> f64 {
        if hi <= lo {
            0.0
        } else {
            ((*value - *lo) / (*hi - *lo)).clamp(0.0, 1.0)
        }
    }
}

impl HistogramElement for String {
    // Text bins have no usable width; assume half the bin lies below.
    fn ratio_below(_lo: &Self, _hi: &Self, _value: &Self) -> f64 {
        0.5
    }
}

/// Histogram whose bins cover roughly the same number of distinct values.
///
/// Bins are sorted and non-overlapping; heights count rows, and the total
/// describes the segment's non-null rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualDistinctCountHistogram<T: HistogramElement> {
    bins: Vec<HistogramBin<T>>,
    row_count: u64,
}

impl<T: HistogramElement> EqualDistinctCountHistogram<T> {
    /// Build from sorted distinct values with their row counts. The first
    /// `distinct % bins` bins carry one extra distinct value.
    pub fn from_distinct_counts(pairs: &[(T, u64)], bin_count: usize) -> Result<Self> {
        if bin_count == 0 {
            return Err(StrataError::InvalidArgument(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if pairs.is_empty() {
            return Err(StrataError::InvalidArgument(
                "histogram needs at least one value".to_string(),
            ));
        }
        debug_assert!(
            pairs.windows(2).all(|pair| pair[0].0 < pair[1].0),
            "histogram input must be sorted and distinct"
        );

        let distinct = pairs.len();
        let bin_count = bin_count.min(distinct);
        let base = distinct / bin_count;
        let extra = distinct % bin_count;

        let mut bins = Vec::with_capacity(bin_count);
        let mut start = 0;
        for bin in 0..bin_count {
            let take = base + usize::from(bin < extra);
            let slice = &pairs[start..start + take];
            bins.push(HistogramBin {
                lo: slice[0].0.clone(),
                hi: slice[take - 1].0.clone(),
                height: slice.iter().map(|(_, count)| count).sum(),
                distinct_count: take as u64,
            });
            start += take;
        }

        let row_count = bins.iter().map(|bin| bin.height).sum();
        Ok(Self { bins, row_count })
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bin(&self, index: usize) -> &HistogramBin<T> {
        &self.bins[index]
    }

    pub fn bins(&self) -> &[HistogramBin<T>] {
        &self.bins
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn total_distinct(&self) -> u64 {
        self.bins.iter().map(|bin| bin.distinct_count).sum()
    }

    fn bin_index_for(&self, value: &T) -> Option<usize> {
        let index = self.bins.partition_point(|bin| bin.hi < *value);
        self.bins.get(index).filter(|bin| bin.lo <= *value).map(|_| index)
    }

    fn estimate_equals(&self, value: &T) -> f64 {
        match self.bin_index_for(value) {
            Some(index) => {
                let bin = &self.bins[index];
                bin.height as f64 / bin.distinct_count.max(1) as f64
            }
            None => 0.0,
        }
    }

    /// Rows with a value strictly below `value`.
    fn estimate_less_than(&self, value: &T) -> f64 {
        let mut count = 0.0;
        for bin in &self.bins {
            if bin.hi < *value {
                count += bin.height as f64;
            } else if bin.lo < *value {
                count += bin.height as f64 * T::ratio_below(&bin.lo, &bin.hi, value);
            } else {
                break;
            }
        }
        count
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
        let first = &self.bins[0];
        let last = &self.bins[self.bins.len() - 1];

        match condition {
            PredicateCondition::Equals => self.bin_index_for(&v).is_none(),
            PredicateCondition::NotEquals => {
                self.bins.len() == 1
                    && first.distinct_count == 1
                    && first.lo == v
            }
            PredicateCondition::LessThan => v <= first.lo,
            PredicateCondition::LessThanEquals => v < first.lo,
            PredicateCondition::GreaterThan => v >= last.hi,
            PredicateCondition::GreaterThanEquals => v > last.hi,
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
                if v2 < first.lo || v > last.hi {
                    return true;
                }
                let index = self.bins.partition_point(|bin| bin.hi < v);
                self.bins.get(index).is_some_and(|bin| bin.lo > v2)
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
        let v = match T::from_datum(value) {
            Some(v) => v,
            None => return CardinalityEstimate::approximately(row_count),
        };
        let first = &self.bins[0];
        let last = &self.bins[self.bins.len() - 1];

        match condition {
            PredicateCondition::Equals => {
                CardinalityEstimate::approximately(self.estimate_equals(&v))
            }
            PredicateCondition::NotEquals => {
                if self.bin_index_for(&v).is_none() {
                    CardinalityEstimate::all(row_count)
                } else {
                    CardinalityEstimate::approximately(row_count - self.estimate_equals(&v))
                }
            }
            PredicateCondition::LessThan => {
                if v > last.hi {
                    CardinalityEstimate::all(row_count)
                } else {
                    CardinalityEstimate::approximately(self.estimate_less_than(&v))
                }
            }
            PredicateCondition::LessThanEquals => {
                if v >= last.hi {
                    CardinalityEstimate::all(row_count)
                } else {
                    CardinalityEstimate::approximately(
                        self.estimate_less_than(&v) + self.estimate_equals(&v),
                    )
                }
            }
            PredicateCondition::GreaterThan => {
                if v < first.lo {
                    CardinalityEstimate::all(row_count)
                } else {
                    CardinalityEstimate::approximately(
                        row_count - self.estimate_less_than(&v) - self.estimate_equals(&v),
                    )
                }
            }
            PredicateCondition::GreaterThanEquals => {
                if v <= first.lo {
                    CardinalityEstimate::all(row_count)
                } else {
                    CardinalityEstimate::approximately(row_count - self.estimate_less_than(&v))
                }
            }
            PredicateCondition::Between => match value2.and_then(T::from_datum) {
                Some(v2) if v <= first.lo && v2 >= last.hi => CardinalityEstimate::all(row_count),
                Some(v2) => CardinalityEstimate::approximately(
                    self.estimate_less_than(&v2) + self.estimate_equals(&v2)
                        - self.estimate_less_than(&v),
                ),
                None => CardinalityEstimate::approximately(row_count),
            },
            _ => CardinalityEstimate::approximately(row_count),
        }
    }

    /// Histogram describing the segment after the predicate, or `None`
    /// when nothing would remain.
    pub fn sliced(
        &self,
        condition: PredicateCondition,
        value: &Datum,
        value2: Option<&Datum>,
    ) -> Option<EqualDistinctCountHistogram<T>> {
        if self.does_not_contain(condition, value, value2) {
            return None;
        }
        let v = match T::from_datum(value) {
            Some(v) => v,
            None => return Some(self.clone()),
        };

        let bins = match condition {
            PredicateCondition::Equals => {
                let height = self.estimate_equals(&v).round().max(1.0) as u64;
                vec![HistogramBin::new(v.clone(), v, height, 1)]
            }
            PredicateCondition::LessThan | PredicateCondition::LessThanEquals => {
                self.clip_bins(None, Some(&v))
            }
            PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
                self.clip_bins(Some(&v), None)
            }
            PredicateCondition::Between => match value2.and_then(T::from_datum) {
                Some(v2) => self.clip_bins(Some(&v), Some(&v2)),
                None => self.bins.clone(),
            },
            _ => self.bins.clone(),
        };
        if bins.is_empty() {
            return None;
        }

        let row_count = bins.iter().map(|bin| bin.height).sum();
        Some(EqualDistinctCountHistogram { bins, row_count })
    }

    /// Histogram for a selectivity-reduced copy: bounds unchanged, heights
    /// scaled.
    pub fn scaled(&self, selectivity: f64) -> EqualDistinctCountHistogram<T> {
        let bins: Vec<HistogramBin<T>> = self
            .bins
            .iter()
            .map(|bin| {
                let height = (bin.height as f64 * selectivity).round() as u64;
                HistogramBin {
                    lo: bin.lo.clone(),
                    hi: bin.hi.clone(),
                    height,
                    distinct_count: bin.distinct_count.min(height.max(1)),
                }
            })
            .collect();
        let row_count = bins.iter().map(|bin| bin.height).sum();
        EqualDistinctCountHistogram { bins, row_count }
    }

    /// Bins truncated to `[lower, upper]`; partial bins keep a
    /// proportional share of their height.
    fn clip_bins(&self, lower: Option<&T>, upper: Option<&T>) -> Vec<HistogramBin<T>> {
        let mut out = Vec::new();
        for bin in &self.bins {
            if lower.is_some_and(|lower| bin.hi < *lower)
                || upper.is_some_and(|upper| bin.lo > *upper)
            {
                continue;
            }
            let mut share = 1.0;
            let mut lo = bin.lo.clone();
            let mut hi = bin.hi.clone();
            if let Some(lower) = lower {
                if bin.lo < *lower {
                    share -= T::ratio_below(&bin.lo, &bin.hi, lower);
                    lo = lower.clone();
                }
            }
            if let Some(upper) = upper {
                if bin.hi > *upper {
                    share -= 1.0
                        - T::ratio_below(&bin.lo, &bin.hi, upper)
                        - 1.0 / bin.distinct_count.max(1) as f64;
                    hi = upper.clone();
                }
            }
            let height = (bin.height as f64 * share.clamp(0.0, 1.0)).round().max(1.0) as u64;
            let distinct =
                ((bin.distinct_count as f64 * share.clamp(0.0, 1.0)).round() as u64).clamp(1, bin.distinct_count);
            out.push(HistogramBin { lo, hi, height, distinct_count: distinct });
        }
        out
    }
}
