//! Unencoded segment: dense values plus a null bitmap

use crate::value::Element;
use strata_common::{Result, StrataError};

/// Dense, unencoded column data for one chunk.
///
/// Values and the null bitmap are parallel arrays; the slot behind a null
/// bit holds an arbitrary placeholder and must not be interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSegment<T: Element> {
    values: Vec<T>,
    nulls: Vec<bool>,
}

impl<T: Element> ValueSegment<T> {
    /// Segment without any nulls.
    pub fn new(values: Vec<T>) -> Self {
        let nulls = vec![false; values.len()];
        Self { values, nulls }
    }

    pub fn with_nulls(values: Vec<T>, nulls: Vec<bool>) -> Result<Self> {
        if values.len() != nulls.len() {
            return Err(StrataError::InvalidArgument(format!(
                "null bitmap length {} does not match value count {}",
                nulls.len(),
                values.len()
            )));
        }
        Ok(Self { values, nulls })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_null(&self, offset: usize) -> bool {
        self.nulls[offset]
    }

    /// Value at `offset`, or `None` for a null slot.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if self.nulls[offset] {
            None
        } else {
            Some(&self.values[offset])
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn nulls(&self) -> &[bool] {
        &self.nulls
    }

    pub fn null_count(&self) -> usize {
        self.nulls.iter().filter(|n| **n).count()
    }
}

impl<T: Element + Default> ValueSegment<T> {
    /// Build from optional values, storing `T::default()` behind null bits.
    pub fn from_options(values: Vec<Option<T>>) -> Self {
        let mut out_values = Vec::with_capacity(values.len());
        let mut nulls = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Some(v) => {
                    out_values.push(v);
                    nulls.push(false);
                }
                None => {
                    out_values.push(T::default());
                    nulls.push(true);
                }
            }
        }
        Self { values: out_values, nulls }
    }
}
