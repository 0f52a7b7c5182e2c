//! Segment model: one column of one chunk, in one of two encodings

pub mod dictionary_segment;
pub mod layout;
pub mod value_segment;

pub use dictionary_segment::{AttributeVector, DictionarySegment};
pub use value_segment::ValueSegment;

use crate::value::{Datum, Element, ElementKind};
use strata_common::{Result, StrataError};

/// One column's data in one chunk, under a single element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedSegment<T: Element> {
    Value(ValueSegment<T>),
    Dictionary(DictionarySegment<T>),
}

impl<T: Element> TypedSegment<T> {
    pub fn len(&self) -> usize {
        match self {
            TypedSegment::Value(segment) => segment.len(),
            TypedSegment::Dictionary(segment) => segment.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, offset: usize) -> bool {
        match self {
            TypedSegment::Value(segment) => segment.is_null(offset),
            TypedSegment::Dictionary(segment) => segment.is_null(offset),
        }
    }

    /// Value at `offset`, or `None` for a null slot.
    pub fn get(&self, offset: usize) -> Option<&T> {
        match self {
            TypedSegment::Value(segment) => segment.get(offset),
            TypedSegment::Dictionary(segment) => segment.get(offset),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            TypedSegment::Value(segment) => segment.null_count(),
            TypedSegment::Dictionary(segment) => segment.null_count(),
        }
    }

    /// Re-encode into a dictionary segment (identity if already one).
    pub fn to_dictionary(&self) -> Self {
        match self {
            TypedSegment::Value(segment) => {
                let values: Vec<Option<T>> =
                    (0..segment.len()).map(|offset| segment.get(offset).cloned()).collect();
                TypedSegment::Dictionary(DictionarySegment::from_options(&values))
            }
            TypedSegment::Dictionary(_) => self.clone(),
        }
    }
}

/// Kind-tagged segment. The scan core resolves the kind once per segment
/// via [`with_typed_segment!`] and runs a monomorphized loop underneath.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Int32(TypedSegment<i32>),
    Int64(TypedSegment<i64>),
    Float32(TypedSegment<f32>),
    Float64(TypedSegment<f64>),
    Text(TypedSegment<String>),
}

/// Resolve a [`Segment`] to its typed variant and evaluate `$body` with
/// `$typed` bound to the matching `TypedSegment<T>`.
#[macro_export]
macro_rules! with_typed_segment {
    ($segment:expr, |$typed:ident| $body:expr) => {
        match $segment {
            $crate::Segment::Int32($typed) => $body,
            $crate::Segment::Int64($typed) => $body,
            $crate::Segment::Float32($typed) => $body,
            $crate::Segment::Float64($typed) => $body,
            $crate::Segment::Text($typed) => $body,
        }
    };
}

impl Segment {
    pub fn element_kind(&self) -> ElementKind {
        match self {
            Segment::Int32(_) => ElementKind::Int32,
            Segment::Int64(_) => ElementKind::Int64,
            Segment::Float32(_) => ElementKind::Float32,
            Segment::Float64(_) => ElementKind::Float64,
            Segment::Text(_) => ElementKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        with_typed_segment!(self, |typed| typed.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, offset: usize) -> bool {
        with_typed_segment!(self, |typed| typed.is_null(offset))
    }

    pub fn null_count(&self) -> usize {
        with_typed_segment!(self, |typed| typed.null_count())
    }

    pub fn is_dictionary(&self) -> bool {
        with_typed_segment!(self, |typed| matches!(typed, TypedSegment::Dictionary(_)))
    }

    /// Value at `offset` as a datum; null slots yield `Datum::Null`.
    pub fn datum_at(&self, offset: usize) -> Datum {
        with_typed_segment!(self, |typed| match typed.get(offset) {
            Some(value) => value.clone().into_datum(),
            None => Datum::Null,
        })
    }

    /// Re-encode into dictionary form.
    pub fn to_dictionary(&self) -> Segment {
        match self {
            Segment::Int32(typed) => Segment::Int32(typed.to_dictionary()),
            Segment::Int64(typed) => Segment::Int64(typed.to_dictionary()),
            Segment::Float32(typed) => Segment::Float32(typed.to_dictionary()),
            Segment::Float64(typed) => Segment::Float64(typed.to_dictionary()),
            Segment::Text(typed) => Segment::Text(typed.to_dictionary()),
        }
    }

    /// Build a value segment of the given kind from datums. Every non-null
    /// datum must carry `kind`.
    pub fn from_datums(kind: ElementKind, datums: &[Datum]) -> Result<Segment> {
        fn collect<T: Element + Default>(datums: &[Datum]) -> Result<TypedSegment<T>> {
            let mut values = Vec::with_capacity(datums.len());
            for datum in datums {
                if datum.is_null() {
                    values.push(None);
                } else {
                    let value = T::from_datum(datum).ok_or_else(|| {
                        StrataError::TypeMismatch(format!(
                            "expected {} literal, got {:?}",
                            T::KIND,
                            datum
                        ))
                    })?;
                    values.push(Some(value));
                }
            }
            Ok(TypedSegment::Value(ValueSegment::from_options(values)))
        }

        Ok(match kind {
            ElementKind::Int32 => Segment::Int32(collect(datums)?),
            ElementKind::Int64 => Segment::Int64(collect(datums)?),
            ElementKind::Float32 => Segment::Float32(collect(datums)?),
            ElementKind::Float64 => Segment::Float64(collect(datums)?),
            ElementKind::Text => Segment::Text(collect(datums)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_datums_and_dispatch() {
        let segment = Segment::from_datums(
            ElementKind::Int32,
            &[Datum::Int32(3), Datum::Null, Datum::Int32(1)],
        )
        .unwrap();
        assert_eq!(segment.element_kind(), ElementKind::Int32);
        assert_eq!(segment.len(), 3);
        assert_eq!(segment.null_count(), 1);
        assert_eq!(segment.datum_at(0), Datum::Int32(3));
        assert_eq!(segment.datum_at(1), Datum::Null);
        assert!(!segment.is_dictionary());
    }

    #[test]
    fn test_from_datums_rejects_mixed_kinds() {
        let result =
            Segment::from_datums(ElementKind::Int32, &[Datum::Int32(1), Datum::Int64(2)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_to_dictionary_preserves_rows() {
        let segment = Segment::from_datums(
            ElementKind::Text,
            &[Datum::from("b"), Datum::from("a"), Datum::Null, Datum::from("b")],
        )
        .unwrap();
        let encoded = segment.to_dictionary();
        assert!(encoded.is_dictionary());
        assert_eq!(encoded.len(), segment.len());
        for offset in 0..segment.len() {
            assert_eq!(encoded.datum_at(offset), segment.datum_at(offset));
        }
    }
}
