//! Value domain: element kinds, variant values, and the element trait

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Closed set of kinds a segment, literal, or statistic can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Int32 => "int32",
            ElementKind::Int64 => "int64",
            ElementKind::Float32 => "float32",
            ElementKind::Float64 => "float64",
            ElementKind::Text => "text",
        };
        write!(f, "{}", name)
    }
}

/// A value of any element kind, or null.
///
/// Comparing anything against `Null` yields unknown, which is why the
/// comparison helpers below return `Option<Ordering>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Null,
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Kind of the value, or `None` for null.
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            Datum::Int32(_) => Some(ElementKind::Int32),
            Datum::Int64(_) => Some(ElementKind::Int64),
            Datum::Float32(_) => Some(ElementKind::Float32),
            Datum::Float64(_) => Some(ElementKind::Float64),
            Datum::Text(_) => Some(ElementKind::Text),
            Datum::Null => None,
        }
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int32(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int64(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Datum::Float32(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float64(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Text(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Text(v)
    }
}

/// A concrete Rust type backing one element kind.
///
/// The scan and statistics inner loops are monomorphized over this trait;
/// the `Datum` boundary exists only at the operator surface.
pub trait Element: Clone + PartialOrd + Send + Sync + 'static {
    const KIND: ElementKind;

    /// Extract a typed value; `None` for null or a different kind.
    fn from_datum(datum: &Datum) -> Option<Self>;

    fn into_datum(self) -> Datum;

    /// Total order used when sorting values at build time. Floats use IEEE
    /// total ordering so NaN does not poison dictionary construction.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Int32;

    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Int32(v) => Some(*v),
            _ => None,
        }
    }

    fn into_datum(self) -> Datum {
        Datum::Int32(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::Int64;

    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Int64(v) => Some(*v),
            _ => None,
        }
    }

    fn into_datum(self) -> Datum {
        Datum::Int64(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::Float32;

    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Float32(v) => Some(*v),
            _ => None,
        }
    }

    fn into_datum(self) -> Datum {
        Datum::Float32(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Float64;

    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Float64(v) => Some(*v),
            _ => None,
        }
    }

    fn into_datum(self) -> Datum {
        Datum::Float64(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

impl Element for String {
    const KIND: ElementKind = ElementKind::Text;

    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_datum(self) -> Datum {
        Datum::Text(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_kind() {
        assert_eq!(Datum::Int32(1).kind(), Some(ElementKind::Int32));
        assert_eq!(Datum::Text("x".to_string()).kind(), Some(ElementKind::Text));
        assert_eq!(Datum::Null.kind(), None);
        assert!(Datum::Null.is_null());
    }

    #[test]
    fn test_element_round_trip() {
        assert_eq!(i32::from_datum(&Datum::Int32(7)), Some(7));
        assert_eq!(i32::from_datum(&Datum::Int64(7)), None);
        assert_eq!(i32::from_datum(&Datum::Null), None);
        assert_eq!(42i64.into_datum(), Datum::Int64(42));
        assert_eq!(String::from_datum(&Datum::from("abc")), Some("abc".to_string()));
    }

    #[test]
    fn test_float_total_order() {
        let mut values = vec![1.5f64, f64::NAN, -2.0, 0.0];
        values.sort_by(|a, b| Element::total_cmp(a, b));
        assert_eq!(values[0], -2.0);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 1.5);
        assert!(values[3].is_nan());
    }
}
