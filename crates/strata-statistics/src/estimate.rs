//! Cardinality estimates

use serde::{Deserialize, Serialize};

/// How confident an estimate is about the matching row set.
///
/// `MatchesNone` is a guarantee (the pruning contract); the other two tags
/// are advisory. Row counts describe non-null rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateKind {
    MatchesNone,
    MatchesApproximately,
    MatchesAll,
}

/// Estimated number of matching rows, tagged with its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardinalityEstimate {
    pub kind: EstimateKind,
    pub cardinality: f64,
}

impl CardinalityEstimate {
    pub fn none() -> Self {
        Self { kind: EstimateKind::MatchesNone, cardinality: 0.0 }
    }

    pub fn approximately(cardinality: f64) -> Self {
        Self { kind: EstimateKind::MatchesApproximately, cardinality: cardinality.max(0.0) }
    }

    pub fn all(cardinality: f64) -> Self {
        Self { kind: EstimateKind::MatchesAll, cardinality }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(CardinalityEstimate::none().kind, EstimateKind::MatchesNone);
        assert_eq!(CardinalityEstimate::none().cardinality, 0.0);
        assert_eq!(CardinalityEstimate::all(5.0).kind, EstimateKind::MatchesAll);
        // estimates never go negative
        assert_eq!(CardinalityEstimate::approximately(-1.0).cardinality, 0.0);
    }
}
