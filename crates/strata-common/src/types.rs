//! Core identifiers and the predicate vocabulary

use serde::{Deserialize, Serialize};

/// Index of a chunk within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub u32);

/// Reserved chunk id marking a null reference slot in a position list
pub const INVALID_CHUNK_ID: ChunkId = ChunkId(u32::MAX);

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk_{}", self.0)
    }
}

impl From<u32> for ChunkId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Row offset within a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkOffset(pub u32);

/// Reserved chunk offset marking a null reference slot in a position list
pub const INVALID_CHUNK_OFFSET: ChunkOffset = ChunkOffset(u32::MAX);

impl From<u32> for ChunkOffset {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

/// Index of a column within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u16);

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column_{}", self.0)
    }
}

impl From<u16> for ColumnId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Index into the sorted dictionary of a dictionary segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

/// Reserved value id denoting null, both in attribute vectors (widened from
/// the vector's packed width) and as the "no such value" result of
/// dictionary bound lookups.
pub const INVALID_VALUE_ID: ValueId = ValueId(u32::MAX);

/// Condition of a single-column predicate.
///
/// `Like`, `NotLike`, `In` and `NotIn` are carried so that statistics can
/// recognize them as never prunable; the scan core does not evaluate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateCondition {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Between,
    IsNull,
    IsNotNull,
    Like,
    NotLike,
    In,
    NotIn,
}

impl PredicateCondition {
    /// One literal, ordered comparison against a single column value
    pub fn is_binary_comparison(&self) -> bool {
        matches!(
            self,
            PredicateCondition::Equals
                | PredicateCondition::NotEquals
                | PredicateCondition::LessThan
                | PredicateCondition::LessThanEquals
                | PredicateCondition::GreaterThan
                | PredicateCondition::GreaterThanEquals
        )
    }

    pub fn is_null_check(&self) -> bool {
        matches!(self, PredicateCondition::IsNull | PredicateCondition::IsNotNull)
    }

    /// Conditions the scan core evaluates; everything else is rejected
    pub fn is_supported_by_scan(&self) -> bool {
        self.is_binary_comparison() || self.is_null_check() || *self == PredicateCondition::Between
    }
}

impl std::fmt::Display for PredicateCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PredicateCondition::Equals => "=",
            PredicateCondition::NotEquals => "!=",
            PredicateCondition::LessThan => "<",
            PredicateCondition::LessThanEquals => "<=",
            PredicateCondition::GreaterThan => ">",
            PredicateCondition::GreaterThanEquals => ">=",
            PredicateCondition::Between => "BETWEEN",
            PredicateCondition::IsNull => "IS NULL",
            PredicateCondition::IsNotNull => "IS NOT NULL",
            PredicateCondition::Like => "LIKE",
            PredicateCondition::NotLike => "NOT LIKE",
            PredicateCondition::In => "IN",
            PredicateCondition::NotIn => "NOT IN",
        };
        write!(f, "{}", name)
    }
}

/// Physical ordering a chunk may be tagged with.
///
/// The tag is a contract: the non-null values of the tagged column form the
/// stated monotonic sequence in physical order, with nulls grouped at the
/// stated end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderMode {
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

impl OrderMode {
    pub fn is_ascending(&self) -> bool {
        matches!(self, OrderMode::AscNullsFirst | OrderMode::AscNullsLast)
    }

    pub fn nulls_first(&self) -> bool {
        matches!(self, OrderMode::AscNullsFirst | OrderMode::DescNullsFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_classification() {
        assert!(PredicateCondition::Equals.is_binary_comparison());
        assert!(PredicateCondition::GreaterThanEquals.is_binary_comparison());
        assert!(!PredicateCondition::Between.is_binary_comparison());
        assert!(PredicateCondition::Between.is_supported_by_scan());
        assert!(PredicateCondition::IsNull.is_null_check());
        assert!(!PredicateCondition::Like.is_supported_by_scan());
        assert!(!PredicateCondition::In.is_supported_by_scan());
    }

    #[test]
    fn test_order_mode() {
        assert!(OrderMode::AscNullsFirst.is_ascending());
        assert!(OrderMode::AscNullsFirst.nulls_first());
        assert!(!OrderMode::DescNullsLast.is_ascending());
        assert!(!OrderMode::AscNullsLast.nulls_first());
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(INVALID_VALUE_ID.0, u32::MAX);
        assert_eq!(INVALID_CHUNK_ID.0, u32::MAX);
        assert_eq!(INVALID_CHUNK_OFFSET.0, u32::MAX);
    }
}
