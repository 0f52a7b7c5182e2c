//! Row positions and position lists

use serde::{Deserialize, Serialize};
use strata_common::{
    ChunkId, ChunkOffset, ColumnId, OrderMode, Result, StrataError, INVALID_CHUNK_ID,
    INVALID_CHUNK_OFFSET,
};

/// One row: a chunk plus an offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowPosition {
    pub chunk_id: ChunkId,
    pub chunk_offset: ChunkOffset,
}

/// Reserved pair marking a null reference slot.
pub const NULL_ROW_POSITION: RowPosition = RowPosition {
    chunk_id: INVALID_CHUNK_ID,
    chunk_offset: INVALID_CHUNK_OFFSET,
};

impl RowPosition {
    pub fn new(chunk_id: ChunkId, chunk_offset: ChunkOffset) -> Self {
        Self { chunk_id, chunk_offset }
    }

    pub fn is_null(&self) -> bool {
        self.chunk_id == INVALID_CHUNK_ID && self.chunk_offset == INVALID_CHUNK_OFFSET
    }
}

/// Ordered sequence of row positions, the output of a scan.
///
/// Within one chunk the offsets are ascending; across chunks the order is
/// whatever the producer appended. The optional `ordered_by` tag forwards
/// the sort metadata of the scanned data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionList {
    positions: Vec<RowPosition>,
    ordered_by: Option<(ColumnId, OrderMode)>,
}

impl PositionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { positions: Vec::with_capacity(capacity), ordered_by: None }
    }

    pub fn push(&mut self, position: RowPosition) {
        self.positions.push(position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[RowPosition] {
        &self.positions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowPosition> {
        self.positions.iter()
    }

    pub fn ordered_by(&self) -> Option<(ColumnId, OrderMode)> {
        self.ordered_by
    }

    pub fn set_ordered_by(&mut self, ordered_by: Option<(ColumnId, OrderMode)>) {
        self.ordered_by = ordered_by;
    }

    /// Wire format: `(chunk_id: u32 LE, chunk_offset: u32 LE)` per entry.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.positions.len() * 8);
        for position in &self.positions {
            bytes.extend_from_slice(&position.chunk_id.0.to_le_bytes());
            bytes.extend_from_slice(&position.chunk_offset.0.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(StrataError::InvalidArgument(format!(
                "position list payload of {} bytes is not a multiple of 8",
                bytes.len()
            )));
        }
        let positions = bytes
            .chunks_exact(8)
            .map(|pair| {
                let chunk_id = u32::from_le_bytes(pair[0..4].try_into().unwrap());
                let chunk_offset = u32::from_le_bytes(pair[4..8].try_into().unwrap());
                RowPosition::new(ChunkId(chunk_id), ChunkOffset(chunk_offset))
            })
            .collect();
        Ok(Self { positions, ordered_by: None })
    }
}

impl FromIterator<RowPosition> for PositionList {
    fn from_iter<I: IntoIterator<Item = RowPosition>>(iter: I) -> Self {
        Self { positions: iter.into_iter().collect(), ordered_by: None }
    }
}

impl<'a> IntoIterator for &'a PositionList {
    type Item = &'a RowPosition;
    type IntoIter = std::slice::Iter<'a, RowPosition>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinel() {
        assert!(NULL_ROW_POSITION.is_null());
        assert!(!RowPosition::new(ChunkId(0), ChunkOffset(0)).is_null());
        assert!(!RowPosition::new(INVALID_CHUNK_ID, ChunkOffset(0)).is_null());
    }

    #[test]
    fn test_wire_round_trip() {
        let mut list = PositionList::new();
        list.push(RowPosition::new(ChunkId(0), ChunkOffset(3)));
        list.push(NULL_ROW_POSITION);
        list.push(RowPosition::new(ChunkId(2), ChunkOffset(7)));

        let decoded = PositionList::from_bytes(&list.to_bytes()).unwrap();
        assert_eq!(decoded.positions(), list.positions());
        assert!(decoded.positions()[1].is_null());
    }

    #[test]
    fn test_from_bytes_rejects_truncated_payload() {
        assert!(PositionList::from_bytes(&[0u8; 7]).is_err());
    }
}
