//! Tables: ordered columns over a list of chunks

use crate::chunk::Chunk;
use crate::value::ElementKind;
use std::sync::Arc;
use strata_common::{ChunkId, ColumnId, Result, StrataError};

/// Definition of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ElementKind,
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, kind: ElementKind, nullable: bool) -> Self {
        Self { name: name.into(), kind, nullable }
    }
}

/// A read-only table: column definitions plus horizontally partitioned
/// chunks. Chunks are appended during load and never mutated afterwards.
#[derive(Debug)]
pub struct Table {
    columns: Vec<ColumnDefinition>,
    chunks: Vec<Arc<Chunk>>,
}

impl Table {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns, chunks: Vec::new() }
    }

    pub fn append_chunk(&mut self, chunk: Chunk) -> Result<()> {
        if chunk.column_count() != self.columns.len() {
            return Err(StrataError::InvalidArgument(format!(
                "chunk holds {} segments, table defines {} columns",
                chunk.column_count(),
                self.columns.len()
            )));
        }
        for (index, definition) in self.columns.iter().enumerate() {
            let segment = chunk
                .segment(ColumnId(index as u16))
                .expect("segment count was checked above");
            if segment.element_kind() != definition.kind {
                return Err(StrataError::TypeMismatch(format!(
                    "segment for column '{}' holds {}, expected {}",
                    definition.name,
                    segment.element_kind(),
                    definition.kind
                )));
            }
        }
        self.chunks.push(Arc::new(chunk));
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_definitions(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column_kind(&self, column_id: ColumnId) -> Option<ElementKind> {
        self.columns.get(column_id.0 as usize).map(|definition| definition.kind)
    }

    pub fn column_id_by_name(&self, name: &str) -> Option<ColumnId> {
        self.columns
            .iter()
            .position(|definition| definition.name == name)
            .map(|index| ColumnId(index as u16))
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, chunk_id: ChunkId) -> Option<&Arc<Chunk>> {
        self.chunks.get(chunk_id.0 as usize)
    }

    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub fn row_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.size()).sum()
    }
}
