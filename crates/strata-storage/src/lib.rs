//! Strata Storage - Segments, chunks, tables, and position lists

pub mod access_counter;
pub mod chunk;
pub mod ingest;
pub mod pos_list;
pub mod segment;
pub mod table;
pub mod value;

pub use access_counter::AccessCounter;
pub use chunk::{Chunk, SegmentStatistics};
pub use ingest::{chunk_from_record_batch, segment_from_array, table_from_record_batches};
pub use pos_list::{PositionList, RowPosition, NULL_ROW_POSITION};
pub use segment::{AttributeVector, DictionarySegment, Segment, TypedSegment, ValueSegment};
pub use table::{ColumnDefinition, Table};
pub use value::{Datum, Element, ElementKind};
