//! Building chunks and tables from Arrow record batches

use crate::chunk::Chunk;
use crate::segment::{Segment, TypedSegment, ValueSegment};
use crate::table::{ColumnDefinition, Table};
use crate::value::ElementKind;
use arrow_array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::DataType;
use std::sync::Arc;
use strata_common::{EngineConfig, Result, StrataError};

impl ElementKind {
    /// Mapping from the Arrow types accepted at the ingestion boundary.
    pub fn from_arrow(data_type: &DataType) -> Option<ElementKind> {
        match data_type {
            DataType::Int32 => Some(ElementKind::Int32),
            DataType::Int64 => Some(ElementKind::Int64),
            DataType::Float32 => Some(ElementKind::Float32),
            DataType::Float64 => Some(ElementKind::Float64),
            DataType::Utf8 => Some(ElementKind::Text),
            _ => None,
        }
    }
}

fn downcast<'a, A: 'static>(array: &'a dyn Array, expected: &str) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        StrataError::TypeMismatch(format!("array is not a {} array", expected))
    })
}

/// Convert one Arrow array into an unencoded segment.
pub fn segment_from_array(array: &dyn Array) -> Result<Segment> {
    match array.data_type() {
        DataType::Int32 => {
            let array = downcast::<Int32Array>(array, "int32")?;
            let values: Vec<i32> = (0..array.len()).map(|i| array.value(i)).collect();
            let nulls: Vec<bool> = (0..array.len()).map(|i| array.is_null(i)).collect();
            Ok(Segment::Int32(TypedSegment::Value(ValueSegment::with_nulls(values, nulls)?)))
        }
        DataType::Int64 => {
            let array = downcast::<Int64Array>(array, "int64")?;
            let values: Vec<i64> = (0..array.len()).map(|i| array.value(i)).collect();
            let nulls: Vec<bool> = (0..array.len()).map(|i| array.is_null(i)).collect();
            Ok(Segment::Int64(TypedSegment::Value(ValueSegment::with_nulls(values, nulls)?)))
        }
        DataType::Float32 => {
            let array = downcast::<Float32Array>(array, "float32")?;
            let values: Vec<f32> = (0..array.len()).map(|i| array.value(i)).collect();
            let nulls: Vec<bool> = (0..array.len()).map(|i| array.is_null(i)).collect();
            Ok(Segment::Float32(TypedSegment::Value(ValueSegment::with_nulls(values, nulls)?)))
        }
        DataType::Float64 => {
            let array = downcast::<Float64Array>(array, "float64")?;
            let values: Vec<f64> = (0..array.len()).map(|i| array.value(i)).collect();
            let nulls: Vec<bool> = (0..array.len()).map(|i| array.is_null(i)).collect();
            Ok(Segment::Float64(TypedSegment::Value(ValueSegment::with_nulls(values, nulls)?)))
        }
        DataType::Utf8 => {
            let array = downcast::<StringArray>(array, "utf8")?;
            let values: Vec<String> = (0..array.len())
                .map(|i| if array.is_null(i) { String::new() } else { array.value(i).to_string() })
                .collect();
            let nulls: Vec<bool> = (0..array.len()).map(|i| array.is_null(i)).collect();
            Ok(Segment::Text(TypedSegment::Value(ValueSegment::with_nulls(values, nulls)?)))
        }
        other => Err(StrataError::TypeMismatch(format!(
            "no element kind for arrow type {:?}",
            other
        ))),
    }
}

/// Convert one record batch into a chunk (one segment per column). The
/// config sizes the chunk's access-counter history.
pub fn chunk_from_record_batch(batch: &RecordBatch, config: &EngineConfig) -> Result<Chunk> {
    let segments = batch
        .columns()
        .iter()
        .map(|array| segment_from_array(array.as_ref()).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;
    Ok(Chunk::new(segments)?.with_access_history_capacity(config.access_history_capacity))
}

/// Build a table from record batches sharing one schema; each batch
/// becomes one chunk.
pub fn table_from_record_batches(batches: &[RecordBatch], config: &EngineConfig) -> Result<Table> {
    let first = batches.first().ok_or_else(|| {
        StrataError::InvalidArgument("cannot build a table from zero batches".to_string())
    })?;

    let columns = first
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let kind = ElementKind::from_arrow(field.data_type()).ok_or_else(|| {
                StrataError::TypeMismatch(format!(
                    "no element kind for arrow type {:?} of field '{}'",
                    field.data_type(),
                    field.name()
                ))
            })?;
            Ok(ColumnDefinition::new(field.name().clone(), kind, field.is_nullable()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut table = Table::new(columns);
    for batch in batches {
        table.append_chunk(chunk_from_record_batch(batch, config)?)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{Field, Schema};
    use strata_common::ColumnId;

    fn test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_chunk_from_batch() {
        let chunk = chunk_from_record_batch(&test_batch(), &EngineConfig::default()).unwrap();
        assert_eq!(chunk.size(), 3);
        assert_eq!(chunk.column_count(), 2);

        let id_segment = chunk.segment(ColumnId(0)).unwrap();
        assert_eq!(id_segment.element_kind(), ElementKind::Int32);
        assert!(id_segment.is_null(1));

        let name_segment = chunk.segment(ColumnId(1)).unwrap();
        assert_eq!(name_segment.element_kind(), ElementKind::Text);
        assert!(name_segment.is_null(2));
    }

    #[test]
    fn test_table_from_batches() {
        let table =
            table_from_record_batches(&[test_batch(), test_batch()], &EngineConfig::default())
                .unwrap();
        assert_eq!(table.chunk_count(), 2);
        assert_eq!(table.row_count(), 6);
        assert_eq!(table.column_id_by_name("name"), Some(ColumnId(1)));
    }

    #[test]
    fn test_unsupported_arrow_type() {
        assert_eq!(ElementKind::from_arrow(&DataType::Boolean), None);
    }
}
