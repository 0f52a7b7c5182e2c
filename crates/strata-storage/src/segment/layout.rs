//! Persisted dictionary-segment layout
//!
//! Header: element-kind tag (u8), dictionary size `U` (u32 LE), row count
//! `N` (u32 LE), attribute-vector width in bits (u8). Body: `U` sorted
//! dictionary values, then `N` packed value-ids at the stated width with
//! `INVALID = (1 << width) - 1`.

use crate::segment::dictionary_segment::{AttributeVector, DictionarySegment};
use crate::segment::{Segment, TypedSegment};
use crate::value::{Element, ElementKind};
use std::io::{self, Read, Write};
use strata_common::{Result, StrataError};

const KIND_INT32: u8 = 0;
const KIND_INT64: u8 = 1;
const KIND_FLOAT32: u8 = 2;
const KIND_FLOAT64: u8 = 3;
const KIND_TEXT: u8 = 4;

fn kind_tag(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::Int32 => KIND_INT32,
        ElementKind::Int64 => KIND_INT64,
        ElementKind::Float32 => KIND_FLOAT32,
        ElementKind::Float64 => KIND_FLOAT64,
        ElementKind::Text => KIND_TEXT,
    }
}

/// Per-kind value codec for the layout body.
trait WireValue: Element + Sized {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>;
}

macro_rules! impl_wire_scalar {
    ($ty:ty) => {
        impl WireValue for $ty {
            fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
                writer.write_all(&self.to_le_bytes())
            }

            fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                reader.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    };
}

impl_wire_scalar!(i32);
impl_wire_scalar!(i64);
impl_wire_scalar!(f32);
impl_wire_scalar!(f64);

impl WireValue for String {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let bytes = self.as_bytes();
        writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
        writer.write_all(bytes)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let length = read_u32(reader)? as usize;
        let mut buf = vec![0u8; length];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_attribute_vector<W: Write>(vector: &AttributeVector, writer: &mut W) -> io::Result<()> {
    match vector {
        AttributeVector::Width8(ids) => writer.write_all(ids),
        AttributeVector::Width16(ids) => {
            for id in ids {
                writer.write_all(&id.to_le_bytes())?;
            }
            Ok(())
        }
        AttributeVector::Width32(ids) => {
            for id in ids {
                writer.write_all(&id.to_le_bytes())?;
            }
            Ok(())
        }
    }
}

fn read_attribute_vector<R: Read>(
    reader: &mut R,
    width_bits: u8,
    row_count: usize,
) -> Result<AttributeVector> {
    match width_bits {
        8 => {
            let mut ids = vec![0u8; row_count];
            reader.read_exact(&mut ids)?;
            Ok(AttributeVector::Width8(ids))
        }
        16 => {
            let mut ids = Vec::with_capacity(row_count);
            for _ in 0..row_count {
                let mut buf = [0u8; 2];
                reader.read_exact(&mut buf)?;
                ids.push(u16::from_le_bytes(buf));
            }
            Ok(AttributeVector::Width16(ids))
        }
        32 => {
            let mut ids = Vec::with_capacity(row_count);
            for _ in 0..row_count {
                ids.push(read_u32(reader)?);
            }
            Ok(AttributeVector::Width32(ids))
        }
        other => Err(StrataError::InvalidArgument(format!(
            "unsupported attribute vector width: {} bits",
            other
        ))),
    }
}

fn encode_typed<T: WireValue, W: Write>(
    segment: &DictionarySegment<T>,
    writer: &mut W,
) -> Result<()> {
    writer.write_all(&[kind_tag(T::KIND)])?;
    writer.write_all(&(segment.unique_values_count() as u32).to_le_bytes())?;
    writer.write_all(&(segment.len() as u32).to_le_bytes())?;
    writer.write_all(&[segment.attribute_vector().width_bits()])?;
    for value in segment.dictionary() {
        value.write_to(writer)?;
    }
    write_attribute_vector(segment.attribute_vector(), writer)?;
    Ok(())
}

fn decode_typed<T: WireValue, R: Read>(
    reader: &mut R,
    unique_values_count: usize,
    row_count: usize,
    width_bits: u8,
) -> Result<DictionarySegment<T>> {
    let mut dictionary = Vec::with_capacity(unique_values_count);
    for _ in 0..unique_values_count {
        dictionary.push(T::read_from(reader)?);
    }
    let attribute_vector = read_attribute_vector(reader, width_bits, row_count)?;
    DictionarySegment::from_parts(dictionary, attribute_vector)
}

/// Persist a dictionary segment. Value segments have no wire layout and
/// are rejected with `InvalidArgument`.
pub fn encode_segment<W: Write>(segment: &Segment, writer: &mut W) -> Result<()> {
    macro_rules! encode_variant {
        ($typed:expr, $writer:expr) => {
            match $typed {
                TypedSegment::Dictionary(dictionary) => encode_typed(dictionary, $writer),
                TypedSegment::Value(_) => Err(StrataError::InvalidArgument(
                    "only dictionary segments have a persisted layout".to_string(),
                )),
            }
        };
    }

    match segment {
        Segment::Int32(typed) => encode_variant!(typed, writer),
        Segment::Int64(typed) => encode_variant!(typed, writer),
        Segment::Float32(typed) => encode_variant!(typed, writer),
        Segment::Float64(typed) => encode_variant!(typed, writer),
        Segment::Text(typed) => encode_variant!(typed, writer),
    }
}

/// Read back a segment persisted by [`encode_segment`].
pub fn decode_segment<R: Read>(reader: &mut R) -> Result<Segment> {
    let kind = read_u8(reader)?;
    let unique_values_count = read_u32(reader)? as usize;
    let row_count = read_u32(reader)? as usize;
    let width_bits = read_u8(reader)?;

    let segment = match kind {
        KIND_INT32 => Segment::Int32(TypedSegment::Dictionary(decode_typed(
            reader,
            unique_values_count,
            row_count,
            width_bits,
        )?)),
        KIND_INT64 => Segment::Int64(TypedSegment::Dictionary(decode_typed(
            reader,
            unique_values_count,
            row_count,
            width_bits,
        )?)),
        KIND_FLOAT32 => Segment::Float32(TypedSegment::Dictionary(decode_typed(
            reader,
            unique_values_count,
            row_count,
            width_bits,
        )?)),
        KIND_FLOAT64 => Segment::Float64(TypedSegment::Dictionary(decode_typed(
            reader,
            unique_values_count,
            row_count,
            width_bits,
        )?)),
        KIND_TEXT => Segment::Text(TypedSegment::Dictionary(decode_typed(
            reader,
            unique_values_count,
            row_count,
            width_bits,
        )?)),
        other => {
            return Err(StrataError::InvalidArgument(format!(
                "unknown element kind tag: {}",
                other
            )))
        }
    };
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Datum;
    use std::io::{Seek, SeekFrom};

    fn round_trip(segment: &Segment) -> Segment {
        let mut bytes = Vec::new();
        encode_segment(segment, &mut bytes).unwrap();
        decode_segment(&mut bytes.as_slice()).unwrap()
    }

    #[test]
    fn test_int_round_trip() {
        let segment = Segment::from_datums(
            ElementKind::Int32,
            &[Datum::Int32(30), Datum::Int32(10), Datum::Null, Datum::Int32(10)],
        )
        .unwrap()
        .to_dictionary();

        let decoded = round_trip(&segment);
        assert_eq!(decoded, segment);
    }

    #[test]
    fn test_text_round_trip() {
        let segment = Segment::from_datums(
            ElementKind::Text,
            &[Datum::from("bb"), Datum::from("a"), Datum::Null, Datum::from("bb")],
        )
        .unwrap()
        .to_dictionary();

        let decoded = round_trip(&segment);
        assert_eq!(decoded, segment);
    }

    #[test]
    fn test_header_shape() {
        let segment = Segment::from_datums(
            ElementKind::Int32,
            &[Datum::Int32(5), Datum::Null, Datum::Int32(7)],
        )
        .unwrap()
        .to_dictionary();

        let mut bytes = Vec::new();
        encode_segment(&segment, &mut bytes).unwrap();
        assert_eq!(bytes[0], KIND_INT32);
        assert_eq!(u32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2); // U
        assert_eq!(u32::from_le_bytes(bytes[5..9].try_into().unwrap()), 3); // N
        assert_eq!(bytes[9], 8); // width bits
        // body: dictionary [5, 7] then ids [0, INVALID, 1]
        assert_eq!(bytes.len(), 10 + 8 + 3);
        assert_eq!(bytes[18], 0);
        assert_eq!(bytes[19], u8::MAX); // null slot is the width's maximum
        assert_eq!(bytes[20], 1);
    }

    #[test]
    fn test_rejects_value_segment() {
        let segment =
            Segment::from_datums(ElementKind::Int32, &[Datum::Int32(1)]).unwrap();
        let mut bytes = Vec::new();
        assert!(encode_segment(&segment, &mut bytes).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let segment = Segment::from_datums(
            ElementKind::Int64,
            &[Datum::Int64(1), Datum::Int64(2), Datum::Null],
        )
        .unwrap()
        .to_dictionary();

        let mut file = tempfile::tempfile().unwrap();
        encode_segment(&segment, &mut file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let decoded = decode_segment(&mut file).unwrap();
        assert_eq!(decoded, segment);
    }
}
