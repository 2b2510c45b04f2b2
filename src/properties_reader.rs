//! Column-indexed property values of a feature.
//!
//! A property blob is a sequence of `(u16 column index, value)` pairs in any
//! column order, without a pair count. Values are laid out according to the
//! column type declared in the header.

use crate::error::PropertyError;
use crate::header::{Column, ColumnType};
use byteorder::{ByteOrder, LittleEndian};
use geozero::ColumnValue;
use log::{debug, warn};
use std::mem::size_of;
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};

/// Forward-only reader over a byte slice. Reads past the end return `None`.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Unread part of the slice.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.take(size_of::<u16>()).map(LittleEndian::read_u16)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.take(size_of::<u32>()).map(LittleEndian::read_u32)
    }
}

impl ColumnType {
    /// Width of values with a fixed encoding, `None` for length-prefixed types.
    pub fn fixed_width(self) -> Option<usize> {
        use ColumnType::*;
        match self {
            Byte | UByte | Bool => Some(size_of::<u8>()),
            Short | UShort => Some(size_of::<u16>()),
            Int | UInt => Some(size_of::<u32>()),
            Float => Some(size_of::<f32>()),
            Long | ULong => Some(size_of::<u64>()),
            Double => Some(size_of::<f64>()),
            String | Json | DateTime | Binary => None,
        }
    }

    /// Bytes occupied by the value at the start of `bytes`, `None` if it is truncated.
    pub fn value_width(self, bytes: &[u8]) -> Option<usize> {
        let width = match self.fixed_width() {
            Some(width) => width,
            None => {
                let len = ByteCursor::new(bytes).read_u32()? as usize;
                size_of::<u32>().checked_add(len)?
            }
        };
        (width <= bytes.len()).then_some(width)
    }

    /// Decodes the value at the start of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Option<ColumnValue<'_>> {
        use ColumnType::*;
        let mut cursor = ByteCursor::new(bytes);
        let value = match self {
            Byte => ColumnValue::Byte(i8::from_le_bytes([*bytes.first()?])),
            UByte => ColumnValue::UByte(*bytes.first()?),
            Bool => ColumnValue::Bool(*bytes.first()? != 0),
            Short => ColumnValue::Short(LittleEndian::read_i16(cursor.take(2)?)),
            UShort => ColumnValue::UShort(LittleEndian::read_u16(cursor.take(2)?)),
            Int => ColumnValue::Int(LittleEndian::read_i32(cursor.take(4)?)),
            UInt => ColumnValue::UInt(LittleEndian::read_u32(cursor.take(4)?)),
            Long => ColumnValue::Long(LittleEndian::read_i64(cursor.take(8)?)),
            ULong => ColumnValue::ULong(LittleEndian::read_u64(cursor.take(8)?)),
            Float => ColumnValue::Float(LittleEndian::read_f32(cursor.take(4)?)),
            Double => ColumnValue::Double(LittleEndian::read_f64(cursor.take(8)?)),
            String | Json | DateTime | Binary => {
                let len = cursor.read_u32()? as usize;
                let data = cursor.take(len)?;
                match (self, str::from_utf8(data)) {
                    (String, Ok(text)) => ColumnValue::String(text),
                    (Json, Ok(text)) => ColumnValue::Json(text),
                    (DateTime, Ok(text)) => ColumnValue::DateTime(text),
                    // raw bytes, rendered lossily
                    _ => ColumnValue::Binary(data),
                }
            }
        };
        Some(value)
    }
}

/// Renders a decoded value as CSV text. Floats use `float_precision` fixed decimals.
pub fn value_to_string(value: &ColumnValue<'_>, float_precision: usize) -> String {
    match value {
        ColumnValue::Byte(v) => v.to_string(),
        ColumnValue::UByte(v) => v.to_string(),
        ColumnValue::Bool(v) => v.to_string(),
        ColumnValue::Short(v) => v.to_string(),
        ColumnValue::UShort(v) => v.to_string(),
        ColumnValue::Int(v) => v.to_string(),
        ColumnValue::UInt(v) => v.to_string(),
        ColumnValue::Long(v) => v.to_string(),
        ColumnValue::ULong(v) => v.to_string(),
        ColumnValue::Float(v) => format!("{:.*}", float_precision, f64::from(*v)),
        ColumnValue::Double(v) => format!("{:.*}", float_precision, v),
        ColumnValue::String(v) | ColumnValue::Json(v) | ColumnValue::DateTime(v) => {
            v.to_string()
        }
        ColumnValue::Binary(v) => String::from_utf8_lossy(v).into_owned(),
    }
}

/// Looks up single columns in property blobs, using the column schema of one file.
#[derive(Debug)]
pub struct PropertyDecoder {
    types: Vec<ColumnType>,
    float_precision: usize,
    /// Json/DateTime/Binary values are read like strings; warned about once
    warned_variable_type: AtomicBool,
}

impl PropertyDecoder {
    pub fn new(columns: &[Column], float_precision: usize) -> Self {
        PropertyDecoder {
            types: columns.iter().map(|column| column.type_).collect(),
            float_precision,
            warned_variable_type: AtomicBool::new(false),
        }
    }

    /// Value of column `target` in `blob`, `None` if the feature does not encode it.
    pub fn find<'a>(
        &self,
        blob: &'a [u8],
        target: usize,
    ) -> Result<Option<ColumnValue<'a>>, PropertyError> {
        if target >= self.types.len() {
            return Ok(None);
        }
        let mut cursor = ByteCursor::new(blob);
        while let Some(index) = cursor.read_u16() {
            let index_offset = cursor.position() - size_of::<u16>();
            let Some(&column_type) = self.types.get(index as usize) else {
                return Err(PropertyError::CorruptColumnIndex {
                    index,
                    offset: index_offset,
                });
            };
            let value_offset = cursor.position();
            let truncated = PropertyError::TruncatedValue {
                column: index as usize,
                offset: value_offset,
            };
            let width = column_type.value_width(cursor.rest()).ok_or(truncated.clone())?;
            let value_bytes = cursor.take(width).ok_or(truncated.clone())?;
            if index as usize == target {
                self.note_variable_type(column_type, index);
                return column_type.decode(value_bytes).map(Some).ok_or(truncated);
            }
        }
        Ok(None)
    }

    /// Value of column `target` rendered as text.
    pub fn find_string(&self, blob: &[u8], target: usize) -> Result<Option<String>, PropertyError> {
        Ok(self
            .find(blob, target)?
            .map(|value| value_to_string(&value, self.float_precision)))
    }

    fn note_variable_type(&self, column_type: ColumnType, index: u16) {
        if !matches!(
            column_type,
            ColumnType::Json | ColumnType::DateTime | ColumnType::Binary
        ) {
            return;
        }
        if !self.warned_variable_type.swap(true, Ordering::Relaxed) {
            warn!("Column {index} has type {column_type:?}, reading it as a length-prefixed string");
        } else {
            debug!("Reading column {index} of type {column_type:?} as a length-prefixed string");
        }
    }
}
