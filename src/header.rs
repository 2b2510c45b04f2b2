//! FlatGeobuf file header: magic bytes, size-prefixed `Header` table and column schema.

use crate::config::ColumnNames;
use crate::error::{Error, Result};
use crate::header_generated::size_prefixed_root_as_header_with_opts;
use crate::packed_r_tree::PackedRTree;
use crate::{check_magic_bytes, verifier_options, HEADER_MAX_BUFFER_SIZE, MAGIC_BYTES};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt::{Display, Formatter};
use std::mem::size_of;

/// Magic bytes followed by the header size field.
pub const PREAMBLE_SIZE: usize = MAGIC_BYTES.len() + size_of::<u32>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GeometryType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
    CircularString = 8,
    CompoundCurve = 9,
    CurvePolygon = 10,
    MultiCurve = 11,
    MultiSurface = 12,
    Curve = 13,
    Surface = 14,
    PolyhedralSurface = 15,
    TIN = 16,
    Triangle = 17,
}

impl GeometryType {
    /// Unknown tags map to [`GeometryType::Unknown`].
    pub fn from_u8(tag: u8) -> Self {
        use GeometryType::*;
        match tag {
            1 => Point,
            2 => LineString,
            3 => Polygon,
            4 => MultiPoint,
            5 => MultiLineString,
            6 => MultiPolygon,
            7 => GeometryCollection,
            8 => CircularString,
            9 => CompoundCurve,
            10 => CurvePolygon,
            11 => MultiCurve,
            12 => MultiSurface,
            13 => Curve,
            14 => Surface,
            15 => PolyhedralSurface,
            16 => TIN,
            17 => Triangle,
            _ => Unknown,
        }
    }

    pub fn is_polygonal(self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Declared type of a property column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColumnType {
    Byte = 0,
    UByte = 1,
    Bool = 2,
    Short = 3,
    UShort = 4,
    Int = 5,
    UInt = 6,
    Long = 7,
    ULong = 8,
    Float = 9,
    Double = 10,
    String = 11,
    Json = 12,
    DateTime = 13,
    Binary = 14,
}

impl ColumnType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        use ColumnType::*;
        Some(match tag {
            0 => Byte,
            1 => UByte,
            2 => Bool,
            3 => Short,
            4 => UShort,
            5 => Int,
            6 => UInt,
            7 => Long,
            8 => ULong,
            9 => Float,
            10 => Double,
            11 => String,
            12 => Json,
            13 => DateTime,
            14 => Binary,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_: ColumnType,
}

/// Decoded FlatGeobuf header.
#[derive(Debug, Clone)]
pub struct Header {
    pub name: Option<String>,
    pub geometry_type: GeometryType,
    pub has_z: bool,
    pub has_m: bool,
    pub columns: Vec<Column>,
    pub features_count: u64,
    /// 0 when the file carries no spatial index
    pub index_node_size: u16,
    /// Size of the header table, excluding magic bytes and size field
    pub header_size: usize,
}

/// Column indices of the metadata fields written to the CSV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub name: Option<usize>,
    pub code: Option<usize>,
    pub county: Option<usize>,
}

impl Header {
    /// Number of coordinate components per point.
    pub fn coordinate_stride(&self) -> u32 {
        2 + u32::from(self.has_z) + u32::from(self.has_m)
    }

    /// Size in bytes of the spatial index following the header.
    pub fn index_size(&self) -> Result<usize> {
        if self.index_node_size == 0 || self.features_count == 0 {
            return Ok(0);
        }
        usize::try_from(self.features_count)
            .ok()
            .and_then(|count| PackedRTree::index_size(count, self.index_node_size))
            .ok_or(Error::IllegalIndexSize {
                features_count: self.features_count,
                node_size: self.index_node_size,
            })
    }

    /// File offset of the first feature record.
    pub fn features_offset(&self) -> Result<usize> {
        let index_size = self.index_size()?;
        (PREAMBLE_SIZE + self.header_size)
            .checked_add(index_size)
            .ok_or(Error::IllegalIndexSize {
                features_count: self.features_count,
                node_size: self.index_node_size,
            })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn resolve_columns(&self, names: &ColumnNames) -> ResolvedColumns {
        ResolvedColumns {
            name: self.column_index(&names.name),
            code: self.column_index(&names.code),
            county: self.column_index(&names.county),
        }
    }
}

/// Validates the preamble and decodes the header of a complete FlatGeobuf file.
///
/// Fails if the dataset is not a Polygon or MultiPolygon collection, or if the
/// spatial index announced by the header does not fit in `buf`.
pub fn read_header(buf: &[u8]) -> Result<Header> {
    if buf.len() < PREAMBLE_SIZE {
        return Err(Error::FileTooSmall(buf.len()));
    }
    if !check_magic_bytes(&buf[..MAGIC_BYTES.len()]) {
        return Err(Error::MissingMagicBytes);
    }
    let header_size = LittleEndian::read_u32(&buf[MAGIC_BYTES.len()..PREAMBLE_SIZE]) as usize;
    if header_size > HEADER_MAX_BUFFER_SIZE || header_size < 8 {
        // minimum size check avoids decoding a table from a few stray bytes
        return Err(Error::IllegalHeaderSize(header_size));
    }
    // verified together with its size prefix, the table alignment is relative to it
    let header_buf = buf
        .get(MAGIC_BYTES.len()..PREAMBLE_SIZE + header_size)
        .ok_or(Error::TruncatedHeader {
            declared: header_size,
            available: buf.len() - PREAMBLE_SIZE,
        })?;

    let header = decode_header_table(header_buf, header_size)?;
    if !header.geometry_type.is_polygonal() {
        return Err(Error::UnsupportedGeometry(header.geometry_type));
    }
    if header.features_offset()? > buf.len() {
        return Err(Error::IllegalIndexSize {
            features_count: header.features_count,
            node_size: header.index_node_size,
        });
    }
    Ok(header)
}

fn decode_header_table(header_buf: &[u8], header_size: usize) -> Result<Header> {
    let header = size_prefixed_root_as_header_with_opts(&verifier_options(), header_buf)?;
    let columns = header
        .columns()
        .map(|columns| {
            columns
                .iter()
                .map(|column| {
                    let tag = column.type_();
                    let type_ = ColumnType::from_u8(tag).ok_or(Error::UnknownColumnType(tag))?;
                    Ok(Column {
                        name: column.name().to_string(),
                        type_,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    Ok(Header {
        name: header.name().map(str::to_string),
        geometry_type: GeometryType::from_u8(header.geometry_type()),
        has_z: header.has_z(),
        has_m: header.has_m(),
        columns,
        features_count: header.features_count(),
        index_node_size: header.index_node_size(),
        header_size,
    })
}
