use crate::header::GeometryType;
use flatbuffers::InvalidFlatbuffer;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    MissingMagicBytes,
    /// File shorter than magic bytes plus header size field
    FileTooSmall(usize),
    IllegalHeaderSize(usize),
    TruncatedHeader {
        declared: usize,
        available: usize,
    },
    InvalidFlatbuffer(InvalidFlatbuffer),
    UnknownColumnType(u8),
    IllegalIndexSize {
        features_count: u64,
        node_size: u16,
    },
    UnsupportedGeometry(GeometryType),
    /// Feature record extending past the end of the file
    TruncatedFeature {
        index: u64,
        declared: usize,
        available: usize,
    },
    PoolStopped,
    TaskFailed(String),
    IO(std::io::Error),
    Csv(csv::Error),
}
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors raised while validating the file layout, before any feature is processed.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::MissingMagicBytes
                | Error::FileTooSmall(_)
                | Error::IllegalHeaderSize(_)
                | Error::TruncatedHeader { .. }
                | Error::InvalidFlatbuffer(_)
                | Error::UnknownColumnType(_)
                | Error::IllegalIndexSize { .. }
                | Error::UnsupportedGeometry(_)
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingMagicBytes => "Missing magic bytes. Is this an fgb file?".fmt(f),
            Error::FileTooSmall(size) => {
                write!(f, "File too small to hold a FlatGeobuf header: {size} bytes")
            }
            Error::IllegalHeaderSize(size) => write!(f, "Illegal header size: {size}"),
            Error::TruncatedHeader {
                declared,
                available,
            } => write!(
                f,
                "Header declares {declared} bytes but only {available} are available"
            ),
            Error::InvalidFlatbuffer(invalid_flatbuffer) => invalid_flatbuffer.fmt(f),
            Error::UnknownColumnType(tag) => write!(f, "Unknown column type tag {tag}"),
            Error::IllegalIndexSize {
                features_count,
                node_size,
            } => write!(
                f,
                "Spatial index for {features_count} features with node size {node_size} does not fit the file"
            ),
            Error::UnsupportedGeometry(geometry_type) => write!(
                f,
                "Only Polygon and MultiPolygon datasets are supported, found {geometry_type}"
            ),
            Error::TruncatedFeature {
                index,
                declared,
                available,
            } => write!(
                f,
                "Feature {index} declares {declared} bytes but only {available} remain"
            ),
            Error::PoolStopped => "Task submitted to a stopped worker pool".fmt(f),
            Error::TaskFailed(reason) => write!(f, "Task failed: {reason}"),
            Error::IO(io) => io.fmt(f),
            Error::Csv(csv) => csv.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidFlatbuffer(invalid_flatbuffer) => Some(invalid_flatbuffer),
            Error::IO(io) => Some(io),
            Error::Csv(csv) => Some(csv),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<InvalidFlatbuffer> for Error {
    fn from(value: InvalidFlatbuffer) -> Self {
        Error::InvalidFlatbuffer(value)
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Csv(value)
    }
}

/// Per-field decode problems. These never abort a run; the affected field degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// Column index outside the header schema, decoding stops for this feature
    CorruptColumnIndex { index: u16, offset: usize },
    /// Value width runs past the end of the property blob
    TruncatedValue { column: usize, offset: usize },
}

impl Display for PropertyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyError::CorruptColumnIndex { index, offset } => write!(
                f,
                "Corrupt property column index {index} at blob offset {offset}"
            ),
            PropertyError::TruncatedValue { column, offset } => write!(
                f,
                "Value of column {column} at blob offset {offset} exceeds the property blob"
            ),
        }
    }
}

impl std::error::Error for PropertyError {}
