//! Framing of the size-prefixed feature records following header and index.

use crate::buffer::RawBuffer;
use crate::error::{Error, Result};
use crate::feature_generated::{self as fbs, size_prefixed_root_as_feature_with_opts, Geometry};
use crate::geometry_reader::GeometryRef;
use crate::header::{GeometryType, Header};
use crate::verifier_options;
use byteorder::{ByteOrder, LittleEndian};
use fallible_streaming_iterator::FallibleStreamingIterator;
use std::mem::size_of;
use std::ops::Range;

/// Position of one feature record in the file buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRecord {
    /// 0-based record number
    pub index: u64,
    /// Record bytes, including the size prefix
    pub range: Range<usize>,
}

impl FeatureRecord {
    /// Verifies and decodes the `Feature` table of this record.
    pub fn decode<'a>(&self, buffer: &'a RawBuffer) -> Result<Feature<'a>> {
        let bytes = self.bytes(buffer)?;
        Ok(Feature {
            table: size_prefixed_root_as_feature_with_opts(&verifier_options(), bytes)?,
            record: self.clone(),
        })
    }

    pub(crate) fn bytes<'a>(&self, buffer: &'a RawBuffer) -> Result<&'a [u8]> {
        buffer
            .slice(self.range.clone())
            .ok_or(Error::TruncatedFeature {
                index: self.index,
                declared: self.range.len(),
                available: buffer.len().saturating_sub(self.range.start),
            })
    }
}

/// A verified feature table borrowing the file buffer.
#[derive(Clone)]
pub struct Feature<'a> {
    table: fbs::Feature<'a>,
    record: FeatureRecord,
}

impl<'a> Feature<'a> {
    /// Raw property blob, `None` for features without properties.
    pub fn properties(&self) -> Option<&'a [u8]> {
        self.table.properties().map(|properties| properties.bytes())
    }

    pub fn geometry(&self) -> Option<Geometry<'a>> {
        self.table.geometry()
    }

    /// Reference to the geometry that can be resolved on another thread.
    pub fn geometry_ref(&self, buffer: &RawBuffer) -> Option<GeometryRef> {
        self.geometry()
            .map(|_| GeometryRef::new(buffer.clone(), self.record.clone()))
    }

    /// The geometry's own type, or `dataset_type` when the geometry does not store one.
    pub fn geometry_type(&self, dataset_type: GeometryType) -> GeometryType {
        match self.geometry().map(|geometry| GeometryType::from_u8(geometry.type_())) {
            Some(GeometryType::Unknown) | None => dataset_type,
            Some(own) => own,
        }
    }
}

/// Streams the records of a file, `features_count` at most.
///
/// A record whose declared size exceeds the remaining bytes fails with
/// [`Error::TruncatedFeature`] and ends the stream.
///
/// ```no_run
/// use fallible_streaming_iterator::FallibleStreamingIterator;
/// use fgb_bbox::{read_header, FeatureStream, RawBuffer};
///
/// # fn main() -> fgb_bbox::Result<()> {
/// let buffer = RawBuffer::load("countries.fgb")?;
/// let header = read_header(buffer.as_slice())?;
/// let mut stream = FeatureStream::new(buffer, &header)?;
/// while let Some(record) = stream.next()? {
///     println!("feature {} at {:?}", record.index, record.range);
/// }
/// # Ok(())
/// # }
/// ```
pub struct FeatureStream {
    buffer: RawBuffer,
    cursor: usize,
    features_count: u64,
    feat_no: u64,
    current: Option<FeatureRecord>,
    finished: bool,
}

impl FeatureStream {
    pub fn new(buffer: RawBuffer, header: &Header) -> Result<Self> {
        let cursor = header.features_offset()?;
        Ok(FeatureStream {
            buffer,
            cursor,
            features_count: header.features_count,
            feat_no: 0,
            current: None,
            finished: false,
        })
    }

    fn truncated(&mut self, declared: usize) -> Error {
        self.finished = true;
        self.current = None;
        Error::TruncatedFeature {
            index: self.feat_no,
            declared,
            available: self.buffer.len().saturating_sub(self.cursor),
        }
    }
}

impl FallibleStreamingIterator for FeatureStream {
    type Error = Error;
    type Item = FeatureRecord;

    fn advance(&mut self) -> Result<()> {
        if self.finished || self.feat_no >= self.features_count {
            self.finished = true;
            self.current = None;
            return Ok(());
        }
        let prefix_end = self.cursor + size_of::<u32>();
        let Some(prefix) = self.buffer.slice(self.cursor..prefix_end) else {
            return Err(self.truncated(size_of::<u32>()));
        };
        let feature_size = LittleEndian::read_u32(prefix) as usize;
        let end = match prefix_end.checked_add(feature_size) {
            Some(end) if end <= self.buffer.len() => end,
            _ => return Err(self.truncated(size_of::<u32>() + feature_size)),
        };
        self.current = Some(FeatureRecord {
            index: self.feat_no,
            range: self.cursor..end,
        });
        self.cursor = end;
        self.feat_no += 1;
        Ok(())
    }

    fn get(&self) -> Option<&FeatureRecord> {
        self.current.as_ref()
    }
}
