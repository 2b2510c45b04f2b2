//! Bounding boxes of FlatGeobuf polygon datasets.
//!
//! Reads a FlatGeobuf file holding Polygon or MultiPolygon features, computes the
//! axis-aligned bounding box of every feature on a pool of worker threads and writes
//! one CSV row per feature, in file order, together with its name, administrative
//! code and county code.
//!
//! ```no_run
//! use fgb_bbox::{FgbBBoxProcessor, ProcessorConfig};
//!
//! # fn main() -> fgb_bbox::Result<()> {
//! let mut processor = FgbBBoxProcessor::new(ProcessorConfig::with_threads(4));
//! let summary = processor.process_file("countries.fgb", "countries.csv")?;
//! println!("{} of {} features written", summary.features_written, summary.features_declared);
//! # Ok(())
//! # }
//! ```

use flatbuffers::VerifierOptions;

mod bbox;
mod buffer;
mod config;
mod csv_writer;
mod error;
#[allow(dead_code, non_snake_case)]
mod feature_generated;
mod feature_reader;
mod geometry_reader;
mod header;
#[allow(dead_code, non_snake_case)]
mod header_generated;
mod packed_r_tree;
mod pool;
mod processor;
mod properties_reader;

pub use bbox::BoundingBox;
pub use buffer::RawBuffer;
pub use config::{ColumnNames, CsvFormat, ProcessorConfig};
pub use csv_writer::{CountyCode, CsvOutput, TaskResult};
pub use error::{Error, PropertyError, Result};
pub use feature_generated::Geometry;
pub use feature_reader::{Feature, FeatureRecord, FeatureStream};
pub use geometry_reader::{calculate_bbox, GeometryRef};
pub use header::{read_header, Column, ColumnType, GeometryType, Header, ResolvedColumns};
pub use packed_r_tree::PackedRTree;
pub use pool::{TaskHandle, WorkerPool};
pub use processor::{FgbBBoxProcessor, RunState, RunSummary, TaskInput};
pub use properties_reader::{value_to_string, ByteCursor, PropertyDecoder};

pub const VERSION: u8 = 3;
pub const MAGIC_BYTES: [u8; 8] = [b'f', b'g', b'b', VERSION, b'f', b'g', b'b', 0];
pub(crate) const HEADER_MAX_BUFFER_SIZE: usize = 1048576 * 10;

/// Limits applied when verifying header and feature tables.
pub(crate) fn verifier_options() -> VerifierOptions {
    VerifierOptions {
        // every ring of a multipolygon is a table of its own
        max_tables: 10_000_000,
        ..Default::default()
    }
}

/// Whether `bytes` starts with the FlatGeobuf magic bytes of the supported version.
pub fn check_magic_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= MAGIC_BYTES.len() && bytes[..MAGIC_BYTES.len()] == MAGIC_BYTES
}
