//! CSV rows of per-feature bounding boxes.

use crate::bbox::BoundingBox;
use crate::config::CsvFormat;
use crate::error::{Error, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 8] = [
    "uat_name",
    "uat_code",
    "county_code_mn",
    "min_x",
    "min_y",
    "max_x",
    "max_y",
    "bbox_area_km2",
];

/// Two-character county code, space padded. All spaces means no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountyCode([char; 2]);

impl CountyCode {
    pub const EMPTY: CountyCode = CountyCode([' ', ' ']);

    /// Takes the first two characters of `value`.
    pub fn new(value: &str) -> Self {
        let mut chars = value.chars();
        CountyCode([chars.next().unwrap_or(' '), chars.next().unwrap_or(' ')])
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl Default for CountyCode {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Display for CountyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}{}", self.0[0], self.0[1])
    }
}

/// Metadata and bounding box of one feature, as written to one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub uat_name: String,
    pub uat_code: u32,
    pub county: CountyCode,
    pub bbox: BoundingBox,
}

/// CSV sink with `\n` line endings, quoting fields only where needed.
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
    format: CsvFormat,
    rows: u64,
}

impl CsvOutput<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, format: CsvFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> CsvOutput<W> {
    pub fn new(out: W, format: CsvFormat) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(format.delimiter)
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Necessary)
            .from_writer(out);
        CsvOutput {
            writer,
            format,
            rows: 0,
        }
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(CSV_HEADER)?;
        Ok(())
    }

    /// Writes one data row. An invalid bounding box leaves coordinates and area empty.
    pub fn write_row(&mut self, result: &TaskResult) -> Result<()> {
        let bbox = &result.bbox;
        let (coords, area) = if bbox.is_valid {
            let precision = self.format.coordinate_precision;
            (
                [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
                    .map(|value| format!("{value:.precision$}")),
                format!("{:.*}", self.format.area_precision, bbox.area_km2()),
            )
        } else {
            (Default::default(), String::new())
        };
        let [min_x, min_y, max_x, max_y] = coords;
        let code = result.uat_code.to_string();
        let county = result.county.to_string();
        self.writer.write_record([
            result.uat_name.as_str(),
            code.as_str(),
            county.as_str(),
            min_x.as_str(),
            min_y.as_str(),
            max_x.as_str(),
            max_y.as_str(),
            area.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::IO(e.into_error()))
    }
}
