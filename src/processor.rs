//! End-to-end run: file buffer, header, feature tasks on the worker pool, ordered CSV output.

use crate::bbox::BoundingBox;
use crate::buffer::RawBuffer;
use crate::config::ProcessorConfig;
use crate::csv_writer::{CountyCode, CsvOutput, TaskResult};
use crate::error::{Error, Result};
use crate::feature_reader::{FeatureRecord, FeatureStream};
use crate::geometry_reader::{calculate_bbox, GeometryRef};
use crate::header::{read_header, GeometryType, Header, ResolvedColumns};
use crate::pool::{TaskHandle, WorkerPool};
use crate::properties_reader::PropertyDecoder;
use fallible_streaming_iterator::FallibleStreamingIterator;
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::Path;

/// Progress of a run. Any validation or decode failure leads to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    BufferLoaded,
    HeaderParsed,
    ColumnsResolved,
    FeaturesSubmitting,
    ResultsCollecting,
    Done,
    Failed,
}

/// Feature counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Feature count announced by the header
    pub features_declared: u64,
    pub features_submitted: u64,
    pub features_written: u64,
    /// Records whose feature table failed verification
    pub features_skipped: u64,
    /// Reading stopped at a record extending past the end of the file
    pub truncated: bool,
}

impl RunSummary {
    /// True when every record was read, decoded and written.
    pub fn is_complete(&self) -> bool {
        !self.truncated
            && self.features_skipped == 0
            && self.features_written == self.features_submitted
    }
}

/// Everything a worker needs to produce the row of one feature.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub uat_name: String,
    pub uat_code: u32,
    pub county: CountyCode,
    pub geometry: Option<GeometryRef>,
    pub stride: u32,
    pub geometry_type: GeometryType,
}

impl TaskInput {
    /// Computes the bounding box. A missing geometry yields an invalid box.
    pub fn run(self) -> Result<TaskResult> {
        let bbox = match &self.geometry {
            Some(geometry) => calculate_bbox(geometry.resolve()?, self.stride, self.geometry_type),
            None => BoundingBox::new(),
        };
        Ok(TaskResult {
            uat_name: self.uat_name,
            uat_code: self.uat_code,
            county: self.county,
            bbox,
        })
    }
}

/// Writes the bounding box of every feature of a Polygon/MultiPolygon FlatGeobuf file as CSV.
pub struct FgbBBoxProcessor {
    config: ProcessorConfig,
    state: RunState,
}

impl FgbBBoxProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        FgbBBoxProcessor {
            config,
            state: RunState::Idle,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Processes the file at `input` and writes the CSV to `output`.
    ///
    /// The output file is only created once the header has been validated.
    pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input: P,
        output: Q,
    ) -> Result<RunSummary> {
        self.state = RunState::Idle;
        info!("Reading {}", input.as_ref().display());
        let buffer = self.track(RawBuffer::load(input))?;
        self.state = RunState::BufferLoaded;
        let header = self.parse_header(&buffer)?;
        let out = CsvOutput::create(output.as_ref(), self.config.csv.clone());
        let mut out = self.track(out)?;
        let summary = self.process_features(buffer, &header, &mut out)?;
        info!("Output written to: {}", output.as_ref().display());
        Ok(summary)
    }

    /// Processes a file already held in memory, writing rows to `out`.
    pub fn process_buffer<W: Write>(
        &mut self,
        buffer: RawBuffer,
        out: &mut CsvOutput<W>,
    ) -> Result<RunSummary> {
        self.state = RunState::BufferLoaded;
        let header = self.parse_header(&buffer)?;
        self.process_features(buffer, &header, out)
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = RunState::Failed;
        }
        result
    }

    fn parse_header(&mut self, buffer: &RawBuffer) -> Result<Header> {
        let header = self.track(read_header(buffer.as_slice()))?;
        info!(
            "Processing FGB file: {}",
            header.name.as_deref().unwrap_or_default()
        );
        info!("Header geometry type: {}", header.geometry_type);
        info!("Feature count (from header): {}", header.features_count);
        if header.has_z {
            info!("Data includes Z coordinates.");
        }
        if header.has_m {
            info!("Data includes M coordinates.");
        }
        debug!(
            "Header size {} bytes, index node size {}",
            header.header_size, header.index_node_size
        );
        self.state = RunState::HeaderParsed;
        Ok(header)
    }

    fn resolve_columns(&mut self, header: &Header) -> ResolvedColumns {
        let names = &self.config.columns;
        let columns = header.resolve_columns(names);
        let report = [
            (&names.name, columns.name, "Fallback names will be used."),
            (&names.code, columns.code, "UAT codes will be 0."),
            (&names.county, columns.county, "County codes will be missing."),
        ];
        for (name, index, consequence) in report {
            match index {
                Some(index) => info!("Found property '{name}' at index {index}."),
                None => warn!("Could not find the expected property '{name}'. {consequence}"),
            }
        }
        self.state = RunState::ColumnsResolved;
        columns
    }

    fn process_features<W: Write>(
        &mut self,
        buffer: RawBuffer,
        header: &Header,
        out: &mut CsvOutput<W>,
    ) -> Result<RunSummary> {
        let columns = self.resolve_columns(header);
        let result = self.submit_and_collect(buffer, header, &columns, out);
        self.track(result)
    }

    fn submit_and_collect<W: Write>(
        &mut self,
        buffer: RawBuffer,
        header: &Header,
        columns: &ResolvedColumns,
        out: &mut CsvOutput<W>,
    ) -> Result<RunSummary> {
        out.write_header()?;
        let pool = WorkerPool::new(self.config.threads)?;
        self.state = RunState::FeaturesSubmitting;

        let mut summary = RunSummary {
            features_declared: header.features_count,
            ..Default::default()
        };
        let handles = self.submit_tasks(&pool, &buffer, header, columns, &mut summary)?;
        info!(
            "All {} features submitted. Collecting results...",
            summary.features_submitted
        );

        self.state = RunState::ResultsCollecting;
        summary.features_written = self.collect_results(handles, summary.features_submitted, out);
        out.flush()?;
        drop(pool);

        info!(
            "Successfully processed and wrote {} of {} features.",
            summary.features_written, summary.features_submitted
        );
        if summary.features_skipped > 0 {
            warn!(
                "{} features could not be decoded and have no row",
                summary.features_skipped
            );
        }
        if summary.features_submitted != summary.features_declared {
            warn!(
                "Header declares {} features but {} were submitted",
                summary.features_declared, summary.features_submitted
            );
        }
        self.state = RunState::Done;
        Ok(summary)
    }

    fn submit_tasks(
        &self,
        pool: &WorkerPool,
        buffer: &RawBuffer,
        header: &Header,
        columns: &ResolvedColumns,
        summary: &mut RunSummary,
    ) -> Result<Vec<TaskHandle<Result<TaskResult>>>> {
        let decoder = PropertyDecoder::new(&header.columns, self.config.property_float_precision);
        let interval = self.config.progress_interval.max(1);
        let mut stream = FeatureStream::new(buffer.clone(), header)?;
        let mut handles = Vec::new();
        loop {
            let record = match stream.next() {
                Ok(Some(record)) => record.clone(),
                Ok(None) => break,
                Err(e @ Error::TruncatedFeature { .. }) => {
                    warn!("{e}. Stopping after {} features.", summary.features_submitted);
                    summary.truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            let submission_no = summary.features_submitted + 1;
            let task = match self.prepare_task(buffer, &record, &decoder, header, columns, submission_no) {
                Ok(task) => task,
                Err(e) => {
                    warn!("Could not parse feature {}: {e}. Skipping.", record.index + 1);
                    summary.features_skipped += 1;
                    continue;
                }
            };
            handles.push(pool.submit(move || task.run())?);
            summary.features_submitted = submission_no;
            if submission_no % interval == 0 {
                info!("Submitted {submission_no} / {} features...", header.features_count);
            }
        }
        Ok(handles)
    }

    fn prepare_task(
        &self,
        buffer: &RawBuffer,
        record: &FeatureRecord,
        decoder: &PropertyDecoder,
        header: &Header,
        columns: &ResolvedColumns,
        submission_no: u64,
    ) -> Result<TaskInput> {
        let feature = record.decode(buffer)?;
        let blob = feature.properties().unwrap_or_default();
        let property = |column: Option<usize>| -> Option<String> {
            match decoder.find_string(blob, column?) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Feature {}: {e}", record.index + 1);
                    None
                }
            }
        };

        let uat_name = property(columns.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{}{submission_no}", self.config.fallback_name_prefix));
        let uat_code = match property(columns.code) {
            Some(raw) => parse_uat_code(&raw).unwrap_or_else(|| {
                if !raw.trim().is_empty() {
                    warn!("UAT code '{raw}' for UAT name '{uat_name}' could not be parsed as u32");
                }
                0
            }),
            None => 0,
        };
        let county = property(columns.county)
            .map(|county| CountyCode::new(&county))
            .unwrap_or_default();

        Ok(TaskInput {
            uat_name,
            uat_code,
            county,
            geometry: feature.geometry_ref(buffer),
            stride: header.coordinate_stride(),
            geometry_type: feature.geometry_type(header.geometry_type),
        })
    }

    /// Waits for every handle in submission order and writes the rows. Returns the rows written.
    fn collect_results<W: Write>(
        &self,
        handles: Vec<TaskHandle<Result<TaskResult>>>,
        submitted: u64,
        out: &mut CsvOutput<W>,
    ) -> u64 {
        let interval = self.config.progress_interval.max(1);
        let mut written = 0;
        for handle in handles {
            let row = handle.wait().and_then(|result| result);
            match row.and_then(|result| out.write_row(&result)) {
                Ok(()) => {
                    written += 1;
                    if written % interval == 0 || written == submitted {
                        info!("Written {written} / {submitted} results to CSV...");
                    }
                }
                Err(e) => error!("Error processing or writing a feature result: {e}"),
            }
        }
        written
    }
}

/// Parses an administrative code: surrounding whitespace is ignored, the rest must be ASCII digits.
fn parse_uat_code(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
