use clap::error::ErrorKind;
use clap::Parser;
use env_logger::Env;
use fgb_bbox::{Error, FgbBBoxProcessor, ProcessorConfig};
use log::{error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_RECOVERABLE: u8 = 2;
const EXIT_UNKNOWN: u8 = 3;

/// Writes the bounding box of every Polygon/MultiPolygon feature of a FlatGeobuf file to CSV
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input FlatGeobuf file
    input: PathBuf,

    /// Output CSV file
    output: PathBuf,

    /// Worker threads [default: logical CPUs - 1]
    #[arg(short, long)]
    threads: Option<usize>,
}

fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn run(args: &Args) -> u8 {
    let threads = args.threads.unwrap_or_else(default_threads);
    if threads == 0 {
        warn!("Thread count 0 is not allowed, using 1");
    }
    let config = ProcessorConfig::with_threads(threads);
    info!("Using {} worker threads", config.threads);

    let mut processor = FgbBBoxProcessor::new(config);
    match processor.process_file(&args.input, &args.output) {
        Ok(summary) if summary.is_complete() => 0,
        Ok(summary) => {
            error!(
                "Processing incomplete: {} of {} features written",
                summary.features_written, summary.features_declared
            );
            EXIT_FAILURE
        }
        Err(e) if e.is_format_error() => {
            error!("{e}");
            EXIT_FAILURE
        }
        Err(e @ (Error::IO(_) | Error::Csv(_))) => {
            error!("{e}");
            EXIT_RECOVERABLE
        }
        Err(e) => {
            error!("{e}");
            EXIT_UNKNOWN
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    match panic::catch_unwind(AssertUnwindSafe(|| run(&args))) {
        Ok(code) => ExitCode::from(code),
        Err(_) => {
            error!("Unknown fatal error");
            ExitCode::from(EXIT_UNKNOWN)
        }
    }
}
