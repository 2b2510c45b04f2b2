#![no_main]

use fgb_bbox::*;
use libfuzzer_sys::fuzz_target;
use std::io;

fuzz_target!(|data: &[u8]| {
    let mut processor = FgbBBoxProcessor::new(ProcessorConfig::with_threads(2));
    let mut out = CsvOutput::new(io::sink(), CsvFormat::default());
    let _ = processor.process_buffer(RawBuffer::from_vec(data.to_vec()), &mut out);
});
