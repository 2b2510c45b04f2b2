use criterion::{criterion_group, criterion_main, Criterion};
use fgb_bbox::*;
use std::io::sink;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{rect, uat_props, FgbFixture, Geom, MULTIPOLYGON};

fn dataset(features: u32) -> Vec<u8> {
    let mut fixture = FgbFixture::new(MULTIPOLYGON).index(16);
    for i in 0..features {
        let x = f64::from(i % 100) * 1000.0;
        let y = f64::from(i / 100) * 1000.0;
        fixture = fixture.feature(
            uat_props(&format!("UAT {i}"), &i.to_string(), "CJ"),
            Geom::Multi(vec![rect(x, y, x + 900.0, y + 900.0), rect(x + 950.0, y, x + 990.0, y + 40.0)]),
        );
    }
    fixture.build()
}

fn process(buffer: &RawBuffer, threads: usize) -> Result<RunSummary> {
    let mut processor = FgbBBoxProcessor::new(ProcessorConfig::with_threads(threads));
    let mut out = CsvOutput::new(sink(), CsvFormat::default());
    processor.process_buffer(buffer.clone(), &mut out)
}

fn criterion_benchmark(c: &mut Criterion) {
    let buffer = RawBuffer::from_vec(dataset(10_000));
    c.bench_function("read_header", |b| {
        b.iter(|| read_header(buffer.as_slice()))
    });
    c.bench_function("bbox_csv_1_thread", |b| b.iter(|| process(&buffer, 1)));
    c.bench_function("bbox_csv_4_threads", |b| b.iter(|| process(&buffer, 4)));
}

criterion_group!(name=benches; config=Criterion::default().sample_size(10); targets=criterion_benchmark);
criterion_main!(benches);
