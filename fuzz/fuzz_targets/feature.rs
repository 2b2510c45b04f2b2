#![no_main]

use fgb_bbox::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let buffer = RawBuffer::from_vec(data.to_vec());
    let record = FeatureRecord {
        index: 0,
        range: 0..data.len(),
    };
    let feature = match record.decode(&buffer) {
        Ok(feature) => feature,
        Err(_) => return,
    };
    if let Some(blob) = feature.properties() {
        let columns = [ColumnType::String, ColumnType::Int, ColumnType::Binary]
            .into_iter()
            .enumerate()
            .map(|(i, type_)| Column {
                name: format!("c{i}"),
                type_,
            })
            .collect::<Vec<_>>();
        let decoder = PropertyDecoder::new(&columns, 15);
        for target in 0..columns.len() {
            let _ = decoder.find_string(blob, target);
        }
    }
    for geometry_type in [GeometryType::Polygon, GeometryType::MultiPolygon] {
        let _ = calculate_bbox(feature.geometry(), 2, geometry_type);
    }
    if let Some(geometry) = feature.geometry_ref(&buffer) {
        let _ = geometry.resolve();
    }
});
