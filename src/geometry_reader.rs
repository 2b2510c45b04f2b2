//! Bounding boxes of feature geometries.

use crate::bbox::BoundingBox;
use crate::buffer::RawBuffer;
use crate::error::Result;
use crate::feature_generated::{size_prefixed_root_as_feature_unchecked, Geometry};
use crate::feature_reader::FeatureRecord;
use crate::header::GeometryType;

/// Geometry of a verified feature record inside a shared file buffer.
///
/// The reference is resolved by the worker computing the bounding box, so
/// feature records are neither copied out of the buffer nor verified twice.
#[derive(Clone, Debug)]
pub struct GeometryRef {
    buffer: RawBuffer,
    record: FeatureRecord,
}

impl GeometryRef {
    /// `record` must have been decoded from `buffer` with [`FeatureRecord::decode`].
    pub(crate) fn new(buffer: RawBuffer, record: FeatureRecord) -> Self {
        GeometryRef { buffer, record }
    }

    pub fn resolve(&self) -> Result<Option<Geometry<'_>>> {
        let bytes = self.record.bytes(&self.buffer)?;
        // Safety: only created for records that passed verification, and the
        // shared buffer is immutable.
        let feature = unsafe { size_prefixed_root_as_feature_unchecked(bytes) };
        Ok(feature.geometry())
    }
}

/// Bounding box of `geometry` whose coordinates have `stride` components per point.
///
/// Polygon rings are taken from the geometry parts, or from the geometry itself
/// when it has none. MultiPolygon parts are treated as polygons. Other geometry
/// types use their own coordinates only.
pub fn calculate_bbox(
    geometry: Option<Geometry<'_>>,
    stride: u32,
    geometry_type: GeometryType,
) -> BoundingBox {
    let mut bbox = BoundingBox::new();
    let Some(geometry) = geometry else {
        return bbox;
    };
    let stride = stride.max(2) as usize;
    match geometry_type {
        GeometryType::Polygon => read_polygon(&geometry, stride, &mut bbox),
        GeometryType::MultiPolygon => {
            if let Some(parts) = geometry.parts() {
                for part in parts.iter() {
                    let mut polygon = BoundingBox::new();
                    read_polygon(&part, stride, &mut polygon);
                    bbox.expand(&polygon);
                }
            }
        }
        _ => read_coords(&geometry, stride, &mut bbox),
    }
    bbox
}

fn read_polygon(geometry: &Geometry<'_>, stride: usize, bbox: &mut BoundingBox) {
    match geometry.parts() {
        Some(rings) if !rings.is_empty() => {
            for ring in rings.iter() {
                read_coords(&ring, stride, bbox);
            }
        }
        _ => read_coords(geometry, stride, bbox),
    }
}

fn read_coords(geometry: &Geometry<'_>, stride: usize, bbox: &mut BoundingBox) {
    let Some(xy) = geometry.xy() else {
        return;
    };
    let n = xy.len();
    let mut i = 0;
    // a trailing incomplete point is ignored
    while i + 1 < n {
        bbox.update(xy.get(i), xy.get(i + 1));
        i += stride;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatbuffers::{FlatBufferBuilder, TableFinishedWIPOffset, WIPOffset};

    fn geometry<'fbb>(
        fbb: &mut FlatBufferBuilder<'fbb>,
        xy: &[f64],
        parts: &[WIPOffset<TableFinishedWIPOffset>],
        type_: u8,
    ) -> WIPOffset<TableFinishedWIPOffset> {
        let xy = (!xy.is_empty()).then(|| fbb.create_vector(xy));
        let parts = (!parts.is_empty()).then(|| fbb.create_vector(parts));
        let start = fbb.start_table();
        if let Some(xy) = xy {
            fbb.push_slot_always(Geometry::VT_XY, xy);
        }
        if let Some(parts) = parts {
            fbb.push_slot_always(Geometry::VT_PARTS, parts);
        }
        fbb.push_slot(Geometry::VT_TYPE_, type_, 0);
        fbb.end_table(start)
    }

    fn bbox_of(fbb: FlatBufferBuilder<'_>, stride: u32, type_: GeometryType) -> BoundingBox {
        let geometry = flatbuffers::root::<Geometry>(fbb.finished_data()).unwrap();
        calculate_bbox(Some(geometry), stride, type_)
    }

    fn extent(bbox: &BoundingBox) -> (f64, f64, f64, f64) {
        (bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y)
    }

    #[test]
    fn polygon_without_parts_uses_own_coordinates() {
        let mut fbb = FlatBufferBuilder::new();
        let root = geometry(&mut fbb, &[0., 0., 4., 0., 4., 3., 0., 3., 0., 0.], &[], 0);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 2, GeometryType::Polygon);
        assert!(bbox.is_valid);
        assert_eq!(extent(&bbox), (0., 0., 4., 3.));
    }

    #[test]
    fn polygon_rings_from_parts() {
        let mut fbb = FlatBufferBuilder::new();
        let outer = geometry(&mut fbb, &[0., 0., 10., 0., 10., 10., 0., 0.], &[], 0);
        let hole = geometry(&mut fbb, &[-5., 2., 3., 2., 3., 3., -5., 2.], &[], 0);
        let root = geometry(&mut fbb, &[], &[outer, hole], GeometryType::Polygon as u8);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 2, GeometryType::Polygon);
        assert_eq!(extent(&bbox), (-5., 0., 10., 10.));
    }

    #[test]
    fn multipolygon_is_union_of_parts() {
        let mut fbb = FlatBufferBuilder::new();
        let first = geometry(&mut fbb, &[0., 0., 1., 0., 1., 1., 0., 0.], &[], 3);
        let empty = geometry(&mut fbb, &[], &[], 3);
        let second = geometry(&mut fbb, &[10., 20., 12., 20., 12., 25., 10., 20.], &[], 3);
        let root = geometry(&mut fbb, &[], &[first, empty, second], 6);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 2, GeometryType::MultiPolygon);
        assert_eq!(extent(&bbox), (0., 0., 12., 25.));
    }

    #[test]
    fn multipolygon_of_negative_parts_is_not_stretched_to_origin() {
        let mut fbb = FlatBufferBuilder::new();
        let first = geometry(&mut fbb, &[-9., -9., -8., -7.], &[], 3);
        let second = geometry(&mut fbb, &[-3., -4., -2., -2.], &[], 3);
        let root = geometry(&mut fbb, &[], &[first, second], 6);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 2, GeometryType::MultiPolygon);
        assert_eq!(extent(&bbox), (-9., -9., -2., -2.));
    }

    #[test]
    fn stride_skips_extra_components() {
        let mut fbb = FlatBufferBuilder::new();
        // x, y, z triples; z values must not contribute
        let root = geometry(&mut fbb, &[1., 2., 500., 3., 4., -500.], &[], 0);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 3, GeometryType::Polygon);
        assert_eq!(extent(&bbox), (1., 2., 3., 4.));
    }

    #[test]
    fn odd_length_coordinates_stop_early() {
        let mut fbb = FlatBufferBuilder::new();
        let root = geometry(&mut fbb, &[1., 1., 2., 2., 99.], &[], 0);
        fbb.finish(root, None);
        let bbox = bbox_of(fbb, 2, GeometryType::Polygon);
        assert_eq!(extent(&bbox), (1., 1., 2., 2.));
    }

    #[test]
    fn empty_and_missing_geometries_are_invalid() {
        assert!(!calculate_bbox(None, 2, GeometryType::Polygon).is_valid);

        let mut fbb = FlatBufferBuilder::new();
        let root = geometry(&mut fbb, &[], &[], 0);
        fbb.finish(root, None);
        assert!(!bbox_of(fbb, 2, GeometryType::MultiPolygon).is_valid);
    }

    #[test]
    fn resolves_reference_into_shared_buffer() {
        let mut fbb = FlatBufferBuilder::new();
        let geometry = geometry(&mut fbb, &[7., 8.], &[], 3);
        let start = fbb.start_table();
        fbb.push_slot_always(4, geometry);
        let root = fbb.end_table(start);
        fbb.finish_size_prefixed(root, None);
        // records start at arbitrary file offsets
        let mut data = vec![0xaa; 5];
        data.extend_from_slice(fbb.finished_data());
        let len = data.len();
        let buffer = RawBuffer::from_vec(data);
        let record = FeatureRecord {
            index: 0,
            range: 5..len,
        };

        let feature = record.decode(&buffer).unwrap();
        let reference = feature.geometry_ref(&buffer).unwrap();
        let geometry = reference.resolve().unwrap().unwrap();
        assert_eq!(geometry.type_(), GeometryType::Polygon as u8);
        let bbox = calculate_bbox(Some(geometry), 2, GeometryType::Polygon);
        assert_eq!(extent(&bbox), (7., 8., 7., 8.));
    }
}
