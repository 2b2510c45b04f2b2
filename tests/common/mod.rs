//! In-memory FlatGeobuf files for tests and benchmarks.
#![allow(dead_code)]

use fgb_bbox::{PackedRTree, MAGIC_BYTES};
use flatbuffers::{FlatBufferBuilder, TableFinishedWIPOffset, WIPOffset};

pub const POLYGON: u8 = 3;
pub const MULTIPOLYGON: u8 = 6;
pub const POINT: u8 = 1;

pub const TYPE_INT: u8 = 5;
pub const TYPE_UINT: u8 = 6;
pub const TYPE_DOUBLE: u8 = 10;
pub const TYPE_STRING: u8 = 11;

/// Property blob of one feature.
#[derive(Default, Clone)]
pub struct Props(pub Vec<u8>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, column: u16, value: &str) -> Self {
        self.0.extend_from_slice(&column.to_le_bytes());
        self.0.extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.0.extend_from_slice(value.as_bytes());
        self
    }

    pub fn uint(mut self, column: u16, value: u32) -> Self {
        self.0.extend_from_slice(&column.to_le_bytes());
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn int(mut self, column: u16, value: i32) -> Self {
        self.0.extend_from_slice(&column.to_le_bytes());
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn double(mut self, column: u16, value: f64) -> Self {
        self.0.extend_from_slice(&column.to_le_bytes());
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

#[derive(Clone)]
pub enum Geom {
    None,
    /// Coordinates stored on the geometry itself
    Flat(Vec<f64>),
    /// Rings stored as parts
    Rings(Vec<Vec<f64>>),
    /// Polygons, each given by its flat coordinates
    Multi(Vec<Vec<f64>>),
}

#[derive(Clone)]
pub struct FeatureFixture {
    pub props: Props,
    pub geom: Geom,
    /// Type stored on the geometry, 0 for none
    pub geometry_type: u8,
}

pub struct FgbFixture {
    pub name: Option<String>,
    pub geometry_type: u8,
    pub has_z: bool,
    pub has_m: bool,
    pub columns: Vec<(String, u8)>,
    pub index_node_size: u16,
    /// Overrides the number of features written to the header
    pub features_count: Option<u64>,
    pub features: Vec<FeatureFixture>,
}

/// Closed rectangle ring.
pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<f64> {
    vec![
        min_x, min_y, max_x, min_y, max_x, max_y, min_x, max_y, min_x, min_y,
    ]
}

/// The default columns in schema order: name, natcode, countyMn.
pub fn uat_columns() -> Vec<(String, u8)> {
    vec![
        ("name".to_string(), TYPE_STRING),
        ("natcode".to_string(), TYPE_STRING),
        ("countyMn".to_string(), TYPE_STRING),
    ]
}

pub fn uat_props(name: &str, code: &str, county: &str) -> Props {
    Props::new().string(0, name).string(1, code).string(2, county)
}

impl FgbFixture {
    pub fn new(geometry_type: u8) -> Self {
        FgbFixture {
            name: Some("uat".to_string()),
            geometry_type,
            has_z: false,
            has_m: false,
            columns: uat_columns(),
            index_node_size: 0,
            features_count: None,
            features: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[(&str, u8)]) -> Self {
        self.columns = columns
            .iter()
            .map(|(name, type_)| (name.to_string(), *type_))
            .collect();
        self
    }

    pub fn index(mut self, node_size: u16) -> Self {
        self.index_node_size = node_size;
        self
    }

    pub fn feature(mut self, props: Props, geom: Geom) -> Self {
        self.features.push(FeatureFixture {
            props,
            geom,
            geometry_type: 0,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut file = MAGIC_BYTES.to_vec();
        file.extend_from_slice(&self.header_bytes());
        if self.index_node_size > 0 && !self.features.is_empty() {
            // sized for the features actually written, even if the header claims otherwise
            let size = PackedRTree::index_size(self.features.len(), self.index_node_size).unwrap();
            // the index is never read, any content will do
            file.extend(std::iter::repeat(0xee).take(size));
        }
        for feature in &self.features {
            file.extend_from_slice(&feature_bytes(feature));
        }
        file
    }

    /// Size prefixed `Header` table.
    fn header_bytes(&self) -> Vec<u8> {
        let mut fbb = FlatBufferBuilder::new();
        let columns = self
            .columns
            .iter()
            .map(|(name, type_)| {
                let name = fbb.create_string(name);
                let start = fbb.start_table();
                fbb.push_slot_always(4, name);
                fbb.push_slot(6, *type_, 0);
                fbb.end_table(start)
            })
            .collect::<Vec<_>>();
        let columns = fbb.create_vector(&columns);
        let name = self.name.as_deref().map(|name| fbb.create_string(name));
        let start = fbb.start_table();
        if let Some(name) = name {
            fbb.push_slot_always(4, name);
        }
        fbb.push_slot(8, self.geometry_type, 0);
        fbb.push_slot(10, self.has_z, false);
        fbb.push_slot(12, self.has_m, false);
        fbb.push_slot_always(18, columns);
        let count = self.features_count.unwrap_or(self.features.len() as u64);
        fbb.push_slot(20, count, 0);
        // 0 differs from the schema default of 16
        fbb.push_slot_always(22, self.index_node_size);
        let root = fbb.end_table(start);
        fbb.finish_size_prefixed(root, None);
        fbb.finished_data().to_vec()
    }
}

fn geometry<'a>(
    fbb: &mut FlatBufferBuilder<'a>,
    xy: Option<&[f64]>,
    parts: &[WIPOffset<TableFinishedWIPOffset>],
    geometry_type: u8,
) -> WIPOffset<TableFinishedWIPOffset> {
    let xy = xy.map(|xy| fbb.create_vector(xy));
    let parts = (!parts.is_empty()).then(|| fbb.create_vector(parts));
    let start = fbb.start_table();
    if let Some(xy) = xy {
        fbb.push_slot_always(6, xy);
    }
    fbb.push_slot(16, geometry_type, 0);
    if let Some(parts) = parts {
        fbb.push_slot_always(18, parts);
    }
    fbb.end_table(start)
}

/// Size prefixed `Feature` table.
pub fn feature_bytes(feature: &FeatureFixture) -> Vec<u8> {
    let mut fbb = FlatBufferBuilder::new();
    let geometry = match &feature.geom {
        Geom::None => None,
        Geom::Flat(xy) => Some(geometry(&mut fbb, Some(xy.as_slice()), &[], feature.geometry_type)),
        Geom::Rings(rings) => {
            let parts = rings
                .iter()
                .map(|ring| geometry(&mut fbb, Some(ring.as_slice()), &[], 0))
                .collect::<Vec<_>>();
            Some(geometry(&mut fbb, None, &parts, feature.geometry_type))
        }
        Geom::Multi(polygons) => {
            let parts = polygons
                .iter()
                .map(|polygon| geometry(&mut fbb, Some(polygon.as_slice()), &[], POLYGON))
                .collect::<Vec<_>>();
            Some(geometry(&mut fbb, None, &parts, feature.geometry_type))
        }
    };
    let properties = (!feature.props.0.is_empty()).then(|| fbb.create_vector(&feature.props.0));
    let start = fbb.start_table();
    if let Some(geometry) = geometry {
        fbb.push_slot_always(4, geometry);
    }
    if let Some(properties) = properties {
        fbb.push_slot_always(6, properties);
    }
    let root = fbb.end_table(start);
    fbb.finish_size_prefixed(root, None);
    fbb.finished_data().to_vec()
}
