//! Run configuration injected into the decoder, the CSV writer and the pipeline.

/// Names of the property columns carrying the administrative metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub name: String,
    pub code: String,
    pub county: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            name: "name".to_string(),
            code: "natcode".to_string(),
            county: "countyMn".to_string(),
        }
    }
}

/// Number formatting and separators of the CSV output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    /// Decimal places of bounding box coordinates
    pub coordinate_precision: usize,
    /// Decimal places of the area in square kilometers
    pub area_precision: usize,
}

impl Default for CsvFormat {
    fn default() -> Self {
        CsvFormat {
            delimiter: b',',
            coordinate_precision: 3,
            area_precision: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Worker threads computing bounding boxes, at least one
    pub threads: usize,
    pub columns: ColumnNames,
    pub csv: CsvFormat,
    /// Decimal places used when a float property is rendered as text
    pub property_float_precision: usize,
    /// Prefix of the name substituted for features without a name
    pub fallback_name_prefix: String,
    /// Log progress every this many features
    pub progress_interval: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            threads: 1,
            columns: ColumnNames::default(),
            csv: CsvFormat::default(),
            property_float_precision: 15,
            fallback_name_prefix: "Name_Unavailable_Index_".to_string(),
            progress_interval: 1000,
        }
    }
}

impl ProcessorConfig {
    pub fn with_threads(threads: usize) -> Self {
        ProcessorConfig {
            threads: threads.max(1),
            ..Default::default()
        }
    }
}
