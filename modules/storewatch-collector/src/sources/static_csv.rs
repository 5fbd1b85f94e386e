//! Positional commercial-district CSV export (no usable header names).

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use storewatch_common::{OriginTag, StoreRecord};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use super::{LoadReport, LoadedReference};

pub const STATIC_CSV_LABEL: &str = "public-data-csv";

/// Zero-based column positions, supplied out-of-band.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CsvSchema {
    #[builder(default = 0)]
    pub id: usize,
    #[builder(default = 1)]
    pub name: usize,
    #[builder(default = 24)]
    pub lot_address: usize,
    #[builder(default = 31)]
    pub road_address: usize,
    #[builder(default = 37)]
    pub longitude: usize,
    #[builder(default = 38)]
    pub latitude: usize,
    #[builder(default = true)]
    pub has_header: bool,
}

impl Default for CsvSchema {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CsvSchema {
    fn min_columns(&self) -> usize {
        [
            self.id,
            self.name,
            self.lot_address,
            self.road_address,
            self.longitude,
            self.latitude,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

pub fn load_csv_reference(path: &Path, schema: &CsvSchema) -> Result<LoadedReference> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (records, report) = parse_csv_reference(&bytes, schema)?;
    info!(path = %path.display(), %report, "CSV reference loaded");

    Ok(LoadedReference {
        label: STATIC_CSV_LABEL.to_string(),
        origin: OriginTag::StaticCsv,
        records,
        report,
    })
}

/// Parse raw bytes; UTF-8 first, EUC-KR (CP949) otherwise.
pub fn parse_csv_reference(bytes: &[u8], schema: &CsvSchema) -> Result<(Vec<StoreRecord>, LoadReport)> {
    let text = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(schema.has_header)
        .flexible(true)
        .from_reader(text.as_bytes());

    let min_columns = schema.min_columns();
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!(line, error = %e, "Unreadable CSV row");
                report.skipped += 1;
                continue;
            }
        };
        if row.len() < min_columns {
            report.skipped += 1;
            continue;
        }
        let field = |i: usize| row.get(i).map(str::trim).filter(|s| !is_missing(s));

        let Some(id) = field(schema.id) else {
            report.skipped += 1;
            continue;
        };
        let coordinate = match (field(schema.latitude), field(schema.longitude)) {
            (Some(lat), Some(lng)) => match (lat.parse::<f64>(), lng.parse::<f64>()) {
                (Ok(lat), Ok(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
                _ => {
                    report.skipped += 1;
                    continue;
                }
            },
            _ => None,
        };

        let mut record = StoreRecord::new(id, OriginTag::StaticCsv);
        if let Some(name) = field(schema.name) {
            record = record.with_name(name);
        }
        if let Some(address) = field(schema.road_address).or_else(|| field(schema.lot_address)) {
            record = record.with_address(address);
        }
        if let Some((lat, lng)) = coordinate {
            record = record.with_coordinate(lat, lng);
        }
        records.push(record);
    }

    report.loaded = records.len();
    Ok((records, report))
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            // Government exports are CP949, a superset of EUC-KR.
            let (decoded, _, _) = encoding_rs::EUC_KR.decode(bytes);
            decoded
        }
    }
}

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}
