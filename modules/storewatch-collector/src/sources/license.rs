use async_trait::async_trait;
use seoul_openapi_client::{LicenseRow, SeoulOpenApiClient, ServiceRows};
use storewatch_common::{District, OriginTag, StoreRecord};
use tracing::{info, warn};

use super::projection::CoordTransform;
use super::{LoadReport, LoadedReference};
use crate::error::Result;

/// Seam over the open-data API so loaders can run against fixtures.
#[async_trait]
pub trait LicenseSource: Send + Sync {
    async fn fetch_all(&self, service: &str) -> seoul_openapi_client::Result<ServiceRows>;
}

#[async_trait]
impl LicenseSource for SeoulOpenApiClient {
    async fn fetch_all(&self, service: &str) -> seoul_openapi_client::Result<ServiceRows> {
        SeoulOpenApiClient::fetch_all(self, service).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    /// Rest-stop restaurant licenses for 편의점 businesses still trading.
    Restaurant,
    /// Tobacco retail licenses still trading.
    Tobacco,
}

impl LicenseKind {
    pub fn origin_tag(&self) -> OriginTag {
        match self {
            LicenseKind::Restaurant => OriginTag::GovLicenseA,
            LicenseKind::Tobacco => OriginTag::GovLicenseB,
        }
    }

    pub fn service(&self, district: &District) -> String {
        match self {
            LicenseKind::Restaurant => district.restaurant_service(),
            LicenseKind::Tobacco => district.tobacco_service(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LicenseKind::Restaurant => "restaurant-license",
            LicenseKind::Tobacco => "tobacco-license",
        }
    }

    fn in_scope(&self, row: &LicenseRow) -> bool {
        match self {
            LicenseKind::Restaurant => {
                row.uptaenm.as_deref().map(str::trim) == Some("편의점") && row.is_operating()
            }
            LicenseKind::Tobacco => row.is_operating(),
        }
    }
}

/// Turn raw rows into records. Rows without a management number are
/// skipped; rows outside the kind's scope are filtered; an unconvertible
/// coordinate only leaves the record without one.
pub fn rows_to_records(
    rows: Vec<LicenseRow>,
    kind: LicenseKind,
    transform: &dyn CoordTransform,
) -> (Vec<StoreRecord>, LoadReport) {
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for row in rows {
        if !kind.in_scope(&row) {
            report.filtered += 1;
            continue;
        }
        let Some(id) = row.mgtno.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            report.skipped += 1;
            continue;
        };

        let mut record = StoreRecord::new(id, kind.origin_tag());
        if let Some(name) = row.bplcnm.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            record = record.with_name(name);
        }
        if let Some(address) = row.best_address() {
            record = record.with_address(address);
        }
        if let Some(c) = row
            .projected_xy()
            .and_then(|(x, y)| transform.to_wgs84(x, y))
        {
            record = record.with_coordinate(c.lat, c.lng);
        }
        records.push(record);
    }

    report.loaded = records.len();
    (records, report)
}

/// Fetch and convert one license dataset for a district.
pub async fn load_license_reference(
    source: &dyn LicenseSource,
    district: &District,
    kind: LicenseKind,
    transform: &dyn CoordTransform,
) -> Result<LoadedReference> {
    let service = kind.service(district);
    let fetched = source.fetch_all(&service).await?;
    let (records, mut report) = rows_to_records(fetched.rows, kind, transform);
    report.failed_ranges = fetched.failed_ranges;
    if report.failed_ranges > 0 {
        warn!(
            dataset = kind.label(),
            failed_ranges = report.failed_ranges,
            "License reference is partial, stores missing from it may be reported closed"
        );
    }
    info!(dataset = kind.label(), service = %service, %report, "License reference loaded");

    Ok(LoadedReference {
        label: kind.label().to_string(),
        origin: kind.origin_tag(),
        records,
        report,
    })
}
