use storewatch_common::StoreRecord;

/// Post-dedup predicate deciding whether a fetched record is kept.
/// Rejected records are counted as skipped, not as errors.
pub trait RecordFilter: Send + Sync {
    fn accept(&self, record: &StoreRecord) -> bool;

    fn describe(&self) -> String;
}

/// Keeps records whose raw address mentions the district.
#[derive(Debug, Clone)]
pub struct DistrictFilter {
    district: String,
}

impl DistrictFilter {
    pub fn new(district: impl Into<String>) -> Self {
        Self {
            district: district.into().trim().to_string(),
        }
    }
}

impl RecordFilter for DistrictFilter {
    fn accept(&self, record: &StoreRecord) -> bool {
        record
            .raw_address
            .as_deref()
            .is_some_and(|a| a.contains(&self.district))
    }

    fn describe(&self) -> String {
        format!("address contains {}", self.district)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RecordFilter for AcceptAll {
    fn accept(&self, _record: &StoreRecord) -> bool {
        true
    }

    fn describe(&self) -> String {
        "all".to_string()
    }
}
