use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// --- Geography ---

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and not the `(0, 0)` placeholder several sources emit for "unknown".
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && !(self.lat == 0.0 && self.lng == 0.0)
    }
}

/// Haversine great-circle distance between two points in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1_r = a.lat.to_radians();
    let lat2_r = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

// --- Records ---

/// Which upstream a record was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginTag {
    /// Commercial map search API (the subject dataset).
    MapApi,
    /// Government restaurant-license open data.
    GovLicenseA,
    /// Government tobacco-retail-license open data.
    GovLicenseB,
    /// Static commercial-district CSV.
    StaticCsv,
    /// The anchor retailer's own store locator.
    RetailerApi,
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OriginTag::MapApi => "map_api",
            OriginTag::GovLicenseA => "gov_license_a",
            OriginTag::GovLicenseB => "gov_license_b",
            OriginTag::StaticCsv => "static_csv",
            OriginTag::RetailerApi => "retailer_api",
        };
        write!(f, "{s}")
    }
}

/// One observed point of interest. Immutable once built; a re-collection
/// produces a new record that replaces the old one by `source_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Provider identifier, unique within its source.
    pub source_id: String,
    pub name: Option<String>,
    pub raw_address: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub origin_tag: OriginTag,
    /// Anchor store this record was discovered around, for map-API records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl StoreRecord {
    pub fn new(source_id: impl Into<String>, origin_tag: OriginTag) -> Self {
        Self {
            source_id: source_id.into(),
            name: None,
            raw_address: None,
            coordinate: None,
            origin_tag,
            anchor: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.raw_address = Some(address.into());
        self
    }

    pub fn with_coordinate(mut self, lat: f64, lng: f64) -> Self {
        self.coordinate = Some(Coordinate::new(lat, lng));
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// Keep the first record seen for each `source_id`, preserving input order.
pub fn dedupe_by_source_id(records: impl IntoIterator<Item = StoreRecord>) -> Vec<StoreRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.source_id.clone()))
        .collect()
}

// --- Verdicts ---

/// Why a subject record was judged to still be operating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchReason {
    Name,
    Address,
    Coord,
    Transitive,
}

impl MatchReason {
    /// Label used in the outbound row.
    pub fn label(&self) -> &'static str {
        match self {
            MatchReason::Name => "이름",
            MatchReason::Address => "주소",
            MatchReason::Coord => "좌표",
            MatchReason::Transitive => "2차검증",
        }
    }
}

/// Set of reasons; non-empty iff the record matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvidence(BTreeSet<MatchReason>);

impl MatchEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reason: MatchReason) {
        self.0.insert(reason);
    }

    pub fn contains(&self, reason: MatchReason) -> bool {
        self.0.contains(&reason)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MatchReason> + '_ {
        self.0.iter().copied()
    }

    /// `이름, 주소` style label, `없음` when empty.
    pub fn label(&self) -> String {
        if self.0.is_empty() {
            return "없음".to_string();
        }
        self.0.iter().map(|r| r.label()).collect::<Vec<_>>().join(", ")
    }
}

impl FromIterator<MatchReason> for MatchEvidence {
    fn from_iter<I: IntoIterator<Item = MatchReason>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureStatus {
    Active,
    Closed,
}

impl ClosureStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ClosureStatus::Active => "정상",
            ClosureStatus::Closed => "폐업",
        }
    }
}

/// Per-subject classification outcome. Status is derived from the evidence,
/// so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureVerdict {
    pub subject_id: String,
    pub status: ClosureStatus,
    pub evidence: MatchEvidence,
}

impl ClosureVerdict {
    pub fn from_evidence(subject_id: impl Into<String>, evidence: MatchEvidence) -> Self {
        let status = if evidence.is_empty() {
            ClosureStatus::Closed
        } else {
            ClosureStatus::Active
        };
        Self {
            subject_id: subject_id.into(),
            status,
            evidence,
        }
    }
}

/// A verdict together with the subject fields downstream consumers display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureResult {
    pub verdict: ClosureVerdict,
    pub name: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    pub district: String,
}

impl ClosureResult {
    pub fn new(record: &StoreRecord, verdict: ClosureVerdict, district: &str) -> Self {
        Self {
            verdict,
            name: record.name.clone().unwrap_or_default(),
            address: record.raw_address.clone().unwrap_or_default(),
            coordinate: record.coordinate,
            district: district.to_string(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.verdict.subject_id
    }

    pub fn to_row(&self) -> VerdictRow {
        VerdictRow {
            id: self.verdict.subject_id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            latitude: self.coordinate.map(|c| c.lat),
            longitude: self.coordinate.map(|c| c.lng),
            status: self.verdict.status.label().to_string(),
            match_reason: self.verdict.evidence.label(),
        }
    }
}

/// Outbound row consumed by the map UI and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: String,
    pub match_reason: String,
}

// --- Match policy ---

/// How many reference datasets must contain a key for it to count as direct evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectMatchMode {
    /// Present in any reference dataset.
    #[default]
    Any,
    /// Present in every reference dataset.
    All,
}

impl FromStr for DirectMatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(format!("unknown match mode '{other}' (expected any|all)")),
        }
    }
}

/// What may corroborate a two-hop (shared address) match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryMatch {
    Off,
    /// Only a shared name key.
    NameOnly,
    /// A shared name key or a shared rounded coordinate.
    #[default]
    NameOrCoord,
}

impl FromStr for SecondaryMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "name_only" => Ok(Self::NameOnly),
            "name_or_coord" => Ok(Self::NameOrCoord),
            other => Err(format!(
                "unknown secondary match '{other}' (expected off|name_only|name_or_coord)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchPolicy {
    pub direct: DirectMatchMode,
    pub secondary: SecondaryMatch,
}

// --- Brands ---

/// Convenience-store chain inferred from a store name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Brand {
    Cu,
    Gs25,
    SevenEleven,
    Emart24,
    Ministop,
    Other,
}

impl Brand {
    pub const ALL: [Brand; 6] = [
        Brand::Cu,
        Brand::Gs25,
        Brand::SevenEleven,
        Brand::Emart24,
        Brand::Ministop,
        Brand::Other,
    ];

    pub fn of(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("gs25") {
            Brand::Gs25
        } else if lower.contains("cu") {
            Brand::Cu
        } else if name.contains("세븐일레븐") || lower.contains("7-eleven") || name.contains("711") {
            Brand::SevenEleven
        } else if name.contains("이마트24") || lower.contains("emart24") {
            Brand::Emart24
        } else if name.contains("미니스톱") {
            Brand::Ministop
        } else {
            Brand::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Brand::Cu => "CU",
            Brand::Gs25 => "GS25",
            Brand::SevenEleven => "세븐일레븐",
            Brand::Emart24 => "이마트24",
            Brand::Ministop => "미니스톱",
            Brand::Other => "기타",
        }
    }
}

// --- Tests ---
