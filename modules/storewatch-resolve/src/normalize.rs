//! Deterministic key derivation for cross-source matching.
//!
//! Every function here is pure: equal raw input always yields equal keys and
//! applying a normalizer to its own output is a no-op. Empty keys mean "no
//! key" and are never inserted into an index.

use std::sync::LazyLock;

use regex::Regex;
use storewatch_common::{Coordinate, StoreRecord};

/// Canonical city token every Seoul prefix variant collapses to.
pub const CITY: &str = "서울";

/// Default rounding precision (about 11 m of latitude).
pub const DEFAULT_COORD_DECIMALS: u32 = 4;

const MAX_COORD_DECIMALS: u32 = 9;

static RE_ROAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣]+(?:로|길|대로)[0-9가-힣]*)\s*(\d+(?:-\d+)?)").expect("valid road regex")
});
static RE_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid paren regex"));
static RE_COMMA_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s),.*$").expect("valid comma regex"));

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Trim, drop whitespace, `-` and `_`, lowercase.
pub fn normalize_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };
    name.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Canonical address key.
///
/// With a road-name + house-number token the key is `서울 {district} {road} {number}`,
/// where the district is re-detected in the raw address from `district_hint`
/// (the full name, or its stem without the trailing 구). Without such a token
/// the key is the address with parenthetical asides and anything after the
/// first comma removed, whitespace collapsed.
pub fn normalize_address(address: Option<&str>, district_hint: &str) -> String {
    let Some(raw) = address.map(str::trim).filter(|a| !is_missing(a)) else {
        return String::new();
    };

    let unified = unify_city(raw);
    let district = detect_district(&unified, district_hint);
    if let Some(key) = road_key(&unified, district) {
        return key;
    }

    // Stripping asides can join a road token back together.
    let cleaned = clean_fallback(&unified);
    let district = district.or_else(|| detect_district(&cleaned, district_hint));
    if let Some(key) = road_key(&cleaned, district) {
        return key;
    }
    if is_missing(&cleaned) {
        return String::new();
    }
    cleaned
}

// `nan` is what spreadsheet exports write for an empty cell.
fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}

fn unify_city(address: &str) -> String {
    let mut out = address.to_string();
    while out.contains("서울특별시") || out.contains("서울시") {
        out = out.replace("서울특별시", CITY).replace("서울시", CITY);
    }
    out
}

fn road_key(text: &str, district: Option<&str>) -> Option<String> {
    let caps = RE_ROAD.captures(text)?;
    let road = caps.get(1)?.as_str();
    let number = caps.get(2)?.as_str();
    let district = district.unwrap_or("");
    Some(collapse_whitespace(&format!("{CITY} {district} {road} {number}")))
}

fn detect_district<'a>(address: &str, hint: &'a str) -> Option<&'a str> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if address.contains(hint) {
        return Some(hint);
    }
    match hint.strip_suffix('구') {
        Some(stem) if stem.chars().count() >= 2 && address.contains(stem) => Some(hint),
        _ => None,
    }
}

fn clean_fallback(address: &str) -> String {
    let mut current = address.to_string();
    loop {
        let stripped = RE_PARENS.replace_all(&unify_city(&current), "").into_owned();
        let next = collapse_whitespace(&RE_COMMA_TAIL.replace(&stripped, ""));
        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Rounded coordinate pair, stored as scaled integers so it hashes exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat: i64,
    lng: i64,
}

/// Round to `decimals` places. Missing or non-finite input has no key.
pub fn round_coord(value: Option<f64>, decimals: u32) -> Option<f64> {
    let scaled = scale(value?, decimals)?;
    Some(scaled as f64 / 10f64.powi(decimals.min(MAX_COORD_DECIMALS) as i32))
}

/// Lenient numeric parse for string-typed coordinate fields.
pub fn parse_coord(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if is_missing(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn coord_key(coordinate: Option<Coordinate>, decimals: u32) -> Option<CoordKey> {
    let c = coordinate.filter(Coordinate::is_usable)?;
    Some(CoordKey {
        lat: scale(c.lat, decimals)?,
        lng: scale(c.lng, decimals)?,
    })
}

fn scale(value: f64, decimals: u32) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(decimals.min(MAX_COORD_DECIMALS) as i32);
    Some((value * factor).round() as i64)
}

// ---------------------------------------------------------------------------
// Key sets
// ---------------------------------------------------------------------------

/// All comparable keys of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKeySet {
    pub name_key: String,
    pub address_key: String,
    pub coord_key: Option<CoordKey>,
}

/// Normalization settings shared by every dataset in a run.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pub district_hint: String,
    pub coord_decimals: u32,
}

impl Normalizer {
    pub fn new(district_hint: impl Into<String>, coord_decimals: u32) -> Self {
        Self {
            district_hint: district_hint.into(),
            coord_decimals,
        }
    }

    pub fn keys(&self, record: &StoreRecord) -> NormalizedKeySet {
        NormalizedKeySet {
            name_key: normalize_name(record.name.as_deref()),
            address_key: normalize_address(record.raw_address.as_deref(), &self.district_hint),
            coord_key: coord_key(record.coordinate, self.coord_decimals),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("", DEFAULT_COORD_DECIMALS)
    }
}
