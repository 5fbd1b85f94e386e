use serde::{Deserialize, Serialize};

/// Kakao category group for convenience stores.
pub const CATEGORY_CONVENIENCE: &str = "CS2";

/// Largest page size the category endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 15;

/// Bounding rectangle in WGS84 degrees, serialized as `min_lng,min_lat,max_lng,max_lat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Rect {
    pub fn to_param(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}

/// One page request against `/v2/local/search/category.json`.
#[derive(Debug, Clone)]
pub struct CategoryQuery {
    pub category_group_code: String,
    pub rect: Rect,
    /// Sort origin longitude.
    pub x: f64,
    /// Sort origin latitude.
    pub y: f64,
    pub page: u32,
    pub size: u32,
    pub sort: SortOrder,
}

impl CategoryQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category_group_code", self.category_group_code.clone()),
            ("rect", self.rect.to_param()),
            ("x", format!("{:.6}", self.x)),
            ("y", format!("{:.6}", self.y)),
            ("page", self.page.to_string()),
            ("size", self.size.min(MAX_PAGE_SIZE).to_string()),
            ("sort", self.sort.as_str().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Distance,
    Accuracy,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Distance => "distance",
            SortOrder::Accuracy => "accuracy",
        }
    }
}

/// A place document returned by the category and keyword endpoints.
/// Kakao sends coordinates and distance as strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceDocument {
    pub id: String,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_group_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_name: Option<String>,
    #[serde(default)]
    pub road_address_name: Option<String>,
    /// Longitude.
    #[serde(default)]
    pub x: Option<String>,
    /// Latitude.
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub place_url: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
}

impl PlaceDocument {
    /// Road address when present, otherwise the lot address.
    pub fn best_address(&self) -> Option<&str> {
        self.road_address_name
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .or(self.address_name.as_deref())
    }

    /// `(latitude, longitude)` when both parse as finite numbers.
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        let lat = self.y.as_deref()?.trim().parse::<f64>().ok()?;
        let lng = self.x.as_deref()?.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
    }

    pub fn distance_m(&self) -> Option<u32> {
        self.distance.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default = "default_is_end")]
    pub is_end: bool,
    #[serde(default)]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub pageable_count: Option<u32>,
}

// A missing meta block means there is nothing further to page through.
fn default_is_end() -> bool {
    true
}

/// One page of search results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub documents: Vec<PlaceDocument>,
    #[serde(default = "end_meta")]
    pub meta: PageMeta,
}

fn end_meta() -> PageMeta {
    PageMeta {
        is_end: true,
        ..PageMeta::default()
    }
}

impl SearchPage {
    /// The page a failed request degrades to: no documents, no further pages.
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            meta: end_meta(),
        }
    }
}

/// A document from `/v2/local/search/address.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressDocument {
    #[serde(default)]
    pub address_name: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
}

impl AddressDocument {
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        let lat = self.y.as_deref()?.trim().parse::<f64>().ok()?;
        let lng = self.x.as_deref()?.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddressResponse {
    #[serde(default)]
    pub documents: Vec<AddressDocument>,
}
