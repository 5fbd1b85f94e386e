//! Splits a radius search into four overlapping rectangles.
//!
//! The category endpoint caps results per query (15 per page, 3 pages), so
//! querying each quadrant separately recovers up to four times as many
//! stores in dense areas.

use kakao_client::Rect;
use storewatch_common::Coordinate;

/// Degrees of latitude per kilometer.
pub const LAT_DEG_PER_KM: f64 = 0.0090;
/// Degrees of longitude per kilometer around 37°N. Not valid far from Seoul.
pub const LNG_DEG_PER_KM: f64 = 0.0113;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::NorthEast => "NE",
            Quadrant::NorthWest => "NW",
            Quadrant::SouthWest => "SW",
            Quadrant::SouthEast => "SE",
        }
    }
}

/// Rectangles in NE, NW, SW, SE order. Each has the center as one corner and
/// extends `radius_km` along both axes.
pub fn quadrants(center: Coordinate, radius_km: f64) -> [Rect; 4] {
    let d_lat = LAT_DEG_PER_KM * radius_km;
    let d_lng = LNG_DEG_PER_KM * radius_km;
    let (lat, lng) = (center.lat, center.lng);

    Quadrant::ALL.map(|q| match q {
        Quadrant::NorthEast => Rect {
            min_lng: lng,
            min_lat: lat,
            max_lng: lng + d_lng,
            max_lat: lat + d_lat,
        },
        Quadrant::NorthWest => Rect {
            min_lng: lng - d_lng,
            min_lat: lat,
            max_lng: lng,
            max_lat: lat + d_lat,
        },
        Quadrant::SouthWest => Rect {
            min_lng: lng - d_lng,
            min_lat: lat - d_lat,
            max_lng: lng,
            max_lat: lat,
        },
        Quadrant::SouthEast => Rect {
            min_lng: lng,
            min_lat: lat - d_lat,
            max_lng: lng + d_lng,
            max_lat: lat,
        },
    })
}

pub fn rect_contains(rect: &Rect, point: Coordinate) -> bool {
    point.lng >= rect.min_lng
        && point.lng <= rect.max_lng
        && point.lat >= rect.min_lat
        && point.lat <= rect.max_lat
}
