//! Static lookup of Seoul's 25 districts and their open-data service names.

use crate::error::StorewatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct District {
    pub name: &'static str,
    pub code: &'static str,
}

impl District {
    /// Restaurant-license (휴게음식점) service for this district.
    pub fn restaurant_service(&self) -> String {
        format!("LOCALDATA_072405_{}", self.code)
    }

    /// Tobacco-retail-license (담배소매업) service for this district.
    pub fn tobacco_service(&self) -> String {
        format!("LOCALDATA_114302_{}", self.code)
    }
}

const DISTRICTS: &[District] = &[
    District { name: "강남구", code: "GN" },
    District { name: "강동구", code: "GD" },
    District { name: "강북구", code: "GB" },
    District { name: "강서구", code: "GS" },
    District { name: "관악구", code: "GA" },
    District { name: "광진구", code: "GJ" },
    District { name: "구로구", code: "GR" },
    District { name: "금천구", code: "GC" },
    District { name: "노원구", code: "NW" },
    District { name: "도봉구", code: "DB" },
    District { name: "동대문구", code: "DD" },
    District { name: "동작구", code: "DJ" },
    District { name: "마포구", code: "MP" },
    District { name: "서대문구", code: "SD" },
    District { name: "서초구", code: "SC" },
    District { name: "성동구", code: "SDG" },
    District { name: "성북구", code: "SB" },
    District { name: "송파구", code: "SP" },
    District { name: "양천구", code: "YC" },
    District { name: "영등포구", code: "YD" },
    District { name: "용산구", code: "YS" },
    District { name: "은평구", code: "EP" },
    District { name: "종로구", code: "JR" },
    District { name: "중구", code: "JG" },
    District { name: "중랑구", code: "JN" },
];

pub fn supported_districts() -> impl Iterator<Item = &'static str> {
    DISTRICTS.iter().map(|d| d.name)
}

pub fn district_info(name: &str) -> Result<&'static District, StorewatchError> {
    let name = name.trim();
    DISTRICTS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| StorewatchError::UnknownDistrict {
            name: name.to_string(),
            supported: supported_districts().collect::<Vec<_>>().join(", "),
        })
}

/// Retailer search keyword for a district: the name without its trailing 구,
/// unless that leaves a single character (중구 stays 중구).
pub fn search_keyword(district: &str) -> String {
    let district = district.trim();
    match district.strip_suffix('구') {
        Some(stem) if stem.chars().count() >= 2 => stem.to_string(),
        _ => district.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_25_districts_have_distinct_codes() {
        let mut codes: Vec<_> = DISTRICTS.iter().map(|d| d.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 25);
    }

    #[test]
    fn service_names_follow_localdata_pattern() {
        let d = district_info("영등포구").unwrap();
        assert_eq!(d.restaurant_service(), "LOCALDATA_072405_YD");
        assert_eq!(d.tobacco_service(), "LOCALDATA_114302_YD");
    }

    #[test]
    fn unknown_district_lists_supported() {
        let err = district_info("해운대구").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("해운대구"));
        assert!(msg.contains("영등포구"));
    }

    #[test]
    fn keyword_strips_suffix_but_not_for_short_names() {
        assert_eq!(search_keyword("영등포구"), "영등포");
        assert_eq!(search_keyword("구로구"), "구로");
        assert_eq!(search_keyword("중구"), "중구");
    }
}
