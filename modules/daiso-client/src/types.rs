use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body for the store search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSearchInput {
    /// Reference longitude.
    pub cur_litd: f64,
    /// Reference latitude.
    pub cur_lttd: f64,
    pub current_page: u32,
    pub geolocation_agr_yn: String,
    pub keyword: String,
    pub page_size: u32,
    pub srch_bass_pkup_str_yn: String,
    pub srch_yn: String,
}

impl StoreSearchInput {
    /// Keyword search anchored at central Seoul, large enough to avoid paging.
    pub fn keyword(keyword: &str) -> Self {
        Self {
            cur_litd: 126.9088468,
            cur_lttd: 37.4989756,
            current_page: 1,
            geolocation_agr_yn: "Y".to_string(),
            keyword: keyword.to_string(),
            page_size: 100,
            srch_bass_pkup_str_yn: "Y".to_string(),
            srch_yn: "Y".to_string(),
        }
    }
}

/// One store from the locator. Coordinates of `0` mean "unknown".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaisoStore {
    #[serde(rename = "strCd", default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(rename = "strNm", default)]
    pub name: String,
    #[serde(rename = "strAddr", default)]
    pub address: String,
    #[serde(rename = "strLttd", default, deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(rename = "strLitd", default, deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

impl DaisoStore {
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoreSearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<DaisoStore>,
}

// The locator mixes numeric and string encodings between deployments.
fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_encodings() {
        let json = r#"{"success": true, "data": [
            {"strCd": 10234, "strNm": "영등포점", "strAddr": "서울특별시 영등포구 영중로 9", "strLttd": "37.5172", "strLitd": 126.9051},
            {"strCd": "10235", "strNm": "당산점", "strAddr": "서울특별시 영등포구 당산로 100", "strLttd": null, "strLitd": 0}
        ]}"#;
        let resp: StoreSearchResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data[0].code, "10234");
        assert!(resp.data[0].has_coordinates());
        assert_eq!(resp.data[1].code, "10235");
        assert!(!resp.data[1].has_coordinates());
    }

    #[test]
    fn input_serializes_camel_case() {
        let v = serde_json::to_value(StoreSearchInput::keyword("영등포")).unwrap();
        assert_eq!(v["keyword"], "영등포");
        assert_eq!(v["pageSize"], 100);
        assert_eq!(v["srchBassPkupStrYn"], "Y");
    }
}
