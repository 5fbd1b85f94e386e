use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SeoulOpenApiError};

/// `RESULT.CODE` meaning "no matching data".
pub const CODE_NO_DATA: &str = "INFO-200";
/// `RESULT.CODE` meaning "invalid authentication key".
pub const CODE_INVALID_KEY: &str = "INFO-100";

/// One row of a LOCALDATA license dataset. Every field arrives as a string,
/// including the projected `X`/`Y` coordinates, which may carry whitespace.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub struct LicenseRow {
    #[serde(default)]
    pub mgtno: Option<String>,
    #[serde(default)]
    pub bplcnm: Option<String>,
    #[serde(default)]
    pub trdstategbn: Option<String>,
    #[serde(default)]
    pub trdstatenm: Option<String>,
    #[serde(default)]
    pub dtlstatenm: Option<String>,
    #[serde(default)]
    pub sitewhladdr: Option<String>,
    #[serde(default)]
    pub rdnwhladdr: Option<String>,
    #[serde(default)]
    pub sitetel: Option<String>,
    #[serde(default)]
    pub uptaenm: Option<String>,
    #[serde(default)]
    pub apvpermymd: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
}

impl LicenseRow {
    /// Road-name address when present, otherwise the lot address.
    pub fn best_address(&self) -> Option<&str> {
        non_blank(self.rdnwhladdr.as_deref()).or_else(|| non_blank(self.sitewhladdr.as_deref()))
    }

    /// Trading status `01` or a status name containing 영업.
    pub fn is_operating(&self) -> bool {
        self.trdstategbn.as_deref().map(str::trim) == Some("01")
            || self
                .trdstatenm
                .as_deref()
                .is_some_and(|s| s.contains("영업"))
    }

    /// Trimmed projected coordinate pair as numbers.
    pub fn projected_xy(&self) -> Option<(f64, f64)> {
        let x = non_blank(self.x.as_deref())?.parse::<f64>().ok()?;
        let y = non_blank(self.y.as_deref())?.parse::<f64>().ok()?;
        Some((x, y))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// A decoded page: `{service_name: {list_total_count, RESULT, row}}`.
#[derive(Debug, Clone, Default)]
pub struct ServicePage {
    pub list_total_count: u64,
    pub rows: Vec<LicenseRow>,
}

#[derive(Debug, Deserialize)]
struct ResultBlock {
    #[serde(rename = "CODE", default)]
    code: String,
    #[serde(rename = "MESSAGE", default)]
    message: String,
}

/// Every row of a service, with the number of ranges that could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRows {
    pub rows: Vec<LicenseRow>,
    pub failed_ranges: usize,
}

impl ServicePage {
    /// Decode a response body for `service`. A top-level `RESULT` block is an
    /// error unless it reports "no data", which decodes to an empty page.
    pub fn from_body(service: &str, body: &Value) -> Result<Self> {
        if let Some(block) = body.get(service) {
            let list_total_count = block
                .get("list_total_count")
                .and_then(count_value)
                .unwrap_or(0);
            let rows = match block.get("row") {
                Some(rows) => serde_json::from_value(rows.clone())?,
                None => Vec::new(),
            };
            return Ok(Self {
                list_total_count,
                rows,
            });
        }

        match body.get("RESULT") {
            Some(result) => {
                let result: ResultBlock = serde_json::from_value(result.clone())?;
                match result.code.as_str() {
                    CODE_NO_DATA => Ok(Self::default()),
                    CODE_INVALID_KEY => Err(SeoulOpenApiError::InvalidKey(result.message)),
                    _ => Err(SeoulOpenApiError::Service {
                        code: result.code,
                        message: result.message,
                    }),
                }
            }
            None => Err(SeoulOpenApiError::Parse(format!(
                "response has neither '{service}' nor RESULT"
            ))),
        }
    }
}

fn count_value(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
