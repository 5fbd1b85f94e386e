use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::StorewatchError;
use crate::types::{DirectMatchMode, MatchPolicy, SecondaryMatch};

/// Run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Credentials
    pub kakao_api_key: String,
    pub seoul_openapi_key: String,
    pub database_url: Option<String>,

    // Scope
    pub target_district: String,
    pub coord_decimals: u32,
    pub search_radius_km: f64,

    // Fetcher
    pub max_concurrent_requests: usize,
    pub request_delay: Duration,
    pub request_timeout: Duration,

    // Inputs / outputs
    pub public_data_csv: Option<PathBuf>,
    pub output_csv: PathBuf,

    pub match_policy: MatchPolicy,
}

impl Config {
    /// Load configuration from environment variables. Fails with the variable
    /// name when a required var is missing or a value does not parse.
    pub fn from_env() -> Result<Self, StorewatchError> {
        Ok(Self {
            kakao_api_key: required_env("KAKAO_API_KEY")?,
            seoul_openapi_key: env::var("SEOUL_OPENAPI_KEY").unwrap_or_default(),
            database_url: optional_env("DATABASE_URL"),
            target_district: env::var("TARGET_DISTRICT").unwrap_or_else(|_| "영등포구".to_string()),
            coord_decimals: parsed_env("COORD_DECIMALS", 4)?,
            search_radius_km: parsed_env("SEARCH_RADIUS_KM", 1.8)?,
            max_concurrent_requests: parsed_env("MAX_CONCURRENT_REQUESTS", 8)?,
            request_delay: Duration::from_millis(parsed_env("REQUEST_DELAY_MS", 100)?),
            request_timeout: Duration::from_secs(parsed_env("REQUEST_TIMEOUT_SECS", 5)?),
            public_data_csv: optional_env("PUBLIC_DATA_CSV").map(PathBuf::from),
            output_csv: optional_env("OUTPUT_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("closure_results.csv")),
            match_policy: MatchPolicy {
                direct: parsed_env::<DirectMatchMode>("MATCH_MODE", DirectMatchMode::Any)?,
                secondary: parsed_env::<SecondaryMatch>(
                    "SECONDARY_MATCH",
                    SecondaryMatch::NameOrCoord,
                )?,
            },
        })
    }

    /// Log the effective configuration with credentials masked.
    pub fn log_redacted(&self) {
        info!(
            kakao_api_key = redact(&self.kakao_api_key),
            seoul_openapi_key = redact(&self.seoul_openapi_key),
            database = self.database_url.is_some(),
            district = self.target_district.as_str(),
            coord_decimals = self.coord_decimals,
            radius_km = self.search_radius_km,
            max_concurrent = self.max_concurrent_requests,
            delay_ms = self.request_delay.as_millis() as u64,
            timeout_s = self.request_timeout.as_secs(),
            public_data_csv = ?self.public_data_csv,
            output_csv = %self.output_csv.display(),
            match_policy = ?self.match_policy,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> Result<String, StorewatchError> {
    optional_env(key)
        .ok_or_else(|| StorewatchError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(key: &str, default: T) -> Result<T, StorewatchError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| StorewatchError::Config(format!("{key} is invalid ({raw}): {e}"))),
        None => Ok(default),
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}
