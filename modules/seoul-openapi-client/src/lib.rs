pub mod error;
pub mod types;

pub use error::{Result, SeoulOpenApiError};
pub use types::{LicenseRow, ServicePage, ServiceRows};

use std::time::Duration;

use serde_json::Value;

const BASE_URL: &str = "http://openAPI.seoul.go.kr:8088";

/// Largest row range the service returns in one call.
pub const PAGE_SIZE: u64 = 1000;

pub struct SeoulOpenApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SeoulOpenApiClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch rows `start..=end` (1-based, inclusive) of a service.
    pub async fn fetch_range(&self, service: &str, start: u64, end: u64) -> Result<ServicePage> {
        let url = format!(
            "{}/{}/json/{}/{}/{}/",
            self.base_url, self.api_key, service, start, end
        );
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SeoulOpenApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&resp.text().await?)?;
        ServicePage::from_body(service, &body)
    }

    /// Total row count, probed with a one-row request.
    pub async fn total_count(&self, service: &str) -> Result<u64> {
        Ok(self.fetch_range(service, 1, 1).await?.list_total_count)
    }

    /// Every row of a service, paged in `PAGE_SIZE` ranges. A failed range is
    /// skipped and counted; the other ranges are still returned.
    pub async fn fetch_all(&self, service: &str) -> Result<ServiceRows> {
        let total = self.total_count(service).await?;
        tracing::info!(service, total, "Fetching license dataset");

        let mut out = ServiceRows::default();
        let mut start = 1;
        while start <= total {
            let end = (start + PAGE_SIZE - 1).min(total);
            match self.fetch_range(service, start, end).await {
                Ok(page) => {
                    tracing::debug!(service, start, end, rows = page.rows.len(), "Range fetched");
                    out.rows.extend(page.rows);
                }
                Err(e @ SeoulOpenApiError::InvalidKey(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(service, start, end, error = %e, "Range fetch failed, skipping");
                    out.failed_ranges += 1;
                }
            }
            start += PAGE_SIZE;
        }

        Ok(out)
    }
}
