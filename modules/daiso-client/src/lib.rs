pub mod error;
pub mod types;

pub use error::{DaisoError, Result};
pub use types::{DaisoStore, StoreSearchInput};

use std::time::Duration;

use types::StoreSearchResponse;

const BASE_URL: &str = "https://fapi.daisomall.co.kr";

pub struct DaisoClient {
    client: reqwest::Client,
    base_url: String,
}

impl DaisoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search stores by keyword (typically a district name stem).
    pub async fn search_stores(&self, keyword: &str) -> Result<Vec<DaisoStore>> {
        let url = format!("{}/ms/msg/selStr", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Referer", "https://www.daisomall.co.kr/")
            .header("Origin", "https://www.daisomall.co.kr")
            .json(&StoreSearchInput::keyword(keyword))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DaisoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: StoreSearchResponse = serde_json::from_str(&resp.text().await?)?;
        if !body.success {
            return Err(DaisoError::Unsuccessful);
        }
        tracing::info!(keyword, count = body.data.len(), "Fetched Daiso stores");
        Ok(body.data)
    }
}
