pub mod error;
pub mod types;

pub use error::{KakaoError, Result};
pub use types::{
    AddressDocument, CategoryQuery, PageMeta, PlaceDocument, Rect, SearchPage, SortOrder,
    CATEGORY_CONVENIENCE, MAX_PAGE_SIZE,
};

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use types::AddressResponse;

pub const BASE_URL: &str = "https://dapi.kakao.com/v2/local";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct KakaoClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl KakaoClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_options(api_key, BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Build a client against a custom base URL (e.g. a local stub) with a
    /// per-request timeout.
    pub fn with_options(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("KakaoAK {api_key}"),
        })
    }

    /// Fetch one page of a category search inside a rectangle.
    pub async fn category_search(&self, query: &CategoryQuery) -> Result<SearchPage> {
        let url = format!("{}/search/category.json", self.base_url);
        let page: SearchPage = self.get_json(&url, &query.params()).await?;
        tracing::debug!(
            page = query.page,
            documents = page.documents.len(),
            is_end = page.meta.is_end,
            "Category page fetched"
        );
        Ok(page)
    }

    /// Free-text place search. Used to locate a store whose own record lacks coordinates.
    pub async fn keyword_search(&self, query: &str, size: u32) -> Result<SearchPage> {
        let url = format!("{}/search/keyword.json", self.base_url);
        let params = vec![
            ("query", query.to_string()),
            ("size", size.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        self.get_json(&url, &params).await
    }

    /// Geocode a postal address.
    pub async fn address_search(&self, address: &str) -> Result<Vec<AddressDocument>> {
        let url = format!("{}/search/address.json", self.base_url);
        let params = vec![("query", address.to_string())];
        let resp: AddressResponse = self.get_json(&url, &params).await?;
        Ok(resp.documents)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => KakaoError::Unauthorized {
                    status: status.as_u16(),
                    message,
                },
                _ => KakaoError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
