//! Bounded-concurrency quadrant collection against the map search API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use kakao_client::{
    CategoryQuery, KakaoClient, KakaoError, PlaceDocument, Rect, SearchPage, SortOrder,
    MAX_PAGE_SIZE,
};
use storewatch_common::{dedupe_by_source_id, Coordinate, OriginTag, StoreRecord};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::error::{CollectError, Result};
use crate::filter::RecordFilter;
use crate::quadrant::{quadrants, Quadrant};
use crate::rate_limit::{RateLimiter, DEFAULT_MAX_CONCURRENT, DEFAULT_SETTLE_DELAY};
use crate::stats::{CollectionStats, StatsSnapshot};

/// Hard page cap per quadrant, whatever the upstream `is_end` says.
pub const MAX_PAGES: u32 = 3;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Centers fetched at the same time; the limiter still bounds requests.
const CENTER_CONCURRENCY: usize = 4;

// ---------------------------------------------------------------------------
// PlaceSearch: seam over the map API
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn category_search(&self, query: &CategoryQuery) -> kakao_client::Result<SearchPage>;
}

#[async_trait]
impl PlaceSearch for KakaoClient {
    async fn category_search(&self, query: &CategoryQuery) -> kakao_client::Result<SearchPage> {
        KakaoClient::category_search(self, query).await
    }
}

// ---------------------------------------------------------------------------
// Options and centers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, TypedBuilder)]
pub struct FetchOptions {
    #[builder(default = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,
    #[builder(default = DEFAULT_SETTLE_DELAY)]
    pub settle_delay: Duration,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    #[builder(default = MAX_PAGES)]
    pub max_pages: u32,
    #[builder(default = MAX_PAGE_SIZE)]
    pub page_size: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A point searches radiate from, usually an anchor store.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCenter {
    pub label: String,
    pub coordinate: Coordinate,
}

impl SearchCenter {
    pub fn new(label: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            label: label.into(),
            coordinate,
        }
    }

    /// Records without a usable coordinate cannot be searched around.
    pub fn from_record(record: &StoreRecord) -> Option<Self> {
        let coordinate = record.coordinate.filter(Coordinate::is_usable)?;
        let label = record.name.clone().unwrap_or_else(|| record.source_id.clone());
        Some(Self::new(label, coordinate))
    }
}

// ---------------------------------------------------------------------------
// RateLimitedFetcher
// ---------------------------------------------------------------------------

pub struct RateLimitedFetcher {
    search: Arc<dyn PlaceSearch>,
    limiter: RateLimiter,
    stats: CollectionStats,
    options: FetchOptions,
}

impl RateLimitedFetcher {
    pub fn new(search: Arc<dyn PlaceSearch>, options: FetchOptions) -> Self {
        Self {
            limiter: RateLimiter::new(options.max_concurrent, options.settle_delay),
            search,
            stats: CollectionStats::new(),
            options,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Collect every record of `category` within `radius_km` of each center.
    ///
    /// Quadrants of a center run concurrently; pages within a quadrant run in
    /// order. Per-center results are deduplicated by source id, then
    /// filtered. Credential rejection aborts the whole run and cancels the
    /// requests still in flight.
    pub async fn fetch_all(
        &self,
        centers: &[SearchCenter],
        radius_km: f64,
        category: &str,
        filter: &dyn RecordFilter,
    ) -> Result<Vec<StoreRecord>> {
        info!(
            centers = centers.len(),
            radius_km,
            category,
            filter = %filter.describe(),
            "Starting collection"
        );

        let per_center: Vec<Vec<StoreRecord>> = stream::iter(centers)
            .map(|center| self.fetch_center(center, radius_km, category, filter))
            .buffered(CENTER_CONCURRENCY)
            .try_collect()
            .await?;

        let records = dedupe_by_source_id(per_center.into_iter().flatten());
        self.stats.record_stored(records.len());

        let stats = self.stats.snapshot();
        info!(
            stored = stats.stored,
            skipped = stats.skipped,
            calls = stats.calls,
            errors = stats.error_count,
            "Collection complete"
        );
        Ok(records)
    }

    /// One center: four concurrent quadrants, merged, deduplicated, filtered.
    pub async fn fetch_center(
        &self,
        center: &SearchCenter,
        radius_km: f64,
        category: &str,
        filter: &dyn RecordFilter,
    ) -> Result<Vec<StoreRecord>> {
        let rects = quadrants(center.coordinate, radius_km);
        let per_quadrant = futures::future::try_join_all(
            Quadrant::ALL
                .iter()
                .zip(rects)
                .map(|(q, rect)| self.fetch_quadrant(center, *q, rect, category)),
        )
        .await?;

        let fetched: Vec<StoreRecord> = per_quadrant
            .into_iter()
            .flatten()
            .map(|doc| to_record(doc, &center.label))
            .collect();
        let unique = dedupe_by_source_id(fetched);
        let total = unique.len();
        let kept: Vec<StoreRecord> = unique.into_iter().filter(|r| filter.accept(r)).collect();
        let skipped = total - kept.len();
        self.stats.record_skipped(skipped);

        debug!(center = %center.label, kept = kept.len(), skipped, "Center collected");
        Ok(kept)
    }

    /// Sequential pages for one quadrant. A failed page ends the quadrant but
    /// keeps what earlier pages returned.
    async fn fetch_quadrant(
        &self,
        center: &SearchCenter,
        quadrant: Quadrant,
        rect: Rect,
        category: &str,
    ) -> Result<Vec<PlaceDocument>> {
        let mut documents = Vec::new();

        for page in 1..=self.options.max_pages {
            let query = CategoryQuery {
                category_group_code: category.to_string(),
                rect,
                x: center.coordinate.lng,
                y: center.coordinate.lat,
                page,
                size: self.options.page_size,
                sort: SortOrder::Distance,
            };

            let result = self.limiter.run(self.request(&query)).await?;
            let page_data = match result {
                Ok(p) => p,
                Err(e) => {
                    let e = CollectError::fatal(e)?;
                    warn!(
                        center = %center.label,
                        quadrant = quadrant.label(),
                        page,
                        error = %e,
                        "Page request failed"
                    );
                    self.stats.record_error(format!(
                        "{} {} page {page}: {e}",
                        center.label,
                        quadrant.label()
                    ));
                    break;
                }
            };

            if page_data.documents.is_empty() {
                break;
            }
            let is_end = page_data.meta.is_end;
            documents.extend(page_data.documents);
            if is_end {
                break;
            }
        }

        Ok(documents)
    }

    async fn request(&self, query: &CategoryQuery) -> kakao_client::Result<SearchPage> {
        self.stats.record_call();
        let timeout = self.options.request_timeout;
        match tokio::time::timeout(timeout, self.search.category_search(query)).await {
            Ok(result) => result,
            Err(_) => Err(KakaoError::Timeout(format!(
                "no response within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

fn to_record(doc: PlaceDocument, anchor: &str) -> StoreRecord {
    let mut record = StoreRecord::new(doc.id.clone(), OriginTag::MapApi).with_anchor(anchor);
    if let Some(name) = doc.place_name.as_deref().filter(|n| !n.trim().is_empty()) {
        record = record.with_name(name);
    }
    if let Some(address) = doc.best_address().filter(|a| !a.trim().is_empty()) {
        record = record.with_address(address);
    }
    if let Some((lat, lng)) = doc.lat_lng() {
        record = record.with_coordinate(lat, lng);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_map_to_records() {
        let doc = PlaceDocument {
            id: "26338954".into(),
            place_name: Some("GS25 당산점".into()),
            road_address_name: Some(String::new()),
            address_name: Some("서울 영등포구 당산동3가 1".into()),
            x: Some("126.9066".into()),
            y: Some("37.5171".into()),
            ..Default::default()
        };
        let record = to_record(doc, "다이소 당산점");
        assert_eq!(record.source_id, "26338954");
        assert_eq!(record.origin_tag, OriginTag::MapApi);
        assert_eq!(record.raw_address.as_deref(), Some("서울 영등포구 당산동3가 1"));
        assert_eq!(record.coordinate, Some(Coordinate::new(37.5171, 126.9066)));
        assert_eq!(record.anchor.as_deref(), Some("다이소 당산점"));
    }

    #[test]
    fn centers_need_usable_coordinates() {
        let without = StoreRecord::new("1", OriginTag::RetailerApi).with_name("다이소 A");
        let zero = StoreRecord::new("2", OriginTag::RetailerApi).with_coordinate(0.0, 0.0);
        let located = StoreRecord::new("3", OriginTag::RetailerApi)
            .with_name("다이소 B")
            .with_coordinate(37.5, 126.9);
        assert!(SearchCenter::from_record(&without).is_none());
        assert!(SearchCenter::from_record(&zero).is_none());
        assert_eq!(SearchCenter::from_record(&located).unwrap().label, "다이소 B");
    }
}
