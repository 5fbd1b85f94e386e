//! Anchor stores (the retail chain the convenience-store search radiates from).

use async_trait::async_trait;
use daiso_client::{DaisoClient, DaisoStore};
use kakao_client::KakaoClient;
use storewatch_common::{search_keyword, Coordinate, OriginTag, StoreRecord};
use tracing::{info, warn};

use crate::error::{CollectError, Result};

/// Brand prefix added to anchor names so map keyword searches hit them.
pub const ANCHOR_BRAND: &str = "다이소";

const CITY_MARKER: &str = "서울";

#[async_trait]
pub trait StoreLocator: Send + Sync {
    async fn search_stores(&self, keyword: &str) -> daiso_client::Result<Vec<DaisoStore>>;
}

#[async_trait]
impl StoreLocator for DaisoClient {
    async fn search_stores(&self, keyword: &str) -> daiso_client::Result<Vec<DaisoStore>> {
        DaisoClient::search_stores(self, keyword).await
    }
}

/// Finds a position for a store whose own record has none.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, store_name: &str, address: &str) -> kakao_client::Result<Option<Coordinate>>;
}

/// Keyword search on `"다이소 {name}"`, then geocoding the address.
#[async_trait]
impl Geocoder for KakaoClient {
    async fn locate(&self, store_name: &str, address: &str) -> kakao_client::Result<Option<Coordinate>> {
        let page = self
            .keyword_search(&format!("{ANCHOR_BRAND} {store_name}"), 1)
            .await?;
        if let Some((lat, lng)) = page.documents.first().and_then(|d| d.lat_lng()) {
            return Ok(Some(Coordinate::new(lat, lng)));
        }
        if address.trim().is_empty() {
            return Ok(None);
        }
        let docs = self.address_search(address).await?;
        Ok(docs
            .first()
            .and_then(|d| d.lat_lng())
            .map(|(lat, lng)| Coordinate::new(lat, lng)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorReport {
    pub found: usize,
    pub outside_city: usize,
    pub backfilled: usize,
    pub unlocated: usize,
}

/// Anchor stores for a district, each with a usable coordinate.
pub async fn collect_anchors(
    locator: &dyn StoreLocator,
    geocoder: &dyn Geocoder,
    district: &str,
) -> Result<(Vec<StoreRecord>, AnchorReport)> {
    let keyword = search_keyword(district);
    let stores = locator.search_stores(&keyword).await?;
    let mut report = AnchorReport {
        found: stores.len(),
        ..Default::default()
    };

    let mut anchors = Vec::new();
    for store in stores {
        if !store.address.contains(CITY_MARKER) {
            report.outside_city += 1;
            continue;
        }

        let coordinate = if store.has_coordinates() {
            Some(Coordinate::new(store.latitude, store.longitude))
        } else {
            match geocoder.locate(&store.name, &store.address).await {
                Ok(Some(c)) => {
                    report.backfilled += 1;
                    Some(c)
                }
                Ok(None) => None,
                Err(e) => {
                    let e = CollectError::fatal(e)?;
                    warn!(store = %store.name, error = %e, "Geocoding failed");
                    None
                }
            }
        };
        let Some(coordinate) = coordinate.filter(Coordinate::is_usable) else {
            report.unlocated += 1;
            continue;
        };

        anchors.push(
            StoreRecord::new(store.code.clone(), OriginTag::RetailerApi)
                .with_name(format!("{ANCHOR_BRAND} {}", store.name.trim()))
                .with_address(store.address.trim())
                .with_coordinate(coordinate.lat, coordinate.lng),
        );
    }

    info!(
        district,
        keyword = %keyword,
        anchors = anchors.len(),
        outside_city = report.outside_city,
        backfilled = report.backfilled,
        unlocated = report.unlocated,
        "Anchors collected"
    );
    Ok((anchors, report))
}
