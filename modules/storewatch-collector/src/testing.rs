// In-memory doubles for the network seams.
//
// - MockPlaceSearch (PlaceSearch): scripted pages per (rect, page)
// - MockStoreLocator (StoreLocator): fixed store list
// - MockGeocoder (Geocoder): name → coordinate map
// - MockLicenseSource (LicenseSource): rows per service name
//
// No network, so collection behavior is tested deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use daiso_client::DaisoStore;
use kakao_client::{CategoryQuery, KakaoError, PageMeta, PlaceDocument, SearchPage};
use seoul_openapi_client::{LicenseRow, ServiceRows};
use storewatch_common::Coordinate;

use crate::anchors::{Geocoder, StoreLocator};
use crate::fetcher::PlaceSearch;
use crate::sources::license::LicenseSource;

// ---------------------------------------------------------------------------
// MockPlaceSearch
// ---------------------------------------------------------------------------

/// Scripted reply for one request.
pub enum MockReply {
    Page(SearchPage),
    Error(KakaoError),
    /// Never answers within any sane timeout.
    Hang,
}

/// Replies keyed by `(rect param, page)`. Unscripted requests get an empty
/// last page. Tracks calls and peak concurrency.
pub struct MockPlaceSearch {
    replies: Mutex<HashMap<(String, u32), MockReply>>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockPlaceSearch {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn on_page(self, rect: &str, page: u32, documents: Vec<PlaceDocument>, is_end: bool) -> Self {
        self.reply(
            rect,
            page,
            MockReply::Page(SearchPage {
                documents,
                meta: PageMeta {
                    is_end,
                    ..PageMeta::default()
                },
            }),
        )
    }

    pub fn on_error(self, rect: &str, page: u32, error: KakaoError) -> Self {
        self.reply(rect, page, MockReply::Error(error))
    }

    pub fn on_hang(self, rect: &str, page: u32) -> Self {
        self.reply(rect, page, MockReply::Hang)
    }

    fn reply(self, rect: &str, page: u32, reply: MockReply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert((rect.to_string(), page), reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for MockPlaceSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceSearch for MockPlaceSearch {
    async fn category_search(&self, query: &CategoryQuery) -> kakao_client::Result<SearchPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let key = (query.rect.to_param(), query.page);
        let reply = match self.replies.lock().unwrap().get(&key) {
            Some(MockReply::Page(p)) => Ok(Some(p.clone())),
            Some(MockReply::Error(e)) => Err(clone_error(e)),
            Some(MockReply::Hang) => Ok(None),
            None => Ok(Some(SearchPage::empty())),
        };
        let result = match reply {
            Ok(Some(page)) => Ok(page),
            Ok(None) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(SearchPage::empty())
            }
            Err(e) => Err(e),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn clone_error(e: &KakaoError) -> KakaoError {
    match e {
        KakaoError::Network(m) => KakaoError::Network(m.clone()),
        KakaoError::Timeout(m) => KakaoError::Timeout(m.clone()),
        KakaoError::Unauthorized { status, message } => KakaoError::Unauthorized {
            status: *status,
            message: message.clone(),
        },
        KakaoError::Api { status, message } => KakaoError::Api {
            status: *status,
            message: message.clone(),
        },
        KakaoError::Parse(m) => KakaoError::Parse(m.clone()),
    }
}

/// Map-API document with a road address and coordinate.
pub fn place(id: &str, name: &str, address: &str, lat: f64, lng: f64) -> PlaceDocument {
    PlaceDocument {
        id: id.to_string(),
        place_name: Some(name.to_string()),
        road_address_name: Some(address.to_string()),
        x: Some(lng.to_string()),
        y: Some(lat.to_string()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// MockStoreLocator / MockGeocoder
// ---------------------------------------------------------------------------

pub struct MockStoreLocator {
    stores: Vec<DaisoStore>,
    keywords: Mutex<Vec<String>>,
}

impl MockStoreLocator {
    pub fn new(stores: Vec<DaisoStore>) -> Self {
        Self {
            stores,
            keywords: Mutex::new(Vec::new()),
        }
    }

    /// Keywords searched so far.
    pub fn keywords(&self) -> Vec<String> {
        self.keywords.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreLocator for MockStoreLocator {
    async fn search_stores(&self, keyword: &str) -> daiso_client::Result<Vec<DaisoStore>> {
        self.keywords.lock().unwrap().push(keyword.to_string());
        Ok(self.stores.clone())
    }
}

#[derive(Default)]
pub struct MockGeocoder {
    known: HashMap<String, Coordinate>,
    reject_key: bool,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_store(mut self, name: &str, coordinate: Coordinate) -> Self {
        self.known.insert(name.to_string(), coordinate);
        self
    }

    /// Every lookup fails as if the key were revoked.
    pub fn rejecting() -> Self {
        Self {
            known: HashMap::new(),
            reject_key: true,
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn locate(&self, store_name: &str, _address: &str) -> kakao_client::Result<Option<Coordinate>> {
        if self.reject_key {
            return Err(KakaoError::Unauthorized {
                status: 401,
                message: "invalid key".into(),
            });
        }
        Ok(self.known.get(store_name).copied())
    }
}

pub fn daiso_store(code: &str, name: &str, address: &str, lat: f64, lng: f64) -> DaisoStore {
    DaisoStore {
        code: code.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        latitude: lat,
        longitude: lng,
    }
}

// ---------------------------------------------------------------------------
// MockLicenseSource
// ---------------------------------------------------------------------------

/// Unknown services return no rows.
#[derive(Default)]
pub struct MockLicenseSource {
    rows: HashMap<String, ServiceRows>,
}

impl MockLicenseSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_service(self, service: &str, rows: Vec<LicenseRow>) -> Self {
        self.on_partial_service(service, rows, 0)
    }

    /// Rows for a service as if `failed_ranges` pages could not be read.
    pub fn on_partial_service(mut self, service: &str, rows: Vec<LicenseRow>, failed_ranges: usize) -> Self {
        self.rows.insert(service.to_string(), ServiceRows { rows, failed_ranges });
        self
    }
}

#[async_trait]
impl LicenseSource for MockLicenseSource {
    async fn fetch_all(&self, service: &str) -> seoul_openapi_client::Result<ServiceRows> {
        Ok(self.rows.get(service).cloned().unwrap_or_default())
    }
}

/// An operating license row with no projected coordinate.
pub fn license_row(id: &str, name: &str, address: &str, business_type: &str) -> LicenseRow {
    LicenseRow {
        mgtno: Some(id.to_string()),
        bplcnm: Some(name.to_string()),
        trdstategbn: Some("01".to_string()),
        trdstatenm: Some("영업/정상".to_string()),
        rdnwhladdr: Some(address.to_string()),
        uptaenm: Some(business_type.to_string()),
        ..Default::default()
    }
}
