pub mod anchors;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod quadrant;
pub mod rate_limit;
pub mod sources;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use anchors::{collect_anchors, AnchorReport, Geocoder, StoreLocator};
pub use error::CollectError;
pub use fetcher::{FetchOptions, PlaceSearch, RateLimitedFetcher, SearchCenter, MAX_PAGES};
pub use filter::{AcceptAll, DistrictFilter, RecordFilter};
pub use quadrant::{quadrants, rect_contains, Quadrant};
pub use rate_limit::RateLimiter;
pub use sources::license::{load_license_reference, rows_to_records, LicenseKind, LicenseSource};
pub use sources::projection::{CoordTransform, Epsg5174};
pub use sources::static_csv::{load_csv_reference, parse_csv_reference, CsvSchema};
pub use sources::{LoadReport, LoadedReference};
pub use stats::{CollectionStats, StatsSnapshot};
