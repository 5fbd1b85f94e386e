//! Full runs against in-memory doubles for every network seam.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use storewatch::{run, Sources};
use storewatch_collector::testing::{
    daiso_store, license_row, place, MockGeocoder, MockLicenseSource, MockPlaceSearch,
    MockStoreLocator,
};
use storewatch_collector::{quadrants, Epsg5174};
use storewatch_common::{district_info, Brand, ClosureStatus, Config, Coordinate, MatchPolicy};
use storewatch_resolve::{MemorySink, ResultSink};

const ANCHOR: (f64, f64) = (37.5171, 126.9066);

fn csv_row(id: &str, name: &str, road_address: &str) -> String {
    let mut cols = vec![String::new(); 39];
    cols[0] = id.to_string();
    cols[1] = name.to_string();
    cols[31] = road_address.to_string();
    cols.join(",")
}

fn write_reference_csv(path: &Path) {
    let header = (0..39).map(|i| format!("col{i}")).collect::<Vec<_>>().join(",");
    let body = [
        header,
        csv_row("C1", "지에스25 문래점", "서울특별시 영등포구 문래로 5"),
        csv_row("C2", "폐점한 편의점", "서울특별시 영등포구 도림로 300"),
    ]
    .join("\n");
    std::fs::write(path, body).unwrap();
}

fn sources() -> Sources {
    let ne = quadrants(Coordinate::new(ANCHOR.0, ANCHOR.1), 1.8)[0].to_param();
    let places = MockPlaceSearch::new().on_page(
        &ne,
        1,
        vec![
            place("P1", "CU 당산점", "서울 영등포구 당산로 10", 37.5200, 126.9100),
            place("P2", "GS25 문래점", "서울 영등포구 문래로 5", 37.5180, 126.9080),
            place("P3", "세븐일레븐 영등포시장점", "서울 영등포구 영중로 50", 37.5190, 126.9120),
            place("P4", "CU 합정점", "서울 마포구 양화로 45", 37.5250, 126.9150),
        ],
        true,
    );

    let district = district_info("영등포구").unwrap();
    let licenses = MockLicenseSource::new().on_service(
        &district.restaurant_service(),
        vec![
            license_row("L1", "CU 당산점", "서울특별시 영등포구 당산로 99", "편의점"),
            license_row("L2", "김밥천국 당산", "서울특별시 영등포구 당산로 12", "분식"),
        ],
    );

    Sources {
        places: Arc::new(places),
        locator: Arc::new(MockStoreLocator::new(vec![daiso_store(
            "10234",
            "당산점",
            "서울특별시 영등포구 당산로 171",
            ANCHOR.0,
            ANCHOR.1,
        )])),
        geocoder: Arc::new(MockGeocoder::new()),
        licenses: Some(Arc::new(licenses)),
        transform: Arc::new(Epsg5174::new()),
    }
}

fn config(dir: &Path) -> Config {
    let csv_path = dir.join("reference.csv");
    write_reference_csv(&csv_path);
    Config {
        kakao_api_key: "test-key".into(),
        seoul_openapi_key: "test-key".into(),
        database_url: None,
        target_district: "영등포구".into(),
        coord_decimals: 4,
        search_radius_km: 1.8,
        max_concurrent_requests: 4,
        request_delay: Duration::ZERO,
        request_timeout: Duration::from_millis(500),
        public_data_csv: Some(csv_path),
        output_csv: dir.join("closure_results.csv"),
        match_policy: MatchPolicy::default(),
    }
}

#[tokio::test]
async fn run_classifies_subjects_against_every_reference() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let sink = Arc::new(MemorySink::new());

    let summary = run(&config, &sources(), sink.clone()).await.unwrap();

    assert_eq!(summary.centers, 1);
    assert_eq!(summary.collection.skipped, 1);
    assert_eq!(summary.classification.subjects, 3);
    assert_eq!(summary.classification.active, 2);
    assert_eq!(summary.classification.closed, 1);
    assert_eq!(summary.brands[&Brand::Cu], 1);
    assert_eq!(summary.brands[&Brand::SevenEleven], 1);

    let labels: Vec<_> = summary.references.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["public-data-csv", "restaurant-license", "tobacco-license"]);
    assert_eq!(summary.references[1].report.filtered, 1);

    assert_eq!(sink.len(), 3);
    assert_eq!(sink.get("P3").unwrap().verdict.status, ClosureStatus::Closed);
    assert_eq!(sink.get("P1").unwrap().verdict.status, ClosureStatus::Active);
    assert_eq!(sink.get("P2").unwrap().verdict.status, ClosureStatus::Active);

    let mut reader = csv::Reader::from_path(&config.output_csv).unwrap();
    let statuses: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[5].to_string())
        .collect();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses.iter().filter(|s| *s == "폐업").count(), 1);
    assert!(summary.matched_csv.exists());

    let printed = summary.to_string();
    assert!(printed.contains("영등포구"));
    assert!(printed.contains("Closed:           1"));
}

#[tokio::test]
async fn partial_license_reference_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let district = district_info("영등포구").unwrap();
    let mut sources = sources();
    sources.licenses = Some(Arc::new(MockLicenseSource::new().on_partial_service(
        &district.tobacco_service(),
        Vec::new(),
        1,
    )));

    let summary = run(&config, &sources, Arc::new(MemorySink::new())).await.unwrap();

    assert_eq!(summary.partial_references(), vec!["tobacco-license"]);
    assert_eq!(summary.references[2].report.failed_ranges, 1);
    assert!(summary.to_string().contains("Partial:          tobacco-license"));
}

#[tokio::test]
async fn rerun_updates_instead_of_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let sink = Arc::new(MemorySink::new());

    let first = run(&config, &sources(), sink.clone()).await.unwrap();
    let second = run(&config, &sources(), sink.clone()).await.unwrap();

    assert_eq!(first.sink.created, 3);
    assert_eq!(second.sink.created, 0);
    assert_eq!(second.sink.updated, 3);
    assert_eq!(sink.len(), 3);
    assert_eq!(sink.clear_district("영등포구").await.unwrap(), 3);
}

#[tokio::test]
async fn unknown_district_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.target_district = "해운대구".into();

    let err = run(&config, &sources(), Arc::new(MemorySink::new()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("해운대구"));
    assert!(!config.output_csv.exists());
}
