//! Collection behavior against a scripted map API.

use std::sync::Arc;
use std::time::Duration;

use kakao_client::{KakaoError, CATEGORY_CONVENIENCE};
use storewatch_collector::testing::{place, MockPlaceSearch};
use storewatch_collector::{
    quadrants, AcceptAll, CollectError, DistrictFilter, FetchOptions, RateLimitedFetcher,
    SearchCenter, MAX_PAGES,
};
use storewatch_common::Coordinate;

const RADIUS_KM: f64 = 1.8;

fn center() -> SearchCenter {
    SearchCenter::new("다이소 당산점", Coordinate::new(37.5171, 126.9066))
}

fn rect(i: usize) -> String {
    quadrants(center().coordinate, RADIUS_KM)[i].to_param()
}

fn fast_options() -> FetchOptions {
    FetchOptions::builder()
        .settle_delay(Duration::ZERO)
        .request_timeout(Duration::from_millis(200))
        .build()
}

fn fetcher(mock: Arc<MockPlaceSearch>, options: FetchOptions) -> RateLimitedFetcher {
    RateLimitedFetcher::new(mock, options)
}

fn docs(prefix: &str, n: usize) -> Vec<kakao_client::PlaceDocument> {
    (0..n)
        .map(|i| {
            place(
                &format!("{prefix}{i}"),
                &format!("CU {prefix}{i}"),
                "서울 영등포구 당산로 10",
                37.52,
                126.91,
            )
        })
        .collect()
}

#[tokio::test]
async fn same_place_from_two_quadrants_is_kept_once() {
    let shared = place("777", "GS25 당산역점", "서울 영등포구 당산로 10", 37.5171, 126.9066);
    let mock = Arc::new(
        MockPlaceSearch::new()
            .on_page(&rect(0), 1, vec![shared.clone()], true)
            .on_page(&rect(2), 1, vec![shared], true),
    );
    let f = fetcher(mock.clone(), fast_options());

    let records = f
        .fetch_all(&[center()], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_id, "777");
    assert_eq!(records[0].anchor.as_deref(), Some("다이소 당산점"));
    assert_eq!(f.stats().stored, 1);
    assert_eq!(f.stats().calls, 4);
}

#[tokio::test]
async fn timeout_keeps_earlier_pages() {
    let mock = Arc::new(
        MockPlaceSearch::new()
            .on_page(&rect(0), 1, docs("ne", 15), false)
            .on_hang(&rect(0), 2),
    );
    let f = fetcher(mock.clone(), fast_options());

    let records = f
        .fetch_all(&[center()], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    let stats = f.stats();
    assert_eq!(records.len(), 15);
    assert_eq!(stats.error_count, 1);
    assert!(stats.errors[0].contains("NE page 2"));
}

#[tokio::test]
async fn pagination_stops_at_page_cap() {
    let mut mock = MockPlaceSearch::new();
    for page in 1..=5 {
        mock = mock.on_page(&rect(1), page, docs(&format!("p{page}-"), 15), false);
    }
    let mock = Arc::new(mock);
    let f = fetcher(mock.clone(), fast_options());

    let records = f
        .fetch_all(&[center()], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    assert_eq!(records.len(), 15 * MAX_PAGES as usize);
    // Three pages for NW, one empty page for each other quadrant.
    assert_eq!(mock.calls(), MAX_PAGES as usize + 3);
}

#[tokio::test]
async fn client_error_ends_only_that_quadrant() {
    let mock = Arc::new(
        MockPlaceSearch::new()
            .on_error(
                &rect(0),
                1,
                KakaoError::Api {
                    status: 400,
                    message: "bad rect".into(),
                },
            )
            .on_page(&rect(3), 1, docs("se", 2), true),
    );
    let f = fetcher(mock, fast_options());

    let records = f
        .fetch_all(&[center()], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(f.stats().error_count, 1);
}

#[tokio::test]
async fn rejected_key_aborts_the_run() {
    let mock = Arc::new(MockPlaceSearch::new().on_error(
        &rect(1),
        1,
        KakaoError::Unauthorized {
            status: 401,
            message: "wrong appkey".into(),
        },
    ));
    let f = fetcher(mock, fast_options());

    let err = f
        .fetch_all(&[center()], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap_err();
    assert!(matches!(err, CollectError::Unauthorized(_)));
}

#[tokio::test]
async fn out_of_district_records_are_skipped_not_errors() {
    let mock = Arc::new(MockPlaceSearch::new().on_page(
        &rect(0),
        1,
        vec![
            place("1", "CU 당산", "서울 영등포구 당산로 10", 37.52, 126.91),
            place("2", "CU 합정", "서울 마포구 양화로 45", 37.55, 126.91),
            place("3", "GS25 문래", "서울 영등포구 문래로 5", 37.51, 126.89),
        ],
        true,
    ));
    let f = fetcher(mock, fast_options());

    let records = f
        .fetch_all(
            &[center()],
            RADIUS_KM,
            CATEGORY_CONVENIENCE,
            &DistrictFilter::new("영등포구"),
        )
        .await
        .unwrap();

    let stats = f.stats();
    assert_eq!(records.len(), 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.error_count, 0);
}

#[tokio::test]
async fn concurrency_stays_within_limit() {
    let centers: Vec<SearchCenter> = (0..6)
        .map(|i| SearchCenter::new(format!("c{i}"), Coordinate::new(37.50 + i as f64 * 0.01, 126.90)))
        .collect();
    let mock = Arc::new(MockPlaceSearch::new().with_latency(Duration::from_millis(20)));
    let options = FetchOptions::builder()
        .max_concurrent(3)
        .settle_delay(Duration::from_millis(5))
        .build();
    let f = fetcher(mock.clone(), options);

    f.fetch_all(&centers, RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    assert_eq!(mock.calls(), 24);
    assert!(mock.peak_concurrency() <= 3, "peak {}", mock.peak_concurrency());
}

#[tokio::test]
async fn records_across_centers_are_merged() {
    let first = center();
    let second = SearchCenter::new("다이소 영등포점", Coordinate::new(37.5200, 126.9050));
    let second_ne = quadrants(second.coordinate, RADIUS_KM)[0].to_param();

    let mock = Arc::new(
        MockPlaceSearch::new()
            .on_page(&rect(0), 1, vec![place("1", "CU", "서울 영등포구 당산로 10", 37.52, 126.91)], true)
            .on_page(
                &second_ne,
                1,
                vec![
                    place("1", "CU", "서울 영등포구 당산로 10", 37.52, 126.91),
                    place("2", "GS25", "서울 영등포구 영중로 9", 37.52, 126.90),
                ],
                true,
            ),
    );
    let f = fetcher(mock, fast_options());

    let records = f
        .fetch_all(&[first, second], RADIUS_KM, CATEGORY_CONVENIENCE, &AcceptAll)
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(records[0].anchor.as_deref(), Some("다이소 당산점"));
}
