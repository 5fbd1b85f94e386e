//! One end-to-end run for a district: anchors, collection, references,
//! classification, persistence and export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use daiso_client::DaisoClient;
use kakao_client::{KakaoClient, CATEGORY_CONVENIENCE};
use seoul_openapi_client::SeoulOpenApiClient;
use storewatch_collector::{
    collect_anchors, load_csv_reference, load_license_reference, CoordTransform, CsvSchema,
    DistrictFilter, Epsg5174, FetchOptions, Geocoder, LicenseKind, LicenseSource, LoadedReference,
    PlaceSearch, RateLimitedFetcher, SearchCenter, StoreLocator,
};
use storewatch_common::{district_info, ClosureResult, Config, District, VerdictRow};
use storewatch_resolve::{
    cross_match, persist_results, write_csv, ClosureClassifier, CrossMatch, MatchedRow,
    Normalizer, ReferenceDataset, ResultSink, SUBJECT_LABEL,
};
use tracing::{info, warn};

use crate::summary::{brand_distribution, ReferenceSummary, RunSummary};

/// The network-facing collaborators of a run.
pub struct Sources {
    pub places: Arc<dyn PlaceSearch>,
    pub locator: Arc<dyn StoreLocator>,
    pub geocoder: Arc<dyn Geocoder>,
    /// `None` when no open-data key is configured.
    pub licenses: Option<Arc<dyn LicenseSource>>,
    pub transform: Arc<dyn CoordTransform>,
}

impl Sources {
    pub fn from_config(config: &Config) -> Result<Self> {
        let kakao = Arc::new(KakaoClient::with_options(
            &config.kakao_api_key,
            kakao_client::BASE_URL,
            config.request_timeout,
        )?);

        let licenses: Option<Arc<dyn LicenseSource>> = if config.seoul_openapi_key.is_empty() {
            warn!("SEOUL_OPENAPI_KEY not set, license references skipped");
            None
        } else {
            Some(Arc::new(SeoulOpenApiClient::new(&config.seoul_openapi_key)?))
        };

        Ok(Self {
            places: kakao.clone(),
            locator: Arc::new(DaisoClient::new()?),
            geocoder: kakao,
            licenses,
            transform: Arc::new(Epsg5174::new()),
        })
    }
}

pub async fn run(config: &Config, sources: &Sources, sink: Arc<dyn ResultSink>) -> Result<RunSummary> {
    let started_at = Utc::now();
    let district = district_info(&config.target_district)?;
    info!(district = district.name, "Run starting");

    // Anchors
    let (anchors, anchor_report) = collect_anchors(
        sources.locator.as_ref(),
        sources.geocoder.as_ref(),
        district.name,
    )
    .await?;
    let centers: Vec<SearchCenter> = anchors.iter().filter_map(SearchCenter::from_record).collect();
    if centers.is_empty() {
        warn!(district = district.name, "No anchor stores located, nothing to search around");
    }

    // Subjects
    let options = FetchOptions::builder()
        .max_concurrent(config.max_concurrent_requests)
        .settle_delay(config.request_delay)
        .request_timeout(config.request_timeout)
        .build();
    let fetcher = RateLimitedFetcher::new(sources.places.clone(), options);
    let subjects = fetcher
        .fetch_all(
            &centers,
            config.search_radius_km,
            CATEGORY_CONVENIENCE,
            &DistrictFilter::new(district.name),
        )
        .await?;

    // References
    let loaded = load_references(config, sources, district).await?;
    let references: Vec<ReferenceSummary> = loaded.iter().map(ReferenceSummary::from).collect();
    let datasets: Vec<ReferenceDataset> = loaded
        .into_iter()
        .map(|r| ReferenceDataset::new(r.label, r.records))
        .collect();

    // Classification
    let normalizer = Normalizer::new(district.name, config.coord_decimals);
    let classifier = ClosureClassifier::new(normalizer.clone(), config.match_policy);
    let classification = classifier.classify(&subjects, &datasets);

    let rows: Vec<VerdictRow> = classification.results.iter().map(ClosureResult::to_row).collect();
    let sink_report = persist_results(sink, classification.results).await?;
    write_csv(&config.output_csv, &rows)?;

    // Matched-stores report across the subject and every reference.
    let brands = brand_distribution(&subjects);
    let mut all = Vec::with_capacity(datasets.len() + 1);
    all.push(ReferenceDataset::new(SUBJECT_LABEL, subjects));
    all.extend(datasets);
    let matched: Vec<MatchedRow> = cross_match(&all, &normalizer, config.match_policy.secondary)
        .iter()
        .map(CrossMatch::to_row)
        .collect();
    let matched_csv = matched_path(&config.output_csv);
    write_csv(&matched_csv, &matched)?;

    Ok(RunSummary {
        district: district.name.to_string(),
        started_at,
        finished_at: Utc::now(),
        anchors: anchor_report,
        centers: centers.len(),
        collection: fetcher.stats(),
        references,
        classification: classification.summary,
        brands,
        sink: sink_report,
        matched: matched.len(),
        output_csv: config.output_csv.clone(),
        matched_csv,
    })
}

/// Every configured reference, in a fixed order: static CSV, restaurant
/// licenses, tobacco licenses.
async fn load_references(
    config: &Config,
    sources: &Sources,
    district: &District,
) -> Result<Vec<LoadedReference>> {
    let mut loaded = Vec::new();

    if let Some(path) = &config.public_data_csv {
        let reference = load_csv_reference(path, &CsvSchema::default())?;
        loaded.push(reference);
    }

    if let Some(licenses) = &sources.licenses {
        for kind in [LicenseKind::Restaurant, LicenseKind::Tobacco] {
            let reference = load_license_reference(
                licenses.as_ref(),
                district,
                kind,
                sources.transform.as_ref(),
            )
            .await
            .with_context(|| format!("loading {}", kind.label()))?;
            loaded.push(reference);
        }
    }

    if loaded.is_empty() {
        warn!("No reference datasets configured, every store will be classified as closed");
    }
    Ok(loaded)
}

/// `closure_results.csv` → `closure_results_matched.csv`.
fn matched_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "closure_results".to_string());
    output.with_file_name(format!("{stem}_matched.csv"))
}
