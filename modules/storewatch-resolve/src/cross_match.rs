//! Stores corroborated across all labelled datasets at once.

use std::collections::HashSet;

use serde::Serialize;
use storewatch_common::{Coordinate, MatchEvidence, MatchReason, SecondaryMatch};
use tracing::info;

use crate::index::{secondary_match_names, CrossSourceIndex, ReferenceDataset};
use crate::normalize::{CoordKey, Normalizer};

/// One matched store in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossMatch {
    pub dataset: String,
    pub source_id: String,
    pub name: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    pub name_key: String,
    pub address_key: String,
    pub evidence: MatchEvidence,
}

impl CrossMatch {
    pub fn reason_label(&self) -> String {
        self.evidence.label()
    }

    pub fn to_row(&self) -> MatchedRow {
        MatchedRow {
            dataset: self.dataset.clone(),
            id: self.source_id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            latitude: self.coordinate.map(|c| c.lat),
            longitude: self.coordinate.map(|c| c.lng),
            match_reason: self.reason_label(),
        }
    }
}

/// Flat export row for the matched-stores file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRow {
    pub dataset: String,
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub match_reason: String,
}

/// Keys shared by every dataset, plus two-hop names, matched over each
/// dataset's records in order.
///
/// A record is reported once per name key (first wins); the report is then
/// deduplicated by address key (first wins). Records without a name or
/// address key are not collapsed into each other.
pub fn cross_match(
    datasets: &[ReferenceDataset],
    normalizer: &Normalizer,
    secondary: SecondaryMatch,
) -> Vec<CrossMatch> {
    if datasets.is_empty() {
        return Vec::new();
    }

    let indices: Vec<CrossSourceIndex> = datasets
        .iter()
        .map(|d| CrossSourceIndex::from_dataset(d, normalizer))
        .collect();
    let refs: Vec<&CrossSourceIndex> = indices.iter().collect();

    let common_names = intersect(indices.iter().map(CrossSourceIndex::names));
    let common_addresses = intersect(indices.iter().map(CrossSourceIndex::addresses));
    let common_coords: HashSet<CoordKey> = intersect(indices.iter().map(CrossSourceIndex::coords));
    let secondary_names = secondary_match_names(&refs, secondary);

    info!(
        datasets = datasets.len(),
        names = common_names.len(),
        addresses = common_addresses.len(),
        coords = common_coords.len(),
        secondary = secondary_names.len(),
        "Common keys"
    );

    let mut seen_names = HashSet::new();
    let mut matched = Vec::new();
    for (dataset, index) in datasets.iter().zip(&indices) {
        for (record, keys) in dataset.records.iter().zip(index.key_sets()) {
            let mut evidence = MatchEvidence::new();
            if common_names.contains(&keys.name_key) {
                evidence.insert(MatchReason::Name);
            }
            if common_addresses.contains(&keys.address_key) {
                evidence.insert(MatchReason::Address);
            }
            if keys.coord_key.is_some_and(|c| common_coords.contains(&c)) {
                evidence.insert(MatchReason::Coord);
            }
            if evidence.is_empty() && secondary_names.contains(&keys.name_key) {
                evidence.insert(MatchReason::Transitive);
            }
            if evidence.is_empty() {
                continue;
            }
            if !keys.name_key.is_empty() && !seen_names.insert(keys.name_key.clone()) {
                continue;
            }
            matched.push(CrossMatch {
                dataset: dataset.label.clone(),
                source_id: record.source_id.clone(),
                name: record.name.clone().unwrap_or_default(),
                address: record.raw_address.clone().unwrap_or_default(),
                coordinate: record.coordinate,
                name_key: keys.name_key.clone(),
                address_key: keys.address_key.clone(),
                evidence,
            });
        }
    }

    let mut seen_addresses = HashSet::new();
    matched.retain(|m| m.address_key.is_empty() || seen_addresses.insert(m.address_key.clone()));
    matched
}

fn intersect<'a, T>(mut sets: impl Iterator<Item = &'a HashSet<T>>) -> HashSet<T>
where
    T: Eq + std::hash::Hash + Clone + 'a,
{
    let Some(first) = sets.next() else {
        return HashSet::new();
    };
    let mut common = first.clone();
    for set in sets {
        common.retain(|k| set.contains(k));
    }
    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use storewatch_common::{OriginTag, StoreRecord};

    fn rec(tag: OriginTag, id: &str, name: &str, address: &str, lat: f64, lng: f64) -> StoreRecord {
        StoreRecord::new(id, tag)
            .with_name(name)
            .with_address(address)
            .with_coordinate(lat, lng)
    }

    fn normalizer() -> Normalizer {
        Normalizer::new("영등포구", 4)
    }

    #[test]
    fn keys_must_be_common_to_every_dataset() {
        let datasets = vec![
            ReferenceDataset::new(
                "map",
                vec![
                    rec(OriginTag::MapApi, "m1", "CU 당산점", "서울 영등포구 당산로 10", 37.51, 126.90),
                    rec(OriginTag::MapApi, "m2", "GS25 문래", "서울 영등포구 문래로 5", 37.52, 126.89),
                ],
            ),
            ReferenceDataset::new(
                "csv",
                vec![rec(OriginTag::StaticCsv, "c1", "CU당산점", "서울 영등포구 선유로 1", 37.40, 126.80)],
            ),
            ReferenceDataset::new(
                "license",
                vec![rec(OriginTag::GovLicenseA, "l1", "cu 당산점", "서울 영등포구 양평로 3", 37.30, 126.70)],
            ),
        ];
        let report = cross_match(&datasets, &normalizer(), SecondaryMatch::NameOrCoord);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].source_id, "m1");
        assert_eq!(report[0].reason_label(), "이름");
        assert_eq!(report[0].to_row().latitude, Some(37.51));
    }

    #[test]
    fn report_is_deduplicated_by_address() {
        let datasets = vec![
            ReferenceDataset::new(
                "a",
                vec![
                    rec(OriginTag::MapApi, "a1", "CU 당산점", "서울 영등포구 당산로 10", 37.51, 126.90),
                    rec(OriginTag::MapApi, "a2", "CU 당산2호점", "서울특별시 영등포구 당산로 10", 37.52, 126.91),
                ],
            ),
            ReferenceDataset::new(
                "b",
                vec![rec(OriginTag::StaticCsv, "b1", "씨유", "영등포구 당산로 10", 37.40, 126.80)],
            ),
        ];
        let report = cross_match(&datasets, &normalizer(), SecondaryMatch::Off);
        let ids: Vec<_> = report.iter().map(|m| m.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
        assert!(report[0].evidence.contains(MatchReason::Address));
    }

    #[test]
    fn secondary_names_are_reported_without_direct_keys() {
        let datasets = vec![
            ReferenceDataset::new(
                "a",
                vec![rec(OriginTag::MapApi, "a1", "이마트24 양평", "서울 영등포구 양평로 3", 37.1, 126.1)],
            ),
            ReferenceDataset::new(
                "b",
                vec![rec(OriginTag::StaticCsv, "b1", "emart24", "서울 영등포구 양평로 3", 37.2, 126.2)],
            ),
            ReferenceDataset::new(
                "c",
                vec![rec(OriginTag::GovLicenseB, "c1", "이마트24 양평", "서울 영등포구 선유로 1", 37.3, 126.3)],
            ),
        ];
        let report = cross_match(&datasets, &normalizer(), SecondaryMatch::NameOnly);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].source_id, "a1");
        assert_eq!(report[0].reason_label(), "2차검증");
    }

    #[test]
    fn empty_input_yields_empty_report() {
        assert!(cross_match(&[], &normalizer(), SecondaryMatch::NameOrCoord).is_empty());
    }
}
