//! Closure classification of subject records against reference datasets.

use std::collections::{BTreeMap, HashSet};

use storewatch_common::{
    ClosureResult, ClosureStatus, ClosureVerdict, DirectMatchMode, MatchEvidence, MatchPolicy,
    MatchReason, StoreRecord,
};
use tracing::{debug, info};

use crate::index::{secondary_match_names, CrossSourceIndex, ReferenceDataset};
use crate::normalize::{NormalizedKeySet, Normalizer};

/// Label under which the subject set joins secondary matching.
pub const SUBJECT_LABEL: &str = "subject";

/// Pure classifier: the same subject and reference snapshots always produce
/// the same verdicts.
#[derive(Debug, Clone)]
pub struct ClosureClassifier {
    normalizer: Normalizer,
    policy: MatchPolicy,
}

/// Classifier output: one result per subject record, in subject order.
#[derive(Debug, Clone)]
pub struct Classification {
    pub results: Vec<ClosureResult>,
    pub summary: ClassificationSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub subjects: usize,
    pub active: usize,
    pub closed: usize,
    pub secondary_names: usize,
    /// Subject count per evidence reason (a subject can count under several).
    pub by_reason: BTreeMap<MatchReason, usize>,
    /// `describe()` line of each reference index.
    pub references: Vec<String>,
}

impl ClosureClassifier {
    pub fn new(normalizer: Normalizer, policy: MatchPolicy) -> Self {
        Self { normalizer, policy }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn classify(&self, subjects: &[StoreRecord], references: &[ReferenceDataset]) -> Classification {
        let indices: Vec<CrossSourceIndex> = references
            .iter()
            .map(|r| CrossSourceIndex::from_dataset(r, &self.normalizer))
            .collect();
        let subject_index = CrossSourceIndex::build(SUBJECT_LABEL, subjects, &self.normalizer);

        let mut participants: Vec<&CrossSourceIndex> = indices.iter().collect();
        participants.push(&subject_index);
        let secondary = secondary_match_names(&participants, self.policy.secondary);

        let mut summary = ClassificationSummary {
            subjects: subjects.len(),
            secondary_names: secondary.len(),
            references: indices.iter().map(CrossSourceIndex::describe).collect(),
            ..Default::default()
        };

        let results = subjects
            .iter()
            .zip(subject_index.key_sets())
            .map(|(record, keys)| {
                let evidence = self.evidence(keys, &indices, &secondary);
                for reason in evidence.iter() {
                    *summary.by_reason.entry(reason).or_default() += 1;
                }
                let verdict = ClosureVerdict::from_evidence(record.source_id.clone(), evidence);
                match verdict.status {
                    ClosureStatus::Active => summary.active += 1,
                    ClosureStatus::Closed => summary.closed += 1,
                }
                debug!(
                    id = %record.source_id,
                    status = verdict.status.label(),
                    reason = %verdict.evidence.label(),
                    "Classified"
                );
                ClosureResult::new(record, verdict, &self.normalizer.district_hint)
            })
            .collect();

        info!(
            subjects = summary.subjects,
            active = summary.active,
            closed = summary.closed,
            secondary_names = summary.secondary_names,
            "Classification complete"
        );

        Classification { results, summary }
    }

    /// Direct evidence first; the transitive reason is only consulted when
    /// no direct key matched.
    pub fn evidence(
        &self,
        keys: &NormalizedKeySet,
        references: &[CrossSourceIndex],
        secondary: &HashSet<String>,
    ) -> MatchEvidence {
        let mut evidence = MatchEvidence::new();
        if self.direct(references, |i| i.contains_name(&keys.name_key)) {
            evidence.insert(MatchReason::Name);
        }
        if self.direct(references, |i| i.contains_address(&keys.address_key)) {
            evidence.insert(MatchReason::Address);
        }
        if self.direct(references, |i| i.contains_coord(keys.coord_key)) {
            evidence.insert(MatchReason::Coord);
        }
        if evidence.is_empty() && !keys.name_key.is_empty() && secondary.contains(&keys.name_key) {
            evidence.insert(MatchReason::Transitive);
        }
        evidence
    }

    fn direct(&self, references: &[CrossSourceIndex], hit: impl Fn(&CrossSourceIndex) -> bool) -> bool {
        if references.is_empty() {
            return false;
        }
        match self.policy.direct {
            DirectMatchMode::Any => references.iter().any(hit),
            DirectMatchMode::All => references.iter().all(hit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storewatch_common::{OriginTag, SecondaryMatch};

    const GU: &str = "영등포구";

    fn subject(id: &str, name: &str, address: &str, lat: f64, lng: f64) -> StoreRecord {
        StoreRecord::new(id, OriginTag::MapApi)
            .with_name(name)
            .with_address(address)
            .with_coordinate(lat, lng)
    }

    fn reference(id: &str, name: &str, address: &str, lat: f64, lng: f64) -> StoreRecord {
        StoreRecord::new(id, OriginTag::StaticCsv)
            .with_name(name)
            .with_address(address)
            .with_coordinate(lat, lng)
    }

    fn classifier(direct: DirectMatchMode) -> ClosureClassifier {
        ClosureClassifier::new(
            Normalizer::new(GU, 4),
            MatchPolicy {
                direct,
                secondary: SecondaryMatch::NameOrCoord,
            },
        )
    }

    fn only(classification: &Classification) -> &ClosureResult {
        assert_eq!(classification.results.len(), 1);
        &classification.results[0]
    }

    #[test]
    fn name_match_is_active() {
        let subjects = vec![subject("s1", "ABC Mart", "서울 영등포구 당산로 10", 37.5171, 126.9066)];
        let refs = vec![ReferenceDataset::new(
            "csv",
            vec![reference("r1", "abc-mart", "서울 영등포구 다른로 99", 37.0, 127.0)],
        )];
        let out = classifier(DirectMatchMode::Any).classify(&subjects, &refs);
        let result = only(&out);
        assert_eq!(result.verdict.status, ClosureStatus::Active);
        assert!(result.verdict.evidence.contains(MatchReason::Name));
        assert!(!result.verdict.evidence.contains(MatchReason::Address));
    }

    #[test]
    fn address_match_with_different_name() {
        let subjects = vec![subject("s1", "GS25 당산점", "서울특별시 영등포구 당산로 10", 37.5171, 126.9066)];
        let refs = vec![ReferenceDataset::new(
            "license",
            vec![reference("r1", "지에스25 당산", "서울 영등포구 당산로 10 (당산동)", 37.0, 127.0)],
        )];
        let out = classifier(DirectMatchMode::Any).classify(&subjects, &refs);
        let result = only(&out);
        assert_eq!(result.verdict.status, ClosureStatus::Active);
        assert!(result.verdict.evidence.contains(MatchReason::Address));
        assert!(!result.verdict.evidence.contains(MatchReason::Name));
        assert_eq!(result.to_row().match_reason, "주소");
    }

    #[test]
    fn two_hop_match_is_transitive_only() {
        // A's record at the shared address carries the subject's name; B has
        // the same address under another name. Under corroborated matching no
        // key is present in both references, so only the two-hop rule fires.
        let subjects = vec![subject("s1", "CU 당산점", "서울 영등포구 당산로 10", 37.5171, 126.9066)];
        let refs = vec![
            ReferenceDataset::new(
                "a",
                vec![reference("a1", "CU 당산점", "서울 영등포구 양평로 3", 37.1, 126.1)],
            ),
            ReferenceDataset::new(
                "b",
                vec![reference("b1", "씨유 당산", "영등포구 양평로 3", 37.2, 126.2)],
            ),
        ];
        let out = classifier(DirectMatchMode::All).classify(&subjects, &refs);
        let result = only(&out);
        assert_eq!(result.verdict.status, ClosureStatus::Active);
        assert_eq!(
            result.verdict.evidence,
            [MatchReason::Transitive].into_iter().collect::<MatchEvidence>()
        );
        assert_eq!(result.to_row().match_reason, "2차검증");
    }

    #[test]
    fn transitive_is_suppressed_when_direct_evidence_exists() {
        let subjects = vec![subject("s1", "CU 당산점", "서울 영등포구 당산로 10", 37.5171, 126.9066)];
        let refs = vec![
            ReferenceDataset::new("a", vec![reference("a1", "CU 당산점", "서울 영등포구 양평로 3", 37.1, 126.1)]),
            ReferenceDataset::new("b", vec![reference("b1", "씨유 당산", "영등포구 양평로 3", 37.2, 126.2)]),
        ];
        let out = classifier(DirectMatchMode::Any).classify(&subjects, &refs);
        let result = only(&out);
        assert_eq!(
            result.verdict.evidence,
            [MatchReason::Name].into_iter().collect::<MatchEvidence>()
        );
    }

    #[test]
    fn secondary_off_leaves_two_hop_subject_closed() {
        let subjects = vec![subject("s1", "CU 당산점", "서울 영등포구 당산로 10", 37.5171, 126.9066)];
        let refs = vec![
            ReferenceDataset::new("a", vec![reference("a1", "CU 당산점", "서울 영등포구 양평로 3", 37.1, 126.1)]),
            ReferenceDataset::new("b", vec![reference("b1", "씨유 당산", "영등포구 양평로 3", 37.2, 126.2)]),
        ];
        let classifier = ClosureClassifier::new(
            Normalizer::new(GU, 4),
            MatchPolicy {
                direct: DirectMatchMode::All,
                secondary: SecondaryMatch::Off,
            },
        );
        let out = classifier.classify(&subjects, &refs);
        assert_eq!(only(&out).verdict.status, ClosureStatus::Closed);
    }

    #[test]
    fn no_match_is_closed_with_empty_evidence() {
        let subjects = vec![subject("s1", "미니스톱 문래점", "서울 영등포구 문래로 5", 37.5171, 126.9066)];
        let refs = vec![
            ReferenceDataset::new("a", vec![reference("a1", "CU 당산점", "서울 영등포구 양평로 3", 37.1, 126.1)]),
            ReferenceDataset::new("b", vec![reference("b1", "GS25 여의도", "서울 영등포구 여의대로 24", 37.2, 126.2)]),
        ];
        let out = classifier(DirectMatchMode::Any).classify(&subjects, &refs);
        let result = only(&out);
        assert_eq!(result.verdict.status, ClosureStatus::Closed);
        assert!(result.verdict.evidence.is_empty());
        let row = result.to_row();
        assert_eq!(row.status, "폐업");
        assert_eq!(row.match_reason, "없음");
        assert_eq!(out.summary.closed, 1);
    }

    #[test]
    fn empty_keys_never_match_each_other() {
        let subjects = vec![StoreRecord::new("s1", OriginTag::MapApi)];
        let refs = vec![ReferenceDataset::new(
            "csv",
            vec![StoreRecord::new("r1", OriginTag::StaticCsv).with_name("").with_address("nan")],
        )];
        let out = classifier(DirectMatchMode::Any).classify(&subjects, &refs);
        assert_eq!(only(&out).verdict.status, ClosureStatus::Closed);
    }

    #[test]
    fn no_references_means_everything_closed() {
        let subjects = vec![subject("s1", "CU", "서울 영등포구 당산로 10", 37.5, 126.9)];
        for mode in [DirectMatchMode::Any, DirectMatchMode::All] {
            let out = classifier(mode).classify(&subjects, &[]);
            assert_eq!(only(&out).verdict.status, ClosureStatus::Closed);
        }
    }

    #[test]
    fn direct_matching_is_asymmetric() {
        // Every map record is corroborated by the license set, but swapping
        // roles leaves the license set's extra store unmatched.
        let map = vec![StoreRecord::new("m1", OriginTag::MapApi)
            .with_name("세븐일레븐 영등포점")
            .with_coordinate(37.5171, 126.9066)];
        let license = vec![reference("l1", "코리아세븐", "서울 영등포구 영중로 9", 37.51712, 126.90661)];

        let c = classifier(DirectMatchMode::Any);
        let forward = c.classify(&map, &[ReferenceDataset::new("license", license.clone())]);
        assert_eq!(
            only(&forward).verdict.evidence,
            [MatchReason::Coord].into_iter().collect::<MatchEvidence>()
        );

        let extra = reference("l2", "GS25 당산", "서울 영등포구 당산로 10", 37.6, 126.8);
        let reverse = c.classify(
            &[license[0].clone(), extra],
            &[ReferenceDataset::new("map", map)],
        );
        assert_eq!(reverse.results[0].verdict.status, ClosureStatus::Active);
        assert_eq!(reverse.results[1].verdict.status, ClosureStatus::Closed);
    }

    #[test]
    fn rerun_is_stable() {
        let subjects = vec![
            subject("s1", "ABC Mart", "서울 영등포구 당산로 10", 37.5171, 126.9066),
            subject("s2", "CU 문래점", "서울 영등포구 문래로 5", 37.5, 126.8),
            subject("s3", "GS25", "", 37.3, 126.7),
        ];
        let refs = vec![
            ReferenceDataset::new("a", vec![reference("a1", "ABC Mart", "서울 영등포구 당산로 10", 37.5171, 126.9066)]),
            ReferenceDataset::new("b", vec![reference("b1", "GS25", "서울 영등포구 양평로 3", 37.3, 126.7)]),
        ];
        let c = classifier(DirectMatchMode::Any);
        let first = c.classify(&subjects, &refs);
        let second = c.classify(&subjects, &refs);
        assert_eq!(first.results, second.results);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.summary.active, 2);
        assert_eq!(first.summary.closed, 1);
    }
}
