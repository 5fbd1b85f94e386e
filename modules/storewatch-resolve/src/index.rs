use std::collections::{HashMap, HashSet};

use storewatch_common::{SecondaryMatch, StoreRecord};

use crate::normalize::{CoordKey, NormalizedKeySet, Normalizer};

/// One named input dataset: a reference source or the subject set.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    pub label: String,
    pub records: Vec<StoreRecord>,
}

impl ReferenceDataset {
    pub fn new(label: impl Into<String>, records: Vec<StoreRecord>) -> Self {
        Self {
            label: label.into(),
            records,
        }
    }
}

/// Key sets of a single dataset, built once and queried by membership only.
///
/// Empty name/address keys and missing coordinate keys are never inserted.
#[derive(Debug, Default)]
pub struct CrossSourceIndex {
    label: String,
    keys: Vec<NormalizedKeySet>,
    names: HashSet<String>,
    addresses: HashSet<String>,
    coords: HashSet<CoordKey>,
    by_address: HashMap<String, Vec<usize>>,
}

impl CrossSourceIndex {
    pub fn build(label: impl Into<String>, records: &[StoreRecord], normalizer: &Normalizer) -> Self {
        let mut index = Self {
            label: label.into(),
            ..Default::default()
        };
        for record in records {
            index.insert(normalizer.keys(record));
        }
        index
    }

    pub fn from_dataset(dataset: &ReferenceDataset, normalizer: &Normalizer) -> Self {
        Self::build(dataset.label.clone(), &dataset.records, normalizer)
    }

    fn insert(&mut self, keys: NormalizedKeySet) {
        let position = self.keys.len();
        if !keys.name_key.is_empty() {
            self.names.insert(keys.name_key.clone());
        }
        if !keys.address_key.is_empty() {
            self.addresses.insert(keys.address_key.clone());
            self.by_address
                .entry(keys.address_key.clone())
                .or_default()
                .push(position);
        }
        if let Some(coord) = keys.coord_key {
            self.coords.insert(coord);
        }
        self.keys.push(keys);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_name(&self, name_key: &str) -> bool {
        !name_key.is_empty() && self.names.contains(name_key)
    }

    pub fn contains_address(&self, address_key: &str) -> bool {
        !address_key.is_empty() && self.addresses.contains(address_key)
    }

    pub fn contains_coord(&self, coord_key: Option<CoordKey>) -> bool {
        coord_key.is_some_and(|c| self.coords.contains(&c))
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    pub fn addresses(&self) -> &HashSet<String> {
        &self.addresses
    }

    pub fn coords(&self) -> &HashSet<CoordKey> {
        &self.coords
    }

    /// Key sets of every record whose address key equals `address_key`.
    pub fn records_at<'a>(&'a self, address_key: &str) -> impl Iterator<Item = &'a NormalizedKeySet> + 'a {
        self.by_address
            .get(address_key)
            .into_iter()
            .flatten()
            .map(|&i| &self.keys[i])
    }

    pub fn key_sets(&self) -> &[NormalizedKeySet] {
        &self.keys
    }

    /// Short human summary used in run logs.
    pub fn describe(&self) -> String {
        format!(
            "{}: {} records, {} names, {} addresses, {} coords",
            self.label,
            self.keys.len(),
            self.names.len(),
            self.addresses.len(),
            self.coords.len()
        )
    }
}

/// Name keys corroborated through a shared address.
///
/// For every pair of datasets sharing an address key, a record at that
/// address (from either side) whose name key, or coordinate key when the
/// policy allows, also appears in some third dataset contributes its name key.
pub fn secondary_match_names(indices: &[&CrossSourceIndex], policy: SecondaryMatch) -> HashSet<String> {
    let mut names = HashSet::new();
    if policy == SecondaryMatch::Off {
        return names;
    }

    for i in 0..indices.len() {
        for j in (i + 1)..indices.len() {
            let (a, b) = (indices[i], indices[j]);
            let (smaller, larger) = if a.addresses.len() <= b.addresses.len() {
                (a, b)
            } else {
                (b, a)
            };
            for address in smaller.addresses.iter().filter(|k| larger.addresses.contains(*k)) {
                for keys in a.records_at(address).chain(b.records_at(address)) {
                    if keys.name_key.is_empty() || names.contains(&keys.name_key) {
                        continue;
                    }
                    let corroborated = indices
                        .iter()
                        .enumerate()
                        .filter(|(k, _)| *k != i && *k != j)
                        .any(|(_, third)| {
                            third.contains_name(&keys.name_key)
                                || (policy == SecondaryMatch::NameOrCoord
                                    && third.contains_coord(keys.coord_key))
                        });
                    if corroborated {
                        names.insert(keys.name_key.clone());
                    }
                }
            }
        }
    }
    names
}
