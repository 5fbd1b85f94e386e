use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use storewatch_collector::{AnchorReport, LoadReport, LoadedReference, StatsSnapshot};
use storewatch_common::{Brand, StoreRecord};
use storewatch_resolve::{ClassificationSummary, SinkReport};

/// Row accounting for one reference dataset of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSummary {
    pub label: String,
    pub report: LoadReport,
}

impl From<&LoadedReference> for ReferenceSummary {
    fn from(reference: &LoadedReference) -> Self {
        Self {
            label: reference.label.clone(),
            report: reference.report,
        }
    }
}

/// Everything a run did, printed at the end.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub district: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub anchors: AnchorReport,
    pub centers: usize,
    pub collection: StatsSnapshot,
    pub references: Vec<ReferenceSummary>,
    pub classification: ClassificationSummary,
    pub brands: BTreeMap<Brand, usize>,
    pub sink: SinkReport,
    pub matched: usize,
    pub output_csv: PathBuf,
    pub matched_csv: PathBuf,
}

impl RunSummary {
    /// Labels of references with pages that could not be read.
    pub fn partial_references(&self) -> Vec<&str> {
        self.references
            .iter()
            .filter(|r| r.report.failed_ranges > 0)
            .map(|r| r.label.as_str())
            .collect()
    }
}

/// Subject count per chain, every chain listed even when zero.
pub fn brand_distribution(subjects: &[StoreRecord]) -> BTreeMap<Brand, usize> {
    let mut counts: BTreeMap<Brand, usize> = Brand::ALL.iter().map(|b| (*b, 0)).collect();
    for record in subjects {
        let brand = Brand::of(record.name.as_deref().unwrap_or_default());
        *counts.entry(brand).or_default() += 1;
    }
    counts
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;

        writeln!(f, "\n=== Storewatch Run Complete: {} ===", self.district)?;
        writeln!(
            f,
            "Started:            {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Elapsed:            {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;

        writeln!(f, "\nAnchors:")?;
        writeln!(f, "  Found:            {}", self.anchors.found)?;
        writeln!(f, "  Outside city:     {}", self.anchors.outside_city)?;
        writeln!(f, "  Backfilled:       {}", self.anchors.backfilled)?;
        writeln!(f, "  Unlocated:        {}", self.anchors.unlocated)?;
        writeln!(f, "  Search centers:   {}", self.centers)?;

        writeln!(f, "\nCollection:")?;
        write!(f, "{}", self.collection)?;

        writeln!(f, "\nBy brand:")?;
        for (brand, count) in &self.brands {
            writeln!(f, "  {:<10} {count}", brand.label())?;
        }

        writeln!(f, "\nReferences:")?;
        if self.references.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for reference in &self.references {
            writeln!(f, "  {:<20} {}", reference.label, reference.report)?;
        }
        let partial = self.partial_references();
        if !partial.is_empty() {
            writeln!(f, "  Partial:          {}", partial.join(", "))?;
        }

        let c = &self.classification;
        writeln!(f, "\nVerdicts:")?;
        writeln!(f, "  Subjects:         {}", c.subjects)?;
        writeln!(f, "  Active:           {}", c.active)?;
        writeln!(f, "  Closed:           {}", c.closed)?;
        writeln!(f, "  Two-hop names:    {}", c.secondary_names)?;
        for (reason, count) in &c.by_reason {
            writeln!(f, "  By {:<8}        {count}", reason.label())?;
        }

        writeln!(f, "\nOutput:")?;
        writeln!(
            f,
            "  Stored:           {} new, {} updated, {} failed",
            self.sink.created, self.sink.updated, self.sink.failed
        )?;
        writeln!(f, "  Verdicts CSV:     {}", self.output_csv.display())?;
        writeln!(
            f,
            "  Matched CSV:      {} ({} stores)",
            self.matched_csv.display(),
            self.matched
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storewatch_common::OriginTag;

    fn named(id: &str, name: &str) -> StoreRecord {
        StoreRecord::new(id, OriginTag::MapApi).with_name(name)
    }

    #[test]
    fn brands_are_counted_with_zero_rows_kept() {
        let subjects = vec![
            named("1", "CU 당산점"),
            named("2", "GS25 영등포역점"),
            named("3", "CU 문래점"),
            named("4", "동네슈퍼"),
        ];
        let counts = brand_distribution(&subjects);
        assert_eq!(counts[&Brand::Cu], 2);
        assert_eq!(counts[&Brand::Gs25], 1);
        assert_eq!(counts[&Brand::Other], 1);
        assert_eq!(counts[&Brand::Ministop], 0);
        assert_eq!(counts.len(), Brand::ALL.len());
    }
}
