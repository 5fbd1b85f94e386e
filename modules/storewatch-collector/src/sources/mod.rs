//! Loaders for the reference datasets the classifier compares against.

pub mod static_csv;
pub mod license;
pub mod projection;

use std::fmt;

use storewatch_common::{OriginTag, StoreRecord};

/// Row accounting for one loaded dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Malformed rows: missing id, too few columns, unparsable numbers.
    pub skipped: usize,
    /// Well-formed rows outside the dataset's scope (wrong business type,
    /// closed license).
    pub filtered: usize,
    /// Source pages that could not be read; non-zero means a partial dataset.
    pub failed_ranges: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loaded, {} skipped, {} filtered",
            self.loaded, self.skipped, self.filtered
        )?;
        if self.failed_ranges > 0 {
            write!(f, ", {} ranges failed (partial)", self.failed_ranges)?;
        }
        Ok(())
    }
}

/// A reference dataset ready for indexing.
#[derive(Debug, Clone)]
pub struct LoadedReference {
    pub label: String,
    pub origin: OriginTag,
    pub records: Vec<StoreRecord>,
    pub report: LoadReport,
}
