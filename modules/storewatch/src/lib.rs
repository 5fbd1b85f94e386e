pub mod pipeline;
pub mod summary;

pub use pipeline::{run, Sources};
pub use summary::{brand_distribution, ReferenceSummary, RunSummary};
