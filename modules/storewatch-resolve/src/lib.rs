pub mod classify;
pub mod cross_match;
pub mod export;
pub mod index;
pub mod normalize;
pub mod pg;
pub mod sink;

pub use classify::{Classification, ClassificationSummary, ClosureClassifier, SUBJECT_LABEL};
pub use cross_match::{cross_match, CrossMatch, MatchedRow};
pub use export::write_csv;
pub use index::{secondary_match_names, CrossSourceIndex, ReferenceDataset};
pub use normalize::{
    coord_key, normalize_address, normalize_name, parse_coord, round_coord, CoordKey,
    NormalizedKeySet, Normalizer,
};
pub use pg::PgResultSink;
pub use sink::{dedupe_results, persist_results, MemorySink, ResultSink, SinkReport, SinkWriter, UpsertOutcome};
