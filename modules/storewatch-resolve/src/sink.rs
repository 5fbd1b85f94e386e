//! Verdict persistence contract and the single-writer funnel.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use storewatch_common::ClosureResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Whether an upsert inserted a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Keyed by subject id: writing the same id twice overwrites, never duplicates.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn upsert(&self, result: &ClosureResult) -> Result<UpsertOutcome>;

    /// Remove every stored verdict for a district. Returns rows removed.
    async fn clear_district(&self, district: &str) -> Result<u64>;
}

/// In-process sink for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<BTreeMap<String, ClosureResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, subject_id: &str) -> Option<ClosureResult> {
        self.rows.lock().ok()?.get(subject_id).cloned()
    }

    /// All stored results ordered by subject id.
    pub fn snapshot(&self) -> Vec<ClosureResult> {
        self.rows
            .lock()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn upsert(&self, result: &ClosureResult) -> Result<UpsertOutcome> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?;
        let outcome = match rows.insert(result.subject_id().to_string(), result.clone()) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        Ok(outcome)
    }

    async fn clear_district(&self, district: &str) -> Result<u64> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?;
        let before = rows.len();
        rows.retain(|_, r| r.district != district);
        Ok((before - rows.len()) as u64)
    }
}

/// Keep the first result per subject id, preserving order.
pub fn dedupe_results(results: impl IntoIterator<Item = ClosureResult>) -> Vec<ClosureResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.subject_id().to_string()))
        .collect()
}

/// Counts reported by the writer when its channel closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
}

/// Owns the sink; every write goes through this one task, so concurrent
/// producers never race on the same key.
pub struct SinkWriter {
    tx: mpsc::Sender<ClosureResult>,
    handle: JoinHandle<SinkReport>,
}

impl SinkWriter {
    pub fn spawn(sink: Arc<dyn ResultSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ClosureResult>(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut report = SinkReport::default();
            while let Some(result) = rx.recv().await {
                match sink.upsert(&result).await {
                    Ok(UpsertOutcome::Created) => report.created += 1,
                    Ok(UpsertOutcome::Updated) => report.updated += 1,
                    Err(e) => {
                        report.failed += 1;
                        warn!(id = result.subject_id(), error = %e, "Failed to store verdict");
                    }
                }
            }
            report
        });
        Self { tx, handle }
    }

    pub fn sender(&self) -> mpsc::Sender<ClosureResult> {
        self.tx.clone()
    }

    pub async fn send(&self, result: ClosureResult) -> Result<()> {
        self.tx
            .send(result)
            .await
            .map_err(|_| anyhow::anyhow!("sink writer stopped"))
    }

    /// Close the channel and wait for queued writes to drain.
    pub async fn finish(self) -> Result<SinkReport> {
        drop(self.tx);
        Ok(self.handle.await?)
    }
}

/// Dedupe and write a batch through a fresh writer.
pub async fn persist_results(sink: Arc<dyn ResultSink>, results: Vec<ClosureResult>) -> Result<SinkReport> {
    let writer = SinkWriter::spawn(sink, 64);
    for result in dedupe_results(results) {
        writer.send(result).await?;
    }
    let report = writer.finish().await?;
    info!(
        created = report.created,
        updated = report.updated,
        failed = report.failed,
        "Verdicts stored"
    );
    Ok(report)
}
