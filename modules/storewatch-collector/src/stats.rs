use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Only the most recent failures are kept for reporting.
pub const MAX_RECORDED_ERRORS: usize = 10;

/// Counters shared by every in-flight request of a run. All mutation goes
/// through one lock; readers get an owned snapshot.
#[derive(Debug, Default)]
pub struct CollectionStats {
    inner: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    calls: u64,
    stored: u64,
    skipped: u64,
    error_count: u64,
    recent_errors: VecDeque<String>,
}

/// Point-in-time copy of [`CollectionStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub stored: u64,
    pub skipped: u64,
    pub error_count: u64,
    /// Up to [`MAX_RECORDED_ERRORS`] messages, oldest first.
    pub errors: Vec<String>,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Counters) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn record_call(&self) {
        self.with(|c| c.calls += 1);
    }

    pub fn record_stored(&self, n: usize) {
        self.with(|c| c.stored += n as u64);
    }

    pub fn record_skipped(&self, n: usize) {
        self.with(|c| c.skipped += n as u64);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.with(|c| {
            c.error_count += 1;
            if c.recent_errors.len() == MAX_RECORDED_ERRORS {
                c.recent_errors.pop_front();
            }
            c.recent_errors.push_back(message);
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.with(|c| StatsSnapshot {
            calls: c.calls,
            stored: c.stored,
            skipped: c.skipped,
            error_count: c.error_count,
            errors: c.recent_errors.iter().cloned().collect(),
        })
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API calls:          {}", self.calls)?;
        writeln!(f, "Stores collected:   {}", self.stored)?;
        writeln!(f, "Outside district:   {}", self.skipped)?;
        writeln!(f, "Request failures:   {}", self.error_count)?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}
