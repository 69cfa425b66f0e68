use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::ParseError;

/// A wrapper that forces the wrapped data onto its own cache line.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Per-line outcome counters (updated once per log line)
#[derive(Debug, Default)]
pub struct OutcomeMetrics {
    pub lines: AtomicU64,
    pub emitted: AtomicU64,
    pub skipped: AtomicU64,
}

/// Failure counters by kind
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub malformed: AtomicU64,
    pub too_large: AtomicU64,
    pub non_utf8: AtomicU64,
}

/// Counters for one run over a line stream.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not transactional
/// across fields.
#[derive(Debug, Default)]
pub struct ParseStats {
    pub outcomes: CacheAligned<OutcomeMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_emitted(&self) {
        self.outcomes.0.lines.fetch_add(1, Ordering::Relaxed);
        self.outcomes.0.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Recognised but deliberately excluded, or empty
    #[inline]
    pub fn record_skipped(&self) {
        self.outcomes.0.lines.fetch_add(1, Ordering::Relaxed);
        self.outcomes.0.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error: &ParseError) {
        self.outcomes.0.lines.fetch_add(1, Ordering::Relaxed);
        let counter = match error {
            ParseError::LineTooLarge(..) => &self.errors.0.too_large,
            ParseError::NonUtf8 => &self.errors.0.non_utf8,
            _ => &self.errors.0.malformed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let lines = self.outcomes.0.lines.load(Ordering::Relaxed);
        let emitted = self.outcomes.0.emitted.load(Ordering::Relaxed);
        let malformed = self.errors.0.malformed.load(Ordering::Relaxed);
        let too_large = self.errors.0.too_large.load(Ordering::Relaxed);
        let non_utf8 = self.errors.0.non_utf8.load(Ordering::Relaxed);
        let failed = malformed + too_large + non_utf8;

        StatsSnapshot {
            lines,
            emitted,
            skipped: self.outcomes.0.skipped.load(Ordering::Relaxed),
            failed,
            malformed,
            too_large,
            non_utf8,
            failure_rate: if lines > 0 {
                failed as f64 / lines as f64
            } else {
                0.0
            },
        }
    }
}

/// A read-only snapshot of [`ParseStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub lines: u64,
    pub emitted: u64,
    pub skipped: u64,
    pub failed: u64,
    pub malformed: u64,
    pub too_large: u64,
    pub non_utf8: u64,
    pub failure_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_empty() {
        let snap = ParseStats::new().snapshot();
        assert_eq!(snap.lines, 0);
        assert_eq!(snap.failed, 0);
        assert_eq!(snap.failure_rate, 0.0);
    }

    #[test]
    fn test_outcomes_add_up() {
        let stats = ParseStats::new();
        stats.record_emitted();
        stats.record_emitted();
        stats.record_skipped();
        stats.record_error(&ParseError::Duration("x".into()));

        let snap = stats.snapshot();
        assert_eq!(snap.lines, 4);
        assert_eq!(snap.emitted, 2);
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.failure_rate, 0.25);
    }

    #[test]
    fn test_errors_grouped_by_kind() {
        let stats = ParseStats::new();
        stats.record_error(&ParseError::NonUtf8);
        stats.record_error(&ParseError::LineTooLarge(10, 5));
        stats.record_error(&ParseError::FieldCount { expected: "7", found: 1 });
        stats.record_error(&ParseError::Timestamp("x".into()));

        let snap = stats.snapshot();
        assert_eq!(snap.non_utf8, 1);
        assert_eq!(snap.too_large, 1);
        assert_eq!(snap.malformed, 2);
        assert_eq!(snap.failed, 4);
    }
}
