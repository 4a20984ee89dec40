//! Result accumulation for a batch.
//!
//! The collector is owned by the progress aggregator task, so results are
//! pushed from one place only and never need a lock.

use tokio::time::Instant;

use crate::types::{BatchReport, BatchSummary, CheckResult, DomainStatus};

/// Accumulates exactly one [`CheckResult`] per dispatched unit.
#[derive(Debug)]
pub struct ResultCollector {
    results: Vec<CheckResult>,
    expected: usize,
    started: Instant,
}

impl ResultCollector {
    pub fn new(expected: usize) -> Self {
        Self {
            results: Vec::with_capacity(expected),
            expected,
            started: Instant::now(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True once every expected unit has a result.
    pub fn is_complete(&self) -> bool {
        self.results.len() >= self.expected
    }

    /// Hand back the results in completion order with their summary.
    pub fn finish(self) -> BatchReport {
        let summary = BatchSummary::from_results(&self.results, self.started.elapsed());
        BatchReport {
            results: self.results,
            summary,
        }
    }
}

impl BatchSummary {
    /// Count statuses over a result set.
    pub fn from_results(results: &[CheckResult], elapsed: std::time::Duration) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            elapsed,
            ..Default::default()
        };
        for result in results {
            match result.status() {
                DomainStatus::Available => summary.available += 1,
                DomainStatus::NotAvailable => summary.not_available += 1,
                DomainStatus::Error => summary.errors += 1,
            }
        }
        summary
    }
}
