//! Progress aggregation.
//!
//! Workers never touch shared counters. Each completion is sent over a channel
//! to a single aggregator task, which bumps the global and per-worker counts,
//! stores the result, and only then publishes a [`ProgressEvent`]. Because one
//! task does all of this, the published overall fraction is non-decreasing and
//! always matches the result it is paired with.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::collector::ResultCollector;
use crate::concurrent::{SharedPartitions, WorkUnit};
use crate::types::{BatchReport, CheckResult, LookupOutcome, ProgressEvent};

/// Messages from the dispatcher side to the aggregator.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    /// A unit finished (successfully or not)
    Completed(CheckResult),

    /// A worker task ended abnormally; its unreported units must still resolve
    Aborted { worker_index: usize, reason: String },
}

/// Assignment and completion counts of one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerState {
    pub assigned: usize,
    pub completed: usize,
}

impl WorkerState {
    pub fn fraction(&self) -> f64 {
        if self.assigned == 0 {
            1.0
        } else {
            self.completed as f64 / self.assigned as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.assigned
    }
}

/// Owns every counter and the result collector for one batch.
#[derive(Debug)]
pub struct ProgressAggregator {
    workers: Vec<WorkerState>,
    /// The batch plan, read to synthesize results for aborted workers
    partitions: SharedPartitions,
    total: usize,
    completed: usize,
    collector: ResultCollector,
    sink: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressAggregator {
    pub fn new(partitions: SharedPartitions, sink: Option<UnboundedSender<ProgressEvent>>) -> Self {
        let workers: Vec<WorkerState> = partitions
            .iter()
            .map(|units| WorkerState {
                assigned: units.len(),
                completed: 0,
            })
            .collect();
        let total = workers.iter().map(|w| w.assigned).sum();

        Self {
            workers,
            partitions,
            total,
            completed: 0,
            collector: ResultCollector::new(total),
            sink,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Overall fraction, always recomputed from the counters.
    pub fn overall(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn worker(&self, worker_index: usize) -> Option<WorkerState> {
        self.workers.get(worker_index).copied()
    }

    /// Account for one completed unit and publish its event.
    pub fn record(&mut self, result: CheckResult) {
        let worker_index = result.worker_index;
        let Some(worker) = self.workers.get_mut(worker_index) else {
            tracing::warn!(worker_index, "completion from unknown worker dropped");
            return;
        };
        if worker.is_done() {
            tracing::warn!(
                worker_index,
                domain = %result.normalized_domain,
                "extra completion from finished worker dropped"
            );
            return;
        }

        worker.completed += 1;
        let worker_fraction = worker.fraction();
        self.completed += 1;
        let overall = self.overall();

        self.collector.push(result.clone());

        if let Some(sink) = &self.sink {
            // a closed receiver only means nobody is watching
            let _ = sink.send(ProgressEvent {
                result,
                overall,
                worker_fraction,
                worker_index,
            });
        }
    }

    /// Resolve every unit the worker never reported as an error result.
    pub fn abort_worker(&mut self, worker_index: usize, reason: &str) {
        let Some(state) = self.workers.get(worker_index).copied() else {
            tracing::warn!(worker_index, "abort for unknown worker ignored");
            return;
        };
        let partitions = SharedPartitions::clone(&self.partitions);
        let remaining: &[WorkUnit] = &partitions[worker_index][state.completed..];

        if !remaining.is_empty() {
            tracing::error!(
                worker_index,
                remaining = remaining.len(),
                reason,
                "worker aborted, synthesizing error results"
            );
        }

        for unit in remaining {
            let outcome = LookupOutcome::LookupFailed(format!(
                "Worker {} aborted before checking this domain: {}",
                worker_index, reason
            ));
            self.record(unit.to_result(outcome, worker_index));
        }
    }

    /// Drain worker messages until every sender is gone, then finish.
    pub(crate) async fn run(mut self, mut rx: UnboundedReceiver<WorkerMessage>) -> BatchReport {
        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Completed(result) => self.record(result),
                WorkerMessage::Aborted {
                    worker_index,
                    reason,
                } => self.abort_worker(worker_index, &reason),
            }
        }
        self.finish()
    }

    /// Close the batch. Any unit still unaccounted for becomes an error row.
    pub fn finish(mut self) -> BatchReport {
        for worker_index in 0..self.workers.len() {
            if !self.workers[worker_index].is_done() {
                self.abort_worker(worker_index, "worker exited without reporting");
            }
        }
        debug_assert!(self.collector.is_complete());
        self.collector.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn unit(name: &str) -> WorkUnit {
        WorkUnit {
            original_input: name.to_string(),
            normalized_domain: format!("{}.com", name),
        }
    }

    fn partitions() -> SharedPartitions {
        Arc::new(vec![vec![unit("a"), unit("c")], vec![unit("b")]])
    }

    #[test]
    fn test_record_publishes_after_increment() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let parts = partitions();
        let mut aggregator = ProgressAggregator::new(Arc::clone(&parts), Some(tx));
        assert_eq!(aggregator.total(), 3);

        aggregator.record(parts[0][0].to_result(LookupOutcome::Available, 0));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.worker_index, 0);
        assert!((event.overall - 1.0 / 3.0).abs() < f64::EPSILON);
        assert!((event.worker_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(aggregator.completed(), 1);
    }

    #[test]
    fn test_overall_is_monotonic_and_ends_at_one() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let parts = partitions();
        let mut aggregator = ProgressAggregator::new(Arc::clone(&parts), Some(tx));

        aggregator.record(parts[1][0].to_result(LookupOutcome::Registered, 1));
        aggregator.record(parts[0][0].to_result(LookupOutcome::Available, 0));
        aggregator.record(parts[0][1].to_result(LookupOutcome::Available, 0));

        let mut values = Vec::new();
        while let Ok(event) = rx.try_recv() {
            values.push(event.overall);
        }
        assert_eq!(values.len(), 3);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.iter().filter(|v| **v == 1.0).count(), 1);
        assert_eq!(*values.last().unwrap(), 1.0);
    }

    #[test]
    fn test_abort_synthesizes_remaining_units() {
        let parts = partitions();
        let mut aggregator = ProgressAggregator::new(Arc::clone(&parts), None);
        aggregator.record(parts[0][0].to_result(LookupOutcome::Available, 0));
        aggregator.abort_worker(0, "task panicked");

        let state = aggregator.worker(0).unwrap();
        assert!(state.is_done());

        let report = aggregator.finish();
        assert_eq!(report.results.len(), 3);
        let synthesized = report
            .results
            .iter()
            .find(|r| r.normalized_domain == "c.com")
            .unwrap();
        let reason = synthesized.outcome.error_message().unwrap();
        assert!(reason.contains("task panicked"));
    }

    #[test]
    fn test_duplicate_completion_is_dropped() {
        let parts = partitions();
        let mut aggregator = ProgressAggregator::new(Arc::clone(&parts), None);
        let result = parts[1][0].to_result(LookupOutcome::Available, 1);
        aggregator.record(result.clone());
        aggregator.record(result);
        assert_eq!(aggregator.completed(), 1);
    }

    #[test]
    fn test_closed_sink_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let parts = partitions();
        let mut aggregator = ProgressAggregator::new(Arc::clone(&parts), Some(tx));
        aggregator.record(parts[1][0].to_result(LookupOutcome::Available, 1));
        assert_eq!(aggregator.completed(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_channel_and_fills_gaps() {
        let (tx, rx) = mpsc::unbounded_channel();
        let parts = partitions();
        let aggregator = ProgressAggregator::new(Arc::clone(&parts), None);

        tx.send(WorkerMessage::Completed(
            parts[1][0].to_result(LookupOutcome::Registered, 1),
        ))
        .unwrap();
        drop(tx);

        let report = aggregator.run(rx).await;
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary.not_available, 1);
        assert_eq!(report.summary.errors, 2);
    }
}
