//! Worker pool: partitioning, per-worker sequential loops, and panic isolation.
//!
//! Concurrency exists across workers only. Inside one partition every unit
//! runs strictly in order: acquire the shared limiter, look the domain up,
//! report the result.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::limiter::RateLimiter;
use crate::lookup::LookupAdapter;
use crate::progress::WorkerMessage;
use crate::types::{CheckResult, LookupOutcome};
use crate::utils::normalize_domain;

/// Reason attached to units skipped because the batch deadline passed.
pub const DEADLINE_EXCEEDED: &str = "Batch deadline exceeded before lookup";

/// One domain's pending check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkUnit {
    pub original_input: String,
    pub normalized_domain: String,
}

impl WorkUnit {
    pub fn to_result(&self, outcome: LookupOutcome, worker_index: usize) -> CheckResult {
        CheckResult {
            original_input: self.original_input.clone(),
            normalized_domain: self.normalized_domain.clone(),
            outcome,
            worker_index,
        }
    }
}

/// Cleaned and partitioned input for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    /// `partitions[i]` holds the units of worker `i`, in encounter order
    pub partitions: Vec<Vec<WorkUnit>>,
}

impl BatchPlan {
    /// Clean `domains` and deal them round-robin over `worker_count` partitions.
    ///
    /// The i-th non-empty token goes to partition `i % worker_count`.
    /// Empty and whitespace-only tokens are dropped. Duplicates are kept.
    pub fn build(domains: &[String], worker_count: usize, suffix: &str) -> Self {
        let worker_count = worker_count.max(1);
        let mut partitions: Vec<Vec<WorkUnit>> = vec![Vec::new(); worker_count];

        let units = domains.iter().filter_map(|raw| {
            normalize_domain(raw, suffix).map(|normalized_domain| WorkUnit {
                original_input: raw.clone(),
                normalized_domain,
            })
        });

        for (i, unit) in units.enumerate() {
            partitions[i % worker_count].push(unit);
        }

        Self { partitions }
    }

    pub fn total_units(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    /// Indices of partitions that actually have work.
    pub fn active_workers(&self) -> impl Iterator<Item = usize> + '_ {
        self.partitions
            .iter()
            .enumerate()
            .filter(|(_, units)| !units.is_empty())
            .map(|(i, _)| i)
    }
}

/// One batch's partitions, shared read-only by the workers and the aggregator.
pub type SharedPartitions = Arc<Vec<Vec<WorkUnit>>>;

/// Shared handles every worker needs.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub limiter: Arc<RateLimiter>,
    pub adapter: LookupAdapter,
    pub deadline: Option<Instant>,
    pub tx: UnboundedSender<WorkerMessage>,
}

/// Process one partition sequentially.
pub(crate) async fn run_worker(
    worker_index: usize,
    partitions: SharedPartitions,
    ctx: WorkerContext,
) {
    let units = &partitions[worker_index];
    tracing::debug!(worker_index, assigned = units.len(), "worker started");

    for unit in units {
        let outcome = if ctx.deadline.is_some_and(|d| Instant::now() >= d) {
            LookupOutcome::LookupFailed(DEADLINE_EXCEEDED.to_string())
        } else {
            ctx.limiter.acquire().await;
            run_unit(&ctx.adapter, &unit.normalized_domain).await
        };

        let result = unit.to_result(outcome, worker_index);
        if ctx.tx.send(WorkerMessage::Completed(result)).is_err() {
            tracing::warn!(worker_index, "aggregator gone, stopping worker");
            return;
        }
    }

    tracing::debug!(worker_index, "worker finished");
}

/// Run one lookup, turning a panic at the adapter boundary into a failure.
pub(crate) async fn run_unit(adapter: &LookupAdapter, domain: &str) -> LookupOutcome {
    match AssertUnwindSafe(adapter.lookup(domain)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!(domain, reason = %reason, "lookup panicked");
            LookupOutcome::LookupFailed(format!("Unexpected failure while checking: {}", reason))
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_drops_empty_tokens() {
        let plan = BatchPlan::build(&strings(&["foo", "", "  bar  "]), 2, "com");
        assert_eq!(plan.total_units(), 2);
        assert_eq!(plan.partitions[0][0].normalized_domain, "foo.com");
        assert_eq!(plan.partitions[1][0].normalized_domain, "bar.com");
        assert_eq!(plan.partitions[1][0].original_input, "  bar  ");
    }

    #[test]
    fn test_plan_is_round_robin_and_ordered() {
        let input = strings(&["a", "b", "c", "d", "e", "f", "g"]);
        let plan = BatchPlan::build(&input, 3, "com");
        let names = |i: usize| -> Vec<&str> {
            plan.partitions[i]
                .iter()
                .map(|u| u.original_input.as_str())
                .collect()
        };
        assert_eq!(names(0), vec!["a", "d", "g"]);
        assert_eq!(names(1), vec!["b", "e"]);
        assert_eq!(names(2), vec!["c", "f"]);
    }

    #[test]
    fn test_plan_with_more_workers_than_domains() {
        let plan = BatchPlan::build(&strings(&["x", "y"]), 10, "com");
        assert_eq!(plan.partitions.len(), 10);
        assert_eq!(plan.active_workers().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_plan_keeps_duplicates() {
        let plan = BatchPlan::build(&strings(&["dup", "dup", "DUP"]), 2, "com");
        assert_eq!(plan.total_units(), 3);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
