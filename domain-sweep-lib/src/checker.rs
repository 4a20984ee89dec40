//! Main domain checker implementation.
//!
//! `DomainChecker` is the dispatcher: it cleans and partitions the input,
//! spawns one worker per non-empty partition, wires every worker to the shared
//! rate limiter and the progress aggregator, and returns once each dispatched
//! unit has produced exactly one result.

use futures::stream::Stream;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::concurrent::{
    panic_message, run_unit, run_worker, BatchPlan, SharedPartitions, WorkUnit, WorkerContext,
};
use crate::error::DomainCheckError;
use crate::limiter::RateLimiter;
use crate::lookup::{LookupAdapter, RegistryLookup};
use crate::progress::{ProgressAggregator, WorkerMessage};
use crate::protocols::RegistryClient;
use crate::types::{BatchReport, CheckConfig, CheckResult, ProgressEvent};
use crate::utils::normalize_single;

/// Coordinates rate-limited bulk availability checks.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{CheckConfig, DomainChecker};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = CheckConfig::default()
///         .with_worker_count(4)
///         .with_min_interval(Duration::from_millis(200));
///     let checker = DomainChecker::with_config(config)?;
///
///     let domains = vec!["rustacean".to_string(), "  Ferris  ".to_string()];
///     for result in checker.check_domains(&domains).await? {
///         println!("{} -> {}", result.normalized_domain, result.status());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Registry protocol used for every lookup
    registry: Arc<dyn RegistryLookup>,
}

impl DomainChecker {
    /// Create a checker with default configuration and the RDAP/WHOIS client.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration and the RDAP/WHOIS client.
    pub fn with_config(config: CheckConfig) -> Result<Self, DomainCheckError> {
        let registry = RegistryClient::from_config(&config)?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Create a checker over any registry implementation.
    pub fn with_registry(config: CheckConfig, registry: Arc<dyn RegistryLookup>) -> Self {
        Self { config, registry }
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    fn adapter(&self) -> LookupAdapter {
        LookupAdapter::new(Arc::clone(&self.registry), self.config.lookup_timeout)
    }

    /// Clean and partition `domains` without checking anything.
    pub fn plan_batch(&self, domains: &[String]) -> Result<BatchPlan, DomainCheckError> {
        self.config.validate()?;
        Ok(BatchPlan::build(
            domains,
            self.config.worker_count,
            &self.config.suffix,
        ))
    }

    /// Check one domain directly, bypassing the pool and the rate limiter.
    ///
    /// # Errors
    ///
    /// Returns `DomainCheckError::ConfigError` for invalid configuration and
    /// `DomainCheckError::InvalidDomain` if the input is empty after cleaning.
    /// Lookup failures, panics included, are reported inside the result.
    pub async fn check_domain(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        self.config.validate()?;
        let normalized = normalize_single(domain, &self.config.suffix)?;
        let outcome = run_unit(&self.adapter(), &normalized).await;

        Ok(CheckResult {
            original_input: domain.to_string(),
            normalized_domain: normalized,
            outcome,
            worker_index: 0,
        })
    }

    /// Check every non-empty domain in `domains` and return all results.
    ///
    /// Result order is completion order, not input order.
    ///
    /// # Errors
    ///
    /// Only invalid configuration (e.g. zero workers) fails, and it fails
    /// before any lookup is made.
    pub async fn check_domains(
        &self,
        domains: &[String],
    ) -> Result<Vec<CheckResult>, DomainCheckError> {
        Ok(self.check_domains_with_progress(domains, None).await?.results)
    }

    /// Check domains while publishing a [`ProgressEvent`] per completed unit.
    ///
    /// Events are sent on `progress` as they happen; sending never blocks a
    /// worker. The returned report holds every result plus a summary.
    pub async fn check_domains_with_progress(
        &self,
        domains: &[String],
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<BatchReport, DomainCheckError> {
        let plan = self.plan_batch(domains)?;
        Ok(self.run_plan(plan, progress).await)
    }

    /// Check domains in the background, yielding progress events as a stream.
    ///
    /// The stream ends after the last unit completes.
    pub fn check_domains_stream(
        &self,
        domains: &[String],
    ) -> Result<impl Stream<Item = ProgressEvent> + Send + 'static, DomainCheckError> {
        let plan = self.plan_batch(domains)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let checker = self.clone();

        tokio::spawn(async move {
            checker.run_plan(plan, Some(tx)).await;
        });

        Ok(UnboundedReceiverStream::new(rx))
    }

    async fn run_plan(
        &self,
        plan: BatchPlan,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> BatchReport {
        let total = plan.total_units();
        tracing::info!(
            total,
            workers = self.config.worker_count,
            min_interval_ms = self.config.min_interval.as_millis() as u64,
            "batch started"
        );

        let active: Vec<usize> = plan.active_workers().collect();
        let partitions: SharedPartitions = Arc::new(plan.partitions);

        let (tx, rx) = mpsc::unbounded_channel();
        let aggregator = ProgressAggregator::new(Arc::clone(&partitions), progress);
        let aggregator_handle = tokio::spawn(aggregator.run(rx));

        let ctx = WorkerContext {
            limiter: Arc::new(RateLimiter::new(self.config.min_interval)),
            adapter: self.adapter(),
            // a deadline past the clock's range means no deadline
            deadline: self
                .config
                .batch_deadline
                .and_then(|d| Instant::now().checked_add(d)),
            tx: tx.clone(),
        };

        let workers: Vec<_> = active
            .into_iter()
            .map(|worker_index| {
                let handle = tokio::spawn(run_worker(
                    worker_index,
                    Arc::clone(&partitions),
                    ctx.clone(),
                ));
                (worker_index, handle)
            })
            .collect();
        drop(ctx);

        for (worker_index, handle) in workers {
            if let Err(join_error) = handle.await {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic().as_ref())
                } else {
                    "worker task cancelled".to_string()
                };
                let _ = tx.send(WorkerMessage::Aborted {
                    worker_index,
                    reason,
                });
            }
        }
        drop(tx);

        let report = match aggregator_handle.await {
            Ok(report) => report,
            Err(join_error) => {
                tracing::error!(error = %join_error, "progress aggregator failed");
                generic_failure_report(&partitions, &join_error.to_string())
            }
        };

        tracing::info!(
            total = report.summary.total,
            available = report.summary.available,
            not_available = report.summary.not_available,
            errors = report.summary.errors,
            elapsed_ms = report.summary.elapsed.as_millis() as u64,
            "batch finished"
        );
        report
    }
}

/// Error rows for every unit, used when the aggregator's results are lost.
fn generic_failure_report(partitions: &[Vec<WorkUnit>], reason: &str) -> BatchReport {
    use crate::types::{BatchSummary, LookupOutcome};

    let results: Vec<CheckResult> = partitions
        .iter()
        .enumerate()
        .flat_map(|(worker_index, units)| {
            units.iter().map(move |unit| {
                let outcome =
                    LookupOutcome::LookupFailed(format!("Error processing domain: {}", reason));
                unit.to_result(outcome, worker_index)
            })
        })
        .collect();
    let summary = BatchSummary::from_results(&results, std::time::Duration::ZERO);
    BatchReport { results, summary }
}

impl std::fmt::Debug for DomainChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainChecker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::QueryResponse;
    use async_trait::async_trait;

    struct AlwaysNotFound;

    #[async_trait]
    impl RegistryLookup for AlwaysNotFound {
        async fn query(&self, _domain: &str) -> Result<QueryResponse, DomainCheckError> {
            Ok(QueryResponse::NotFound)
        }
    }

    /// Panics while looking up the given domain.
    struct PanicsOn(&'static str);

    #[async_trait]
    impl RegistryLookup for PanicsOn {
        async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
            if domain == self.0 {
                panic!("registry fault on {}", domain);
            }
            Ok(QueryResponse::NotFound)
        }
    }

    /// Panic payload whose own drop panics, so the worker task itself dies.
    struct ExplodingPayload;

    impl Drop for ExplodingPayload {
        fn drop(&mut self) {
            panic!("worker torn down");
        }
    }

    struct KillsWorkerOn(&'static str);

    #[async_trait]
    impl RegistryLookup for KillsWorkerOn {
        async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
            if domain == self.0 {
                std::panic::panic_any(ExplodingPayload);
            }
            Ok(QueryResponse::NotFound)
        }
    }

    fn checker(config: CheckConfig) -> DomainChecker {
        DomainChecker::with_registry(config, Arc::new(AlwaysNotFound))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_zero_workers_fail_fast() {
        let checker = checker(CheckConfig::default().with_worker_count(0));
        let err = checker
            .check_domains(&["foo".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_returns_nothing() {
        let checker = checker(CheckConfig::default());
        let results = checker
            .check_domains(&["".to_string(), "   ".to_string()])
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_single_domain_check() {
        let checker = checker(CheckConfig::default());
        let result = checker.check_domain("  Rust Lang ").await.unwrap();
        assert_eq!(result.normalized_domain, "rustlang.com");
        assert_eq!(result.status().to_string(), "Available");

        assert!(checker.check_domain("   ").await.is_err());
    }

    #[test]
    fn test_plan_batch_uses_configured_suffix() {
        let checker = checker(CheckConfig::default().with_worker_count(2).with_suffix("io"));
        let plan = checker.plan_batch(&["one".to_string(), "two".to_string()]).unwrap();
        assert_eq!(plan.partitions[0][0].normalized_domain, "one.io");
        assert_eq!(plan.partitions[1][0].normalized_domain, "two.io");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_deadline_means_no_deadline() {
        let config = CheckConfig::default()
            .with_worker_count(1)
            .with_batch_deadline(Some(std::time::Duration::MAX));
        assert!(config.validate().is_ok());

        let results = checker(config)
            .check_domains(&strings(&["foo", "bar"]))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.outcome.is_failure()));
    }

    #[tokio::test]
    async fn test_single_domain_check_validates_config() {
        let checker = checker(CheckConfig::default().with_suffix("co.uk"));
        let err = checker.check_domain("foo").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_single_domain_check_isolates_panics() {
        let checker =
            DomainChecker::with_registry(CheckConfig::default(), Arc::new(PanicsOn("boom.com")));
        let result = checker.check_domain("boom").await.unwrap();
        let reason = result.outcome.error_message().unwrap();
        assert!(reason.contains("registry fault on boom.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_worker_units_become_error_rows() {
        let checker = DomainChecker::with_registry(
            CheckConfig::default().with_worker_count(2),
            Arc::new(KillsWorkerOn("boom.com")),
        );

        // worker 0: alpha, beta; worker 1: boom, gamma
        let report = checker
            .check_domains_with_progress(&strings(&["alpha", "boom", "beta", "gamma"]), None)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.summary.available, 2);
        assert_eq!(report.summary.errors, 2);

        for domain in ["boom.com", "gamma.com"] {
            let result = report
                .results
                .iter()
                .find(|r| r.normalized_domain == domain)
                .unwrap();
            assert_eq!(result.worker_index, 1);
            let reason = result.outcome.error_message().unwrap();
            assert!(reason.contains("Worker 1 aborted"), "reason: {}", reason);
            assert!(reason.contains("worker torn down"), "reason: {}", reason);
        }
    }

    #[test]
    fn test_generic_failure_report_keeps_domain_identity() {
        let plan = BatchPlan::build(&strings(&["one", "two", "three"]), 2, "com");
        let report = generic_failure_report(&plan.partitions, "aggregator lost");

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary.errors, 3);
        let two = report
            .results
            .iter()
            .find(|r| r.normalized_domain == "two.com")
            .unwrap();
        assert_eq!(two.worker_index, 1);
        assert!(two.outcome.error_message().unwrap().contains("aggregator lost"));
    }
}
