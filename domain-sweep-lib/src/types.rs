//! Core data types for bulk availability checking.
//!
//! This module defines the outcome vocabulary, the per-domain result record,
//! progress events, and the batch configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::DomainCheckError;

/// Default number of workers in the pool.
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Default minimum gap between two registry queries, process-wide.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Default top-level suffix appended to every cleaned input.
pub const DEFAULT_SUFFIX: &str = "com";

/// Upper bound on worker count accepted by configuration.
pub const MAX_WORKER_COUNT: usize = 100;

/// Classification of one registry lookup.
///
/// Produced exactly once per normalized domain by the lookup adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    /// No registration record, or the record has expired
    Available,

    /// Registered with an expiration date in the future
    Registered,

    /// The lookup could not be completed; carries a human-readable reason
    LookupFailed(String),
}

impl LookupOutcome {
    /// External status for this outcome.
    pub fn status(&self) -> DomainStatus {
        match self {
            LookupOutcome::Available => DomainStatus::Available,
            LookupOutcome::Registered => DomainStatus::NotAvailable,
            LookupOutcome::LookupFailed(_) => DomainStatus::Error,
        }
    }

    /// Failure reason, if the lookup failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            LookupOutcome::LookupFailed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LookupOutcome::LookupFailed(_))
    }
}

/// Status vocabulary used by every external rendering of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
    #[serde(rename = "Error")]
    Error,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Available => "Available",
            DomainStatus::NotAvailable => "Not Available",
            DomainStatus::Error => "Error",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration data extracted from a registry response.
///
/// Only what classification needs is kept: the expiration instants, in the
/// order the registry returned them, and the registered name when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRecord {
    /// Domain name as echoed back by the registry
    pub domain_name: Option<String>,

    /// Expiration instants; the first one is authoritative
    pub expiration_dates: Vec<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// Record with a single expiration instant.
    pub fn expiring_at(expiration: DateTime<Utc>) -> Self {
        Self {
            domain_name: None,
            expiration_dates: vec![expiration],
        }
    }

    /// First expiration instant, if any.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration_dates.first().copied()
    }
}

/// Result of checking one domain inside a batch.
///
/// Immutable once created. Owned by the result collector after the worker
/// hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The raw token as supplied by the caller
    pub original_input: String,

    /// Cleaned token with the suffix appended (e.g. "foo.com")
    pub normalized_domain: String,

    /// What the registry lookup concluded
    pub outcome: LookupOutcome,

    /// Partition that processed this domain
    pub worker_index: usize,
}

impl CheckResult {
    pub fn status(&self) -> DomainStatus {
        self.outcome.status()
    }

    /// Row form used for JSON/CSV export.
    pub fn to_record(&self) -> CheckRecord {
        CheckRecord {
            original_domain: self.original_input.clone(),
            cleaned_domain: self.normalized_domain.clone(),
            status: self.status(),
            error: self.outcome.error_message().unwrap_or_default().to_string(),
        }
    }
}

/// Flat row representation of a [`CheckResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    #[serde(rename = "Original Domain")]
    pub original_domain: String,

    #[serde(rename = "Cleaned Domain")]
    pub cleaned_domain: String,

    #[serde(rename = "Status")]
    pub status: DomainStatus,

    /// Empty unless status is `Error`
    #[serde(rename = "Error")]
    pub error: String,
}

impl CheckRecord {
    /// CSV header line matching [`CheckRecord::to_csv_line`].
    pub const CSV_HEADER: &'static str = "Original Domain,Cleaned Domain,Status,Error";

    /// Render as one CSV line, quoting fields where needed.
    pub fn to_csv_line(&self) -> String {
        [
            csv_field(&self.original_domain),
            csv_field(&self.cleaned_domain),
            csv_field(self.status.as_str()),
            csv_field(&self.error),
        ]
        .join(",")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Live progress notification, published once per completed unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// The result that just completed
    pub result: CheckResult,

    /// Completed units over total units, in `[0, 1]`
    pub overall: f64,

    /// Completed units of this worker over its assigned units, in `[0, 1]`
    pub worker_fraction: f64,

    /// Worker that produced the result
    pub worker_index: usize,
}

/// Aggregate counts over a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub available: usize,
    pub not_available: usize,
    pub errors: usize,

    /// Wall time from dispatch to the last result
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Everything a batch produces: the rows plus their summary.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<CheckResult>,
    pub summary: BatchSummary,
}

/// Configuration for a domain checker.
///
/// Worker count and rate interval are caller inputs, never hardcoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Number of parallel workers (partitions)
    /// Default: 10, Range: 1-100
    pub worker_count: usize,

    /// Minimum time between any two registry queries, across all workers
    /// Default: 100ms
    pub min_interval: Duration,

    /// Top-level suffix appended to cleaned inputs
    /// Default: "com"
    pub suffix: String,

    /// Timeout applied around each individual lookup
    /// Default: 10 seconds
    pub lookup_timeout: Duration,

    /// Whether an RDAP failure is followed by a second query over WHOIS
    /// Default: false (one outbound call per lookup)
    pub enable_whois_fallback: bool,

    /// Stop dispatching new units once this much time has passed
    /// Default: None (no deadline)
    pub batch_deadline: Option<Duration>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            min_interval: DEFAULT_MIN_INTERVAL,
            suffix: DEFAULT_SUFFIX.to_string(),
            lookup_timeout: Duration::from_secs(10),
            enable_whois_fallback: false,
            batch_deadline: None,
        }
    }
}

impl CheckConfig {
    /// Set the number of workers. Validated when a batch starts.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the global minimum interval between lookups.
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Set the top-level suffix (with or without a leading dot).
    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = suffix.into().trim().trim_start_matches('.').to_lowercase();
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Enable or disable WHOIS fallback.
    pub fn with_whois_fallback(mut self, enabled: bool) -> Self {
        self.enable_whois_fallback = enabled;
        self
    }

    /// Set a deadline after which no new units are dispatched.
    pub fn with_batch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.batch_deadline = deadline;
        self
    }

    /// Reject settings that would make a batch meaningless.
    pub fn validate(&self) -> Result<(), DomainCheckError> {
        if self.worker_count == 0 {
            return Err(DomainCheckError::config("worker_count must be at least 1"));
        }
        if self.worker_count > MAX_WORKER_COUNT {
            return Err(DomainCheckError::config(format!(
                "worker_count must not exceed {}",
                MAX_WORKER_COUNT
            )));
        }
        if self.suffix.is_empty() || self.suffix.contains(['.', ' ']) {
            return Err(DomainCheckError::config(format!(
                "Invalid suffix '{}'",
                self.suffix
            )));
        }
        if self.lookup_timeout.is_zero() {
            return Err(DomainCheckError::config("lookup_timeout must be positive"));
        }
        if std::time::Instant::now()
            .checked_add(self.min_interval)
            .is_none()
        {
            return Err(DomainCheckError::config("min_interval is out of range"));
        }
        Ok(())
    }
}
