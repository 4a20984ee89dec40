//! Lookup adapter: one registry query per domain, classified into a tri-state outcome.
//!
//! Registry protocols implement [`RegistryLookup`]. The adapter adds a
//! per-lookup timeout and maps every possible response onto a
//! [`LookupOutcome`]. It never retries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DomainCheckError;
use crate::types::{LookupOutcome, RegistrationRecord};

/// What a registry said about a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    /// The registry returned registration data
    Record(RegistrationRecord),

    /// The registry has no record for this domain
    NotFound,
}

/// A single-shot registry query.
///
/// Implementations perform exactly one outbound call. "No record" must be
/// reported as `Ok(QueryResponse::NotFound)`; anything else that prevents a
/// parsed answer is an `Err`.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError>;
}

/// Classify a registry response relative to `now`.
///
/// Pure: the same response and instant always give the same outcome.
pub fn classify_response(
    response: Result<QueryResponse, DomainCheckError>,
    now: DateTime<Utc>,
) -> LookupOutcome {
    match response {
        Ok(QueryResponse::NotFound) => LookupOutcome::Available,
        Ok(QueryResponse::Record(record)) => match record.expiration() {
            Some(expiration) if expiration > now => LookupOutcome::Registered,
            // expired or no expiration data: reclaimable
            _ => LookupOutcome::Available,
        },
        Err(e) if e.indicates_available() => LookupOutcome::Available,
        Err(e) => LookupOutcome::LookupFailed(failure_reason(&e)),
    }
}

fn failure_reason(error: &DomainCheckError) -> String {
    let reason = error.to_string();
    if reason.trim().is_empty() {
        "Lookup failed for an unknown reason".to_string()
    } else {
        reason
    }
}

/// Wraps a [`RegistryLookup`] with a timeout and outcome classification.
#[derive(Clone)]
pub struct LookupAdapter {
    registry: Arc<dyn RegistryLookup>,
    timeout: Duration,
}

impl LookupAdapter {
    pub fn new(registry: Arc<dyn RegistryLookup>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Query the registry once and classify the answer.
    pub async fn lookup(&self, domain: &str) -> LookupOutcome {
        let response = match tokio::time::timeout(self.timeout, self.registry.query(domain)).await
        {
            Ok(response) => response,
            Err(_) => Err(DomainCheckError::timeout(
                format!("registry lookup for {}", domain),
                self.timeout,
            )),
        };

        let outcome = classify_response(response, Utc::now());
        match &outcome {
            LookupOutcome::LookupFailed(reason) => {
                tracing::warn!(domain, reason = %reason, "lookup failed");
            }
            other => tracing::debug!(domain, outcome = ?other, "lookup classified"),
        }
        outcome
    }
}

impl std::fmt::Debug for LookupAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupAdapter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
