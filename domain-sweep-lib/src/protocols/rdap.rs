//! RDAP (Registration Data Access Protocol) lookups.
//!
//! One HTTPS GET per domain. HTTP 404 is the registry's "no record" signal;
//! a 200 response is parsed for the domain name and its expiration events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::time::Duration;

use crate::error::DomainCheckError;
use crate::lookup::{QueryResponse, RegistryLookup};
use crate::protocols::registry::get_rdap_endpoint;
use crate::types::RegistrationRecord;
use crate::utils::extract_tld;

/// RDAP client for registry queries.
#[derive(Clone, Debug)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// Timeout for RDAP requests
    timeout: Duration,
}

impl RdapClient {
    /// Create a new RDAP client with default settings.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a new RDAP client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("domain-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainCheckError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether RDAP can answer for this domain's TLD.
    pub fn supports(&self, domain: &str) -> bool {
        extract_tld(domain)
            .map(|tld| get_rdap_endpoint(&tld).is_some())
            .unwrap_or(false)
    }

    /// Query the registry's RDAP endpoint for `domain`.
    pub async fn query_domain(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
        let tld = extract_tld(domain)?;
        let endpoint = get_rdap_endpoint(&tld).ok_or_else(|| {
            DomainCheckError::rdap(domain, format!("No RDAP endpoint known for .{}", tld))
        })?;
        let rdap_url = format!("{}{}", endpoint, domain);

        tracing::debug!(domain, url = %rdap_url, "RDAP request");

        let response = self
            .http_client
            .get(&rdap_url)
            .header(reqwest::header::ACCEPT, "application/rdap+json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainCheckError::timeout("RDAP request", self.timeout)
                } else {
                    DomainCheckError::rdap(domain, format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        tracing::debug!(domain, status = status.as_u16(), "RDAP response");

        match status {
            StatusCode::OK => {
                let json = response.json::<serde_json::Value>().await.map_err(|e| {
                    DomainCheckError::rdap(domain, format!("Failed to parse JSON: {}", e))
                })?;
                Ok(QueryResponse::Record(parse_rdap_record(&json)?))
            }
            StatusCode::NOT_FOUND => Ok(QueryResponse::NotFound),
            code => Err(DomainCheckError::rdap_with_status(
                domain,
                format!("RDAP server returned error: {}", code),
                code.as_u16(),
            )),
        }
    }
}

#[async_trait]
impl RegistryLookup for RdapClient {
    async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
        self.query_domain(domain).await
    }
}

/// Extract the registered name and expiration instants from an RDAP domain object.
///
/// # Errors
///
/// Returns `DomainCheckError::ParseError` when the payload is not an RDAP
/// domain object or an expiration date cannot be parsed.
pub fn parse_rdap_record(json: &serde_json::Value) -> Result<RegistrationRecord, DomainCheckError> {
    if !json.is_object() {
        return Err(DomainCheckError::parse("RDAP response is not a JSON object"));
    }

    let mut record = RegistrationRecord {
        domain_name: json
            .get("ldhName")
            .and_then(|n| n.as_str())
            .map(str::to_lowercase),
        expiration_dates: Vec::new(),
    };

    if let Some(events) = json.get("events").and_then(|e| e.as_array()) {
        for event in events {
            let action = event.get("eventAction").and_then(|a| a.as_str());
            let date = event.get("eventDate").and_then(|d| d.as_str());
            if let (Some("expiration"), Some(date)) = (action, date) {
                let parsed = DateTime::parse_from_rfc3339(date).map_err(|e| {
                    DomainCheckError::parse(format!(
                        "Invalid RDAP expiration date '{}': {}",
                        date, e
                    ))
                })?;
                record.expiration_dates.push(parsed.with_timezone(&Utc));
            }
        }
    }

    Ok(record)
}
