//! WHOIS lookups through the system `whois` command.
//!
//! WHOIS replies are free text, so classification relies on well-known
//! phrases: "not found" style answers become [`QueryResponse::NotFound`], and
//! registered answers are scanned for a domain name and expiry lines.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::time::Duration;
use tokio::process::Command;

use crate::error::DomainCheckError;
use crate::lookup::{QueryResponse, RegistryLookup};
use crate::types::RegistrationRecord;

lazy_static::lazy_static! {
    static ref EXPIRY_LINE: Regex = Regex::new(
        r"(?im)^\s*(?:registry expiry date|registrar registration expiration date|expiration date|expiry date|expiration time|expires on|expires|paid-till|renewal date)\s*:\s*(\S.*?)\s*$"
    ).expect("expiry pattern is valid");

    static ref DOMAIN_LINE: Regex = Regex::new(
        r"(?im)^\s*domain(?: name)?\s*:\s*([a-z0-9.-]+\.[a-z0-9-]+)\s*$"
    ).expect("domain pattern is valid");
}

/// Phrases registries use for "no such domain".
const AVAILABLE_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "domain available",
    "status: available",
    "status: free",
    "no information available",
    "not registered",
    "no matching record",
    "domain status: no object found",
    "the queried object does not exist",
    "object does not exist",
    "no matching entry",
    "domain name not found",
    "this domain name has not been registered",
];

/// Phrases that show up in registered-domain replies.
const TAKEN_PATTERNS: &[&str] = &[
    "domain status:",
    "registrar:",
    "creation date:",
    "created:",
    "registry domain id:",
    "registrant:",
    "name server:",
    "nameservers:",
    "expiry date:",
    "expires:",
    "updated:",
];

const INVALID_TLD_PATTERNS: &[&str] = &[
    "no whois server is known",
    "no whois server",
    "invalid tld",
    "unknown tld",
    "no such tld",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "try again later",
    "quota exceeded",
    "limit exceeded",
    "throttled",
];

/// WHOIS client backed by the system `whois` binary.
#[derive(Clone, Debug)]
pub struct WhoisClient {
    /// Timeout for WHOIS requests
    timeout: Duration,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `whois <domain>` once and parse the reply.
    pub async fn query_domain(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("whois").arg(domain).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| DomainCheckError::timeout("WHOIS query", self.timeout))?
        .map_err(|e| {
            DomainCheckError::whois(
                domain,
                format!(
                    "Failed to execute whois command: {}. Make sure 'whois' is installed.",
                    e
                ),
            )
        })?;

        let text = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(domain, bytes = text.len(), "WHOIS reply");
        parse_whois_response(domain, &text)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryLookup for WhoisClient {
    async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
        self.query_domain(domain).await
    }
}

/// Classify a WHOIS reply.
///
/// Ambiguous replies are errors rather than guesses.
pub fn parse_whois_response(domain: &str, text: &str) -> Result<QueryResponse, DomainCheckError> {
    let lower = text.to_lowercase();

    if INVALID_TLD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(DomainCheckError::whois(
            domain,
            "Invalid or unsupported TLD for WHOIS lookup",
        ));
    }

    if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(DomainCheckError::whois(
            domain,
            "Rate limited by WHOIS server",
        ));
    }

    if AVAILABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Ok(QueryResponse::NotFound);
    }

    let domain_name = DOMAIN_LINE
        .captures(text)
        .map(|c| c[1].trim_end_matches('.').to_lowercase());

    let mut expiration_dates = Vec::new();
    for captures in EXPIRY_LINE.captures_iter(text) {
        let raw = &captures[1];
        match parse_whois_date(raw) {
            Some(date) => expiration_dates.push(date),
            None => tracing::debug!(domain, raw, "unrecognised WHOIS date"),
        }
    }

    let taken_hits = TAKEN_PATTERNS.iter().filter(|p| lower.contains(*p)).count();

    if domain_name.is_some() || !expiration_dates.is_empty() || taken_hits >= 2 {
        return Ok(QueryResponse::Record(RegistrationRecord {
            domain_name,
            expiration_dates,
        }));
    }

    // Some registries answer an unknown name with a near-empty reply
    if lower.trim().len() < 50 {
        return Ok(QueryResponse::NotFound);
    }

    Err(DomainCheckError::whois(
        domain,
        "Unable to determine domain status from WHOIS response",
    ))
}

/// Parse the date formats commonly found in WHOIS expiry lines.
pub fn parse_whois_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    // Drop a trailing zone name such as "UTC" or "GMT"
    let trimmed = raw
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim();

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y.%m.%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d-%b-%Y", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTERED: &str = "   Domain Name: GOOGLE.COM\n\
        Registry Domain ID: 2138514_DOMAIN_COM-VRSN\n\
        Registrar: MarkMonitor Inc.\n\
        Creation Date: 1997-09-15T04:00:00Z\n\
        Registry Expiry Date: 2028-09-14T04:00:00Z\n\
        Domain Status: clientDeleteProhibited\n";

    #[test]
    fn test_parse_registered_reply() {
        let response = parse_whois_response("google.com", REGISTERED).unwrap();
        match response {
            QueryResponse::Record(record) => {
                assert_eq!(record.domain_name.as_deref(), Some("google.com"));
                assert_eq!(
                    record.expiration().unwrap().to_rfc3339(),
                    "2028-09-14T04:00:00+00:00"
                );
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_found_reply() {
        let reply = "No match for \"SURELYFREE12345.COM\".\n>>> Last update of whois database";
        assert_eq!(
            parse_whois_response("surelyfree12345.com", reply).unwrap(),
            QueryResponse::NotFound
        );
        assert_eq!(
            parse_whois_response("x.com", "Domain not found").unwrap(),
            QueryResponse::NotFound
        );
    }

    #[test]
    fn test_multiple_expiry_lines_keep_order() {
        let reply = "Domain Name: example.com\n\
            Registry Expiry Date: 2031-01-01T00:00:00Z\n\
            Registrar Registration Expiration Date: 2029-01-01T00:00:00Z\n";
        let QueryResponse::Record(record) = parse_whois_response("example.com", reply).unwrap()
        else {
            panic!("expected record");
        };
        assert_eq!(record.expiration_dates.len(), 2);
        assert_eq!(
            record.expiration().unwrap().to_rfc3339(),
            "2031-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_rate_limit_is_an_error() {
        let err = parse_whois_response("a.com", "Rate limit exceeded. Try again later.").unwrap_err();
        assert!(err.to_string().contains("Rate limited"));
        assert!(!err.indicates_available());
    }

    #[test]
    fn test_ambiguous_reply_is_an_error() {
        let reply = "This server only answers to queries from registered clients. \
            Please contact support for access to the service.";
        assert!(parse_whois_response("a.com", reply).is_err());
    }

    #[test]
    fn test_parse_whois_dates() {
        let expected = "2028-09-14T00:00:00+00:00";
        for raw in [
            "2028-09-14",
            "2028.09.14",
            "2028/09/14",
            "14-Sep-2028",
            "14.09.2028",
            "2028-09-14 00:00:00 UTC",
            "2028-09-14T00:00:00",
        ] {
            let parsed = parse_whois_date(raw).unwrap_or_else(|| panic!("failed on {}", raw));
            assert_eq!(parsed.to_rfc3339(), expected, "raw: {}", raw);
        }
        assert!(parse_whois_date("someday").is_none());
    }

    #[test]
    fn test_whois_client_creation() {
        let client = WhoisClient::new();
        assert_eq!(client.timeout(), Duration::from_secs(5));

        let custom_client = WhoisClient::with_timeout(Duration::from_secs(10));
        assert_eq!(custom_client.timeout(), Duration::from_secs(10));
    }
}
