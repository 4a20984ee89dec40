//! Registry protocol implementations.
//!
//! Each domain is routed to one protocol: RDAP when its TLD has a known
//! endpoint, WHOIS otherwise. With WHOIS fallback enabled, an RDAP failure is
//! followed by a WHOIS query for the same domain. That second query belongs to
//! the same unit and is not spaced by the batch rate limiter.

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// WHOIS protocol implementation
pub mod whois;

/// Built-in RDAP endpoint mappings
pub mod registry;

pub use rdap::{parse_rdap_record, RdapClient};
pub use registry::{get_rdap_endpoint, get_rdap_tlds};
pub use whois::{parse_whois_date, parse_whois_response, WhoisClient};

use async_trait::async_trait;

use crate::error::DomainCheckError;
use crate::lookup::{QueryResponse, RegistryLookup};
use crate::types::CheckConfig;

/// Production registry client: RDAP first, WHOIS where RDAP can't answer.
#[derive(Clone, Debug)]
pub struct RegistryClient {
    rdap: RdapClient,
    whois: WhoisClient,
    whois_fallback: bool,
}

impl RegistryClient {
    pub fn new(rdap: RdapClient, whois: WhoisClient, whois_fallback: bool) -> Self {
        Self {
            rdap,
            whois,
            whois_fallback,
        }
    }

    /// Build protocol clients whose own timeouts sit inside the lookup timeout.
    ///
    /// With fallback enabled each protocol gets half of the budget, so a timed
    /// out RDAP query still leaves WHOIS time to answer.
    pub fn from_config(config: &CheckConfig) -> Result<Self, DomainCheckError> {
        let per_protocol = if config.enable_whois_fallback {
            config.lookup_timeout / 2
        } else {
            config.lookup_timeout
        };
        let rdap = RdapClient::with_timeout(per_protocol)?;
        let whois = WhoisClient::with_timeout(per_protocol);
        Ok(Self::new(rdap, whois, config.enable_whois_fallback))
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    async fn query(&self, domain: &str) -> Result<QueryResponse, DomainCheckError> {
        if !self.rdap.supports(domain) {
            return self.whois.query_domain(domain).await;
        }

        match self.rdap.query_domain(domain).await {
            Ok(response) => Ok(response),
            Err(rdap_error) if self.whois_fallback && !rdap_error.indicates_available() => {
                tracing::debug!(domain, error = %rdap_error, "RDAP failed, trying WHOIS");
                match self.whois.query_domain(domain).await {
                    Ok(response) => Ok(response),
                    // RDAP errors are usually the more informative of the two
                    Err(_) => Err(rdap_error),
                }
            }
            Err(rdap_error) => Err(rdap_error),
        }
    }
}
