//! # Domain Sweep Library
//!
//! Bulk domain availability checking with a fixed worker pool, a global
//! minimum interval between registry lookups, and live progress reporting.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{CheckConfig, DomainChecker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::with_config(CheckConfig::default().with_worker_count(4))?;
//!     let domains = vec!["rustacean".to_string(), "ferris".to_string()];
//!
//!     for result in checker.check_domains(&domains).await? {
//!         println!("{} - {}", result.normalized_domain, result.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Worker Pool**: Round-robin partitioning over a fixed number of workers
//! - **Rate Limiting**: One lookup start per minimum interval across all workers
//! - **Progress**: Per-worker and overall fractions after every completion
//! - **Failure Isolation**: Every input produces a row, even when a lookup panics
//! - **Protocols**: RDAP with WHOIS for TLDs RDAP can't serve

// Re-export main public API types and functions
// This makes them available as domain_sweep_lib::TypeName
pub use checker::DomainChecker;
pub use collector::ResultCollector;
pub use concurrent::{BatchPlan, SharedPartitions, WorkUnit, DEADLINE_EXCEEDED};
pub use config::{
    load_env_config, parse_duration_string, parse_env_config, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, OutputConfig,
};
pub use error::DomainCheckError;
pub use limiter::RateLimiter;
pub use lookup::{classify_response, LookupAdapter, QueryResponse, RegistryLookup};
pub use progress::{ProgressAggregator, WorkerState};
pub use protocols::{RdapClient, RegistryClient, WhoisClient};
pub use types::{
    BatchReport, BatchSummary, CheckConfig, CheckRecord, CheckResult, DomainStatus, LookupOutcome,
    ProgressEvent, RegistrationRecord, DEFAULT_MIN_INTERVAL, DEFAULT_SUFFIX,
    DEFAULT_WORKER_COUNT, MAX_WORKER_COUNT,
};
pub use utils::{clean_domain_name, normalize_domain};

// Registry protocol internals are public for custom routing
pub mod protocols;

// Internal modules - these are not part of the public API
mod checker;
mod collector;
mod concurrent;
mod config;
mod error;
mod limiter;
mod lookup;
mod progress;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "rdap")]
    features.push("rdap");

    #[cfg(feature = "whois")]
    features.push("whois");

    features
}
