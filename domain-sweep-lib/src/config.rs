//! Configuration file parsing and management.
//!
//! Settings come from TOML files and `DS_*` environment variables and are
//! layered over [`CheckConfig::default`]. Precedence, lowest first:
//! XDG config, global config, local config, environment. The CLI applies its
//! own flags on top.

use crate::error::DomainCheckError;
use crate::types::{CheckConfig, MAX_WORKER_COUNT};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for checker options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default checker values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Number of workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Minimum interval between lookups, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    /// Suffix appended to every input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    /// Per-lookup timeout (as string, e.g., "5s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Batch deadline (as string, e.g., "10m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,

    /// Query WHOIS after an RDAP failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_fallback: Option<bool>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Default output format ("text", "json" or "csv")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        Ok(merged_config)
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Global configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// XDG configuration file.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    workers: higher.workers.or(lower.workers),
                    interval_ms: higher.interval_ms.or(lower.interval_ms),
                    suffix: higher.suffix.or(lower.suffix),
                    timeout: higher.timeout.or(lower.timeout),
                    deadline: higher.deadline.or(lower.deadline),
                    whois_fallback: higher.whois_fallback.or(lower.whois_fallback),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    default_format: higher.default_format.or(lower.default_format),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(workers) = defaults.workers {
                if workers == 0 || workers > MAX_WORKER_COUNT {
                    return Err(DomainCheckError::config(format!(
                        "workers must be between 1 and {}",
                        MAX_WORKER_COUNT
                    )));
                }
            }

            if let Some(suffix) = &defaults.suffix {
                validate_suffix(suffix)?;
            }

            for (name, value) in [("timeout", &defaults.timeout), ("deadline", &defaults.deadline)]
            {
                if let Some(value) = value {
                    if parse_duration_string(value).is_none() {
                        return Err(DomainCheckError::config(format!(
                            "Invalid {} format '{}'. Use format like '500ms', '5s', '2m'",
                            name, value
                        )));
                    }
                }
            }
        }

        if let Some(format) = config.output.as_ref().and_then(|o| o.default_format.as_ref()) {
            if !matches!(format.as_str(), "text" | "json" | "csv") {
                return Err(DomainCheckError::config(format!(
                    "Unknown output format '{}'. Use text, json or csv",
                    format
                )));
            }
        }

        Ok(())
    }
}

impl FileConfig {
    /// Layer the file's defaults over `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(workers) = defaults.workers {
            config.worker_count = workers;
        }
        if let Some(interval_ms) = defaults.interval_ms {
            config.min_interval = Duration::from_millis(interval_ms);
        }
        if let Some(suffix) = &defaults.suffix {
            config = config.with_suffix(suffix.as_str());
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            config.lookup_timeout = timeout;
        }
        if let Some(deadline) = defaults.deadline.as_deref().and_then(parse_duration_string) {
            config.batch_deadline = Some(deadline);
        }
        if let Some(whois_fallback) = defaults.whois_fallback {
            config.enable_whois_fallback = whois_fallback;
        }
        config
    }
}

fn validate_suffix(suffix: &str) -> Result<(), DomainCheckError> {
    let suffix = suffix.trim().trim_start_matches('.');
    if suffix.is_empty() || suffix.contains(['.', ' ']) {
        return Err(DomainCheckError::config(format!(
            "Invalid suffix '{}'. Use a single label such as 'com'",
            suffix
        )));
    }
    Ok(())
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `DS_*` variables; invalid values are logged and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub workers: Option<usize>,
    pub interval_ms: Option<u64>,
    pub suffix: Option<String>,
    pub timeout: Option<Duration>,
    pub deadline: Option<Duration>,
    pub whois_fallback: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    parse_env_config(|key| env::var(key).ok())
}

/// Parse `DS_*` settings through an arbitrary lookup function.
pub fn parse_env_config<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("DS_WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(workers) if workers > 0 && workers <= MAX_WORKER_COUNT => {
                tracing::debug!(workers, "using DS_WORKERS");
                env_config.workers = Some(workers);
            }
            _ => tracing::warn!(value = %val, "invalid DS_WORKERS, must be 1-{}", MAX_WORKER_COUNT),
        }
    }

    if let Some(val) = lookup("DS_INTERVAL_MS") {
        match val.trim().parse::<u64>() {
            Ok(interval_ms) => env_config.interval_ms = Some(interval_ms),
            Err(_) => tracing::warn!(value = %val, "invalid DS_INTERVAL_MS, must be milliseconds"),
        }
    }

    if let Some(val) = lookup("DS_SUFFIX") {
        match validate_suffix(&val) {
            Ok(()) => env_config.suffix = Some(val),
            Err(e) => tracing::warn!(error = %e, "invalid DS_SUFFIX"),
        }
    }

    if let Some(val) = lookup("DS_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => tracing::warn!(value = %val, "invalid DS_TIMEOUT, use format like '5s'"),
        }
    }

    if let Some(val) = lookup("DS_DEADLINE") {
        match parse_duration_string(&val) {
            Some(deadline) => env_config.deadline = Some(deadline),
            None => tracing::warn!(value = %val, "invalid DS_DEADLINE, use format like '10m'"),
        }
    }

    if let Some(val) = lookup("DS_WHOIS_FALLBACK") {
        match parse_bool(&val) {
            Some(enabled) => env_config.whois_fallback = Some(enabled),
            None => tracing::warn!(value = %val, "invalid DS_WHOIS_FALLBACK, use true/false"),
        }
    }

    if let Some(path) = lookup("DS_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

impl EnvConfig {
    /// Layer environment values over `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.min_interval = Duration::from_millis(interval_ms);
        }
        if let Some(suffix) = &self.suffix {
            config = config.with_suffix(suffix.as_str());
        }
        if let Some(timeout) = self.timeout {
            config.lookup_timeout = timeout;
        }
        if let Some(deadline) = self.deadline {
            config.batch_deadline = Some(deadline);
        }
        if let Some(whois_fallback) = self.whois_fallback {
            config.enable_whois_fallback = whois_fallback;
        }
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration string like "500ms", "5s", "2m". A bare number is seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}
