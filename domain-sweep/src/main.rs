//! Domain Sweep CLI Application
//!
//! Command-line front end for domain-sweep-lib: reads a list of names, runs the
//! rate-limited batch, renders live progress, and exports the results.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use domain_sweep_lib::{
    load_env_config, parse_duration_string, CheckConfig, CheckRecord, CheckResult,
    ConfigManager, DomainChecker, EnvConfig, FileConfig, MAX_WORKER_COUNT,
};
use std::fs;
use std::path::Path;
use std::process;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check domain availability in bulk with a global rate limit")]
#[command(
    long_about = "Check domain availability in bulk.\n\nNames are cleaned, suffixed, and split round-robin across a fixed pool of workers. All workers share one rate limit, so registries see at most one query per interval."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Names to check (the suffix is appended to each)
    #[arg(value_name = "DOMAINS", help_heading = "Input")]
    pub domains: Vec<String>,

    /// Input file with names (one per line, '#' starts a comment)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<String>,

    /// Suffix appended to every name (default: com)
    #[arg(long = "suffix", value_name = "SUFFIX", help_heading = "Input")]
    pub suffix: Option<String>,

    /// Show the worker partitions without checking anything
    #[arg(long = "dry-run", help_heading = "Input")]
    pub dry_run: bool,

    /// Number of workers (default: 10, max: 100)
    #[arg(short = 'w', long = "workers", value_name = "N", help_heading = "Performance")]
    pub workers: Option<usize>,

    /// Minimum milliseconds between any two lookups (default: 100)
    #[arg(long = "interval-ms", value_name = "MS", help_heading = "Performance")]
    pub interval_ms: Option<u64>,

    /// Per-lookup timeout, e.g. "5s" (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Stop issuing lookups after this long, e.g. "10m"
    #[arg(long = "deadline", value_name = "DURATION", help_heading = "Performance")]
    pub deadline: Option<String>,

    /// Query WHOIS when RDAP fails
    #[arg(long = "whois-fallback", help_heading = "Protocol")]
    pub whois_fallback: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Also write the results as CSV to FILE
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output Format")]
    pub output: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// How final results are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Fully resolved run settings.
#[derive(Debug)]
struct Settings {
    check: CheckConfig,
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "domain_sweep=debug,domain_sweep_lib=debug"
    } else {
        "error"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.file.is_none() {
        return Err("You must specify domain names or a file with --file".to_string());
    }

    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    if let Some(workers) = args.workers {
        if workers == 0 || workers > MAX_WORKER_COUNT {
            return Err(format!("Workers must be between 1 and {}", MAX_WORKER_COUNT));
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args, &load_env_config())?;
    let domains = collect_domains(&args)?;

    tracing::debug!(config = ?settings.check, inputs = domains.len(), "resolved settings");

    let checker = DomainChecker::with_config(settings.check.clone())?;

    if args.dry_run {
        let plan = checker.plan_batch(&domains)?;
        ui::print_plan(&Term::stdout(), &plan);
        return Ok(());
    }

    // Structured output keeps stdout clean; progress goes to stderr instead
    let progress_term = match settings.format {
        OutputFormat::Text => Term::stdout(),
        OutputFormat::Json | OutputFormat::Csv => Term::stderr(),
    };

    let plan_total = checker.plan_batch(&domains)?.total_units();
    ui::print_header(&progress_term, plan_total, &settings.check);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = ui::ProgressPrinter::new(progress_term.clone(), args.verbose);
    let render = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            printer.print(&event);
        }
    });

    let report = checker.check_domains_with_progress(&domains, Some(tx)).await?;
    let _ = render.await;

    match settings.format {
        OutputFormat::Text => ui::print_summary(&progress_term, &report.summary),
        OutputFormat::Json => println!("{}", render_json(&report.results)?),
        OutputFormat::Csv => print!("{}", render_csv(&report.results)),
    }

    if let Some(path) = &args.output {
        fs::write(path, render_csv(&report.results))
            .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
        eprintln!("Results saved to {}", path);
    }

    Ok(())
}

/// Resolve settings with precedence: CLI > env > config file(s) > defaults.
fn build_settings(args: &Args, env: &EnvConfig) -> Result<Settings, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let file_config = match args.config.as_ref().or(env.config.as_ref()) {
        Some(path) => config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?,
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        }),
    };

    let mut check = file_config.apply_to(CheckConfig::default());
    check = env.apply_to(check);
    check = apply_cli_args_to_config(check, args)?;
    check.validate()?;

    let format = if args.json {
        OutputFormat::Json
    } else if args.csv {
        OutputFormat::Csv
    } else {
        match file_config
            .output
            .as_ref()
            .and_then(|o| o.default_format.as_deref())
        {
            Some("json") => OutputFormat::Json,
            Some("csv") => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    };

    Ok(Settings { check, format })
}

fn apply_cli_args_to_config(
    mut config: CheckConfig,
    args: &Args,
) -> Result<CheckConfig, Box<dyn std::error::Error>> {
    if let Some(workers) = args.workers {
        config = config.with_worker_count(workers);
    }
    if let Some(interval_ms) = args.interval_ms {
        config = config.with_min_interval(Duration::from_millis(interval_ms));
    }
    if let Some(suffix) = &args.suffix {
        config = config.with_suffix(suffix.as_str());
    }
    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration_string(timeout).ok_or_else(|| {
            format!("Invalid timeout '{}'. Use format like '500ms', '5s', '2m'", timeout)
        })?;
        config = config.with_lookup_timeout(timeout);
    }
    if let Some(deadline) = &args.deadline {
        let deadline = parse_duration_string(deadline).ok_or_else(|| {
            format!("Invalid deadline '{}'. Use format like '30s', '10m'", deadline)
        })?;
        config = config.with_batch_deadline(Some(deadline));
    }
    if args.whois_fallback {
        config = config.with_whois_fallback(true);
    }
    Ok(config)
}

/// Positional names first, then file entries, in order.
fn collect_domains(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut domains = args.domains.clone();
    if let Some(file) = &args.file {
        domains.extend(read_domains_from_file(file)?);
    }
    Ok(domains)
}

fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let content = fs::read_to_string(path)?;
    let domains: Vec<String> = content
        .lines()
        .filter_map(|line| {
            // Handle inline comments
            let domain_part = line.split('#').next().unwrap_or("").trim();
            (!domain_part.is_empty()).then(|| domain_part.to_string())
        })
        .collect();

    if domains.is_empty() {
        return Err("No domains found in the file.".into());
    }

    Ok(domains)
}

fn render_json(results: &[CheckResult]) -> Result<String, serde_json::Error> {
    let records: Vec<CheckRecord> = results.iter().map(CheckResult::to_record).collect();
    serde_json::to_string_pretty(&records)
}

fn render_csv(results: &[CheckResult]) -> String {
    let mut out = String::from(CheckRecord::CSV_HEADER);
    out.push('\n');
    for result in results {
        out.push_str(&result.to_record().to_csv_line());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_sweep_lib::LookupOutcome;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_args() -> Args {
        Args {
            domains: vec!["example".to_string()],
            file: None,
            suffix: None,
            dry_run: false,
            workers: None,
            interval_ms: None,
            timeout: None,
            deadline: None,
            whois_fallback: false,
            json: false,
            csv: false,
            output: None,
            config: None,
            verbose: false,
        }
    }

    fn result(input: &str, outcome: LookupOutcome) -> CheckResult {
        CheckResult {
            original_input: input.to_string(),
            normalized_domain: format!("{}.com", input.trim()),
            outcome,
            worker_index: 0,
        }
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&create_test_args()).is_ok());

        let mut args = create_test_args();
        args.domains.clear();
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.json = true;
        args.csv = true;
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.workers = Some(0);
        assert!(validate_args(&args).is_err());
        args.workers = Some(101);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = create_test_args();
        args.workers = Some(3);
        args.interval_ms = Some(250);
        args.suffix = Some(".ORG".to_string());
        args.timeout = Some("3s".to_string());
        args.deadline = Some("1m".to_string());
        args.whois_fallback = true;

        let config = apply_cli_args_to_config(CheckConfig::default(), &args).unwrap();
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.min_interval, Duration::from_millis(250));
        assert_eq!(config.suffix, "org");
        assert_eq!(config.lookup_timeout, Duration::from_secs(3));
        assert_eq!(config.batch_deadline, Some(Duration::from_secs(60)));
        assert!(config.enable_whois_fallback);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut args = create_test_args();
        args.timeout = Some("whenever".to_string());
        assert!(apply_cli_args_to_config(CheckConfig::default(), &args).is_err());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[defaults]\nworkers = 4\ninterval_ms = 500\nsuffix = \"net\"\n\n[output]\ndefault_format = \"json\""
        )
        .unwrap();

        let mut args = create_test_args();
        args.config = Some(file.path().to_string_lossy().to_string());
        args.workers = Some(2);

        let env = EnvConfig {
            interval_ms: Some(200),
            workers: Some(8),
            ..Default::default()
        };

        let settings = build_settings(&args, &env).unwrap();
        assert_eq!(settings.check.worker_count, 2); // CLI
        assert_eq!(settings.check.min_interval, Duration::from_millis(200)); // env
        assert_eq!(settings.check.suffix, "net"); // file
        assert_eq!(settings.format, OutputFormat::Json); // file

        args.csv = true;
        let settings = build_settings(&args, &env).unwrap();
        assert_eq!(settings.format, OutputFormat::Csv);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let mut args = create_test_args();
        args.config = Some("/no/such/domain-sweep.toml".to_string());
        assert!(build_settings(&args, &EnvConfig::default()).is_err());
    }

    #[test]
    fn test_read_domains_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# header comment\nalpha\n\n  beta  # inline\n   \ngamma").unwrap();

        let domains = read_domains_from_file(&file.path().to_string_lossy()).unwrap();
        assert_eq!(domains, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_read_domains_from_empty_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here\n\n").unwrap();
        assert!(read_domains_from_file(&file.path().to_string_lossy()).is_err());
        assert!(read_domains_from_file("/no/such/list.txt").is_err());
    }

    #[test]
    fn test_render_csv() {
        let results = vec![
            result("foo", LookupOutcome::Available),
            result("bar", LookupOutcome::Registered),
            result("baz", LookupOutcome::LookupFailed("timed out, twice".to_string())),
        ];

        let csv = render_csv(&results);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Original Domain,Cleaned Domain,Status,Error");
        assert_eq!(lines[1], "foo,foo.com,Available,");
        assert_eq!(lines[2], "bar,bar.com,Not Available,");
        assert_eq!(lines[3], "baz,baz.com,Error,\"timed out, twice\"");
    }

    #[test]
    fn test_render_json_uses_row_field_names() {
        let json = render_json(&[result("foo", LookupOutcome::Registered)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["Original Domain"], "foo");
        assert_eq!(parsed[0]["Cleaned Domain"], "foo.com");
        assert_eq!(parsed[0]["Status"], "Not Available");
        assert_eq!(parsed[0]["Error"], "");
    }
}
