//! Terminal rendering for domain-sweep.
//!
//! Live progress lines, the dry-run partition plan, and the closing summary.
//! Uses only the `console` crate. Nothing here feeds back into the engine.

use console::{pad_str, style, Alignment, StyledObject, Term};
use domain_sweep_lib::{BatchPlan, BatchSummary, CheckConfig, DomainStatus, ProgressEvent};

const DOMAIN_WIDTH: usize = 30;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(term: &Term, domain_count: usize, config: &CheckConfig) {
    let _ = term.write_line(&format!(
        "{} {} {}",
        style("domain-sweep").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking {} domain{}",
            domain_count,
            if domain_count == 1 { "" } else { "s" }
        ))
        .dim(),
    ));

    let mut meta_parts = vec![
        format!("Workers: {}", config.worker_count),
        format!("Interval: {}ms", config.min_interval.as_millis()),
        format!("Suffix: .{}", config.suffix),
    ];
    if let Some(deadline) = config.batch_deadline {
        meta_parts.push(format!("Deadline: {}s", deadline.as_secs()));
    }
    if config.enable_whois_fallback {
        meta_parts.push("WHOIS fallback".to_string());
    }

    let _ = term.write_line(&style(meta_parts.join(" | ")).dim().to_string());
    let _ = term.write_line("");
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Writes one line per completed domain.
pub struct ProgressPrinter {
    term: Term,
    show_errors: bool,
}

impl ProgressPrinter {
    pub fn new(term: Term, show_errors: bool) -> Self {
        Self { term, show_errors }
    }

    /// Render one progress event, e.g. `[ 42%] w03  75%  foo.com  AVAILABLE`.
    pub fn print(&self, event: &ProgressEvent) {
        let result = &event.result;
        let padded_domain = pad_str(
            &result.normalized_domain,
            DOMAIN_WIDTH,
            Alignment::Left,
            Some(".."),
        );

        let mut line = format!(
            "  {} {} {}  {}  {}",
            style(format!("[{}]", format_percent(event.overall))).dim(),
            style(format!("w{:02}", event.worker_index)).cyan(),
            style(format_percent(event.worker_fraction)).dim(),
            padded_domain,
            status_label(result.status()),
        );

        if self.show_errors {
            if let Some(reason) = result.outcome.error_message() {
                line.push_str(&format!("  {}", style(brief(reason)).dim()));
            }
        }

        let _ = self.term.write_line(&line);
    }
}

/// Right-aligned percentage of a `[0, 1]` fraction.
pub fn format_percent(fraction: f64) -> String {
    format!("{:>3.0}%", (fraction.clamp(0.0, 1.0) * 100.0).floor())
}

fn status_label(status: DomainStatus) -> StyledObject<&'static str> {
    match status {
        DomainStatus::Available => style("AVAILABLE").green().bold(),
        DomainStatus::NotAvailable => style("TAKEN").red().bold(),
        DomainStatus::Error => style("ERROR").yellow(),
    }
}

/// Single-line, length-capped error reason.
fn brief(reason: &str) -> String {
    let first_line = reason.lines().next().unwrap_or_default();
    if first_line.chars().count() > 60 {
        let cut: String = first_line.chars().take(57).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

// ── Dry run ──────────────────────────────────────────────────────────────────

/// Show which worker would check which domain.
pub fn print_plan(term: &Term, plan: &BatchPlan) {
    let _ = term.write_line(&format!(
        "{} {} domain{} across {} worker{}",
        style("Plan:").bold(),
        plan.total_units(),
        if plan.total_units() == 1 { "" } else { "s" },
        plan.active_workers().count(),
        if plan.active_workers().count() == 1 { "" } else { "s" },
    ));

    for worker_index in plan.active_workers() {
        let domains: Vec<&str> = plan.partitions[worker_index]
            .iter()
            .map(|unit| unit.normalized_domain.as_str())
            .collect();
        let _ = term.write_line(&format!(
            "  {} {}",
            style(format!("w{:02}", worker_index)).cyan(),
            domains.join(", ")
        ));
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

pub fn print_summary(term: &Term, summary: &BatchSummary) {
    let _ = term.write_line("");
    let _ = term.write_line(&format!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    ));
    let _ = term.write_line(&format!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(summary.total).bold(),
        if summary.total == 1 { "" } else { "s" },
        summary.elapsed.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} taken", summary.not_available)).red(),
        style("|").dim(),
        style(format!("{} errors", summary.errors)).yellow(),
    ));
}
