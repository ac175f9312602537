//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use doctor_lib::{AnalysisReport, ScanResult, Severity};
use tabled::{settings::Style, Table, Tabled};

/// Recent events shown per finding in text output
const MAX_DISPLAYED_EVENTS: usize = 5;

/// Event messages longer than this are truncated in text output
const MAX_MESSAGE_WIDTH: usize = 100;

const DOCS_URL: &str = "https://kubernetes.io/docs/concepts/containers/images/";

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report (default)
    #[default]
    Text,
    /// JSON format
    Json,
    /// YAML format
    #[value(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    /// Parse a format name as found in configuration
    pub fn parse(name: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(name, true).map_err(|_| {
            anyhow::anyhow!(
                "unsupported format '{}': must be one of: text, json, yaml",
                name
            )
        })
    }
}

/// Render a report in the requested format
pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).context("Failed to serialize report as YAML")
        }
    }
}

fn header(title: &str) -> String {
    let divider = "=".repeat(title.len());
    format!("{}\n{}\n{}\n", divider.bold(), title.bold(), divider.bold())
}

fn section(title: &str) -> String {
    format!("{}\n{}\n", title.bold(), "-".repeat(title.len()).dimmed())
}

fn field(label: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{}:\n", label.blue())
    } else {
        format!("{}: {}\n", label.blue(), value)
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.green(),
    }
}

/// Shorten a message to `max` characters, ending in "..."
pub fn truncate(message: &str, max: usize) -> String {
    if message.chars().count() <= max {
        return message.to_string();
    }
    let kept: String = message.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Human-readable rendering of an analysis report
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    out.push_str(&header("IMAGEPULLBACKOFF ANALYSIS REPORT"));
    out.push('\n');
    out.push_str(&field(
        "Target",
        &format!("{}/{}", report.namespace, report.target_name),
    ));
    out.push_str(&field("Type", &report.target_type.to_string()));
    out.push_str(&field(
        "Generated At",
        &report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ));
    out.push('\n');

    out.push_str(&section("SUMMARY"));
    out.push_str(&field("Pods Analyzed", &summary.total_pods_analyzed.to_string()));
    out.push_str(&field("Pods with Issues", &summary.pods_with_issues.to_string()));

    if summary.pods_with_issues == 0 {
        out.push('\n');
        out.push_str(&format!("{}\n", "No ImagePullBackOff issues found.".green()));
        return out;
    }

    if !summary.root_cause_breakdown.is_empty() {
        out.push_str(&field("By Root Cause", ""));
        for (cause, count) in &summary.root_cause_breakdown {
            out.push_str(&format!("  - {}: {}\n", cause, count));
        }
    }

    out.push_str(&field("By Severity", ""));
    for (severity, count) in [
        (Severity::High, summary.high_severity_count),
        (Severity::Medium, summary.medium_severity_count),
        (Severity::Low, summary.low_severity_count),
    ] {
        if count > 0 {
            out.push_str(&format!("  - {}: {}\n", severity_label(severity), count));
        }
    }
    out.push('\n');

    for (i, finding) in report.findings.iter().enumerate() {
        out.push_str(&section(&format!("FINDING #{}", i + 1)));
        out.push_str(&field("Root Cause", finding.root_cause.code()));
        out.push_str(&field(
            "Severity",
            &severity_label(finding.severity).to_string(),
        ));
        out.push_str(&field(
            "Pod",
            &format!("{}/{}", finding.pod_namespace, finding.pod_name),
        ));
        out.push_str(&field(
            "Affected Containers",
            &finding.affected_containers.join(", "),
        ));
        out.push_str(&field("Summary", &finding.summary));
        if !finding.details.is_empty() {
            out.push_str(&field("Details", &finding.details));
        }
        if finding.failure_count > 0 {
            out.push_str(&field("Failure Count", &finding.failure_count.to_string()));
        }
        if !finding.failure_duration.is_empty() {
            out.push_str(&field("Failure Duration", &finding.failure_duration));
        }
        let status = if finding.is_transient {
            "TRANSIENT (may self-resolve)".yellow()
        } else {
            "PERSISTENT (requires action)".red()
        };
        out.push_str(&field("Status", &status.to_string()));

        if !finding.image_references.is_empty() {
            out.push_str(&format!("\n{}\n", "IMAGE REFERENCES:".bold()));
            for image in &finding.image_references {
                out.push_str(&format!("  Container: {}\n", image.container_name));
                out.push_str(&format!("    Image: {}\n", image.full_reference));
                out.push_str(&format!("    Registry: {}\n", image.registry));
                out.push_str(&format!("    Repository: {}\n", image.repository));
                if !image.tag.is_empty() {
                    out.push_str(&format!("    Tag: {}\n", image.tag));
                }
                if !image.digest.is_empty() {
                    out.push_str(&format!("    Digest: {}\n", image.digest));
                }
            }
        }

        out.push_str(&format!("\n{}\n", "REMEDIATION STEPS:".bold()));
        for (n, step) in finding.remediation_steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", n + 1, step));
        }

        if !finding.events.is_empty() {
            let shown = finding.events.len().min(MAX_DISPLAYED_EVENTS);
            out.push_str(&format!(
                "\n{} (showing last {})\n",
                "RECENT EVENTS:".bold(),
                shown
            ));
            for event in &finding.events[finding.events.len() - shown..] {
                out.push_str(&format!(
                    "  [{}] {}: {}\n",
                    event.timestamp.format("%H:%M:%S"),
                    event.reason,
                    truncate(&event.message, MAX_MESSAGE_WIDTH)
                ));
            }
        }

        out.push('\n');
    }

    out.push_str(&format!("{}\n", "=".repeat(80).dimmed()));
    out.push_str(&format!(
        "{}\n",
        format!("For more information, visit: {}", DOCS_URL).dimmed()
    ));
    out
}

/// Row for the check results table
#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Issue")]
    issue: String,
    #[tabled(rename = "Phase")]
    phase: String,
}

/// Table of pods flagged by a scan, or `None` when nothing was found
pub fn issues_table(result: &ScanResult) -> Option<String> {
    if result.issues.is_empty() {
        return None;
    }

    let rows: Vec<IssueRow> = result
        .issues
        .iter()
        .map(|issue| IssueRow {
            namespace: issue.namespace.clone(),
            pod: issue.pod_name.clone(),
            issue: issue.issue_type.to_string(),
            phase: issue.phase.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    Some(Table::new(rows).with(Style::rounded()).to_string())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
