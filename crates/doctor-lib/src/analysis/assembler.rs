//! Finding and report assembly
//!
//! This module provides:
//! - Affected container detection and image reference extraction
//! - Construction and validation of a [`DiagnosticFinding`]
//! - [`ReportBuilder`] folding findings into a consistent [`ReportSummary`]

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::classifier::{classify, Severity};
use super::events::{analyze, TRANSIENT_MAX_FAILURES};
use super::remediation;
use crate::error::{DiagnosticError, Result};
use crate::image_ref;
use crate::models::{
    AnalysisReport, DiagnosticFinding, EventSummary, ImageReference, PodSnapshot,
    ReportSummary, TargetType,
};

/// Waiting reasons that mark a container as affected
pub const IMAGE_PULL_WAITING_REASONS: &[&str] = &["ImagePullBackOff", "ErrImagePull"];

fn is_image_pull_reason(reason: Option<&String>) -> bool {
    reason.is_some_and(|r| IMAGE_PULL_WAITING_REASONS.contains(&r.as_str()))
}

/// Names of containers stuck pulling their image, regular containers first
pub fn affected_containers(pod: &PodSnapshot) -> Vec<String> {
    pod.all_statuses()
        .filter(|s| {
            is_image_pull_reason(s.waiting_reason.as_ref())
                || is_image_pull_reason(s.last_waiting_reason.as_ref())
        })
        .map(|s| s.name.clone())
        .collect()
}

/// Parse the image of every container on the pod.
///
/// Containers with an unparsable image are skipped.
pub fn image_references(pod: &PodSnapshot) -> Vec<ImageReference> {
    pod.all_containers()
        .filter_map(|c| match image_ref::parse(&c.name, &c.image) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(
                    pod = %pod.name,
                    namespace = %pod.namespace,
                    container = %c.name,
                    error = %e,
                    "Skipping container with unparsable image"
                );
                None
            }
        })
        .collect()
}

/// Reference of the first affected container in declaration order.
///
/// Falls back to the first reference when no affected container has one;
/// the remediation steps then describe the pod's first image, which is an
/// approximation.
pub fn primary_reference<'a>(
    references: &'a [ImageReference],
    affected: &[String],
) -> Option<&'a ImageReference> {
    references
        .iter()
        .find(|r| affected.contains(&r.container_name))
        .or_else(|| references.first())
}

/// Render a duration with one unit of sub-precision, truncating
pub fn format_failure_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);

    if total < 60 {
        format!("{} seconds", total)
    } else if total < 3600 {
        format!("{} minutes {} seconds", total / 60, total % 60)
    } else {
        format!("{} hours {} minutes", total / 3600, (total % 3600) / 60)
    }
}

impl DiagnosticFinding {
    /// Check the finding's consistency rules
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.pod_name.is_empty() {
            return Err("pod name cannot be empty".to_string());
        }
        if self.pod_namespace.is_empty() {
            return Err("pod namespace cannot be empty".to_string());
        }
        if self.affected_containers.is_empty() {
            return Err("at least one affected container is required".to_string());
        }
        if self.remediation_steps.is_empty() {
            return Err("at least one remediation step is required".to_string());
        }
        if !self.is_transient && self.failure_count < TRANSIENT_MAX_FAILURES {
            return Err(format!(
                "non-transient failure must have at least {} failures, got {}",
                TRANSIENT_MAX_FAILURES, self.failure_count
            ));
        }
        Ok(())
    }
}

/// Build the finding for one pod from its failure events
pub fn build_finding(pod: &PodSnapshot, events: &[EventSummary]) -> Result<DiagnosticFinding> {
    let affected = affected_containers(pod);
    if affected.is_empty() {
        return Err(DiagnosticError::NoIssueDetected {
            namespace: pod.namespace.clone(),
            pod_name: pod.name.clone(),
        });
    }

    let analysis = analyze(events);
    let root_cause = classify(events, pod, &analysis);
    let references = image_references(pod);
    let steps = remediation::generate(root_cause, primary_reference(&references, &affected));

    let details = match analysis.error_messages.as_slice() {
        [] => "Image pull failures detected.".to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{} (and {} more events)", first, rest.len()),
    };

    let failure_duration = match (analysis.first_failure_time, analysis.last_failure_time) {
        (Some(_), Some(_)) => format_failure_duration(analysis.span()),
        _ => String::new(),
    };

    let finding = DiagnosticFinding {
        root_cause,
        severity: root_cause.severity(),
        pod_name: pod.name.clone(),
        pod_namespace: pod.namespace.clone(),
        affected_containers: affected,
        summary: format!("{}: {}", root_cause, root_cause.description()),
        details,
        remediation_steps: steps,
        image_references: references,
        events: events.to_vec(),
        is_transient: analysis.is_transient,
        failure_count: analysis.failure_count,
        first_failure_time: analysis.first_failure_time,
        last_failure_time: analysis.last_failure_time,
        failure_duration,
        network_diagnostics: None,
    };

    finding
        .validate()
        .map_err(DiagnosticError::InvariantViolation)?;

    debug!(
        pod = %finding.pod_name,
        namespace = %finding.pod_namespace,
        root_cause = %finding.root_cause,
        severity = %finding.severity,
        failure_count = finding.failure_count,
        "Built diagnostic finding"
    );

    Ok(finding)
}

/// Accumulates findings into a report with a consistent summary
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    target_type: TargetType,
    target_name: String,
    namespace: String,
    generated_at: DateTime<Utc>,
    summary: ReportSummary,
    findings: Vec<DiagnosticFinding>,
}

impl ReportBuilder {
    pub fn new(
        target_type: TargetType,
        target_name: impl Into<String>,
        namespace: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target_type,
            target_name: target_name.into(),
            namespace: namespace.into(),
            generated_at,
            summary: ReportSummary::default(),
            findings: Vec::new(),
        }
    }

    /// Count one analyzed pod and its containers
    pub fn with_pod(mut self, total_containers: usize) -> Self {
        self.summary.total_pods_analyzed += 1;
        self.summary.total_containers += total_containers;
        self
    }

    pub fn with_finding(mut self, finding: DiagnosticFinding) -> Self {
        self.summary.pods_with_issues += 1;
        self.summary.containers_with_issues += finding.affected_containers.len();
        *self
            .summary
            .root_cause_breakdown
            .entry(finding.root_cause)
            .or_insert(0) += 1;

        match finding.severity {
            Severity::High => self.summary.high_severity_count += 1,
            Severity::Medium => self.summary.medium_severity_count += 1,
            Severity::Low => self.summary.low_severity_count += 1,
        }

        self.findings.push(finding);
        self
    }

    pub fn build(self) -> AnalysisReport {
        AnalysisReport {
            generated_at: self.generated_at,
            tool_version: crate::TOOL_VERSION.to_string(),
            target_type: self.target_type,
            target_name: self.target_name,
            namespace: self.namespace,
            summary: self.summary,
            findings: self.findings,
            audit_log: Vec::new(),
        }
    }
}

/// Run the synchronous pipeline for one pod.
///
/// A pod without image pull failures yields a report with zero findings.
pub fn assemble_pod_report(
    pod: &PodSnapshot,
    events: &[EventSummary],
    generated_at: DateTime<Utc>,
) -> Result<AnalysisReport> {
    let builder = ReportBuilder::new(TargetType::Pod, &pod.name, &pod.namespace, generated_at)
        .with_pod(pod.all_containers().count());

    match build_finding(pod, events) {
        Ok(finding) => Ok(builder.with_finding(finding).build()),
        Err(e) if e.is_benign() => Ok(builder.build()),
        Err(e) => Err(e),
    }
}
