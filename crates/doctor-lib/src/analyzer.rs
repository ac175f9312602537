//! Cluster-backed analysis orchestration
//!
//! This module provides:
//! - [`ClusterSource`], the async seam to the Kubernetes API
//! - [`PodAnalyzer`], running the diagnostic pipeline for one pod under a
//!   single overall deadline
//! - Bulk namespace scanning for common pod problems

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::analysis::{affected_containers, assemble_pod_report, summarize};
use crate::audit::AuditLogger;
use crate::config::AnalysisConfig;
use crate::error::{ClusterError, DiagnosticError, Result};
use crate::models::{AnalysisReport, PodSnapshot, RawEvent, TargetType};
use crate::validation::{validate_namespace, validate_pod_name};

/// Restart count above which a container is reported as unstable
pub const HIGH_RESTART_THRESHOLD: i32 = 5;

/// Read access to the cluster objects the analysis needs
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// Fetch a single pod
    async fn get_pod(&self, namespace: &str, name: &str)
        -> std::result::Result<PodSnapshot, ClusterError>;

    /// List events whose involved object is the given pod
    async fn list_pod_events(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> std::result::Result<Vec<RawEvent>, ClusterError>;

    async fn list_namespaces(&self) -> std::result::Result<Vec<String>, ClusterError>;

    async fn list_pods(&self, namespace: &str)
        -> std::result::Result<Vec<PodSnapshot>, ClusterError>;
}

/// Await `fut` unless the shared deadline passes first
async fn bounded<T, F>(
    deadline: Instant,
    timeout: Duration,
    operation: &str,
    fut: F,
) -> Result<std::result::Result<T, ClusterError>>
where
    F: Future<Output = std::result::Result<T, ClusterError>>,
{
    timeout_at(deadline, fut)
        .await
        .map_err(|_| DiagnosticError::Timeout {
            operation: operation.to_string(),
            timeout,
        })
}

/// Deadline `timeout` from now, rejecting timeouts the clock cannot represent
fn deadline_after(timeout: Duration) -> Result<Instant> {
    Instant::now().checked_add(timeout).ok_or_else(|| {
        DiagnosticError::invalid_input("timeout", format!("timeout {:?} is too large", timeout))
    })
}

/// Context of a cluster request, used to translate its failure
struct Request<'a> {
    operation: &'a str,
    resource: &'a str,
    verb: &'a str,
    namespace: &'a str,
    pod_name: &'a str,
}

impl Request<'_> {
    fn map_err(&self, err: ClusterError) -> DiagnosticError {
        match err {
            ClusterError::NotFound => DiagnosticError::NotFound {
                namespace: self.namespace.to_string(),
                pod_name: self.pod_name.to_string(),
            },
            ClusterError::Forbidden => DiagnosticError::PermissionDenied {
                resource: self.resource.to_string(),
                verb: self.verb.to_string(),
                namespace: self.namespace.to_string(),
            },
            ClusterError::Other(source) => DiagnosticError::Cluster {
                operation: self.operation.to_string(),
                source,
            },
        }
    }
}

/// Runs image pull diagnostics against a [`ClusterSource`]
pub struct PodAnalyzer<S> {
    source: S,
    audit: AuditLogger,
}

impl<S: ClusterSource> PodAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            audit: AuditLogger::new(),
        }
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Diagnose a single pod.
    ///
    /// A pod without image pull failures yields a report with zero findings.
    /// No partial report is returned when any step fails.
    pub async fn analyze_pod(&self, config: &AnalysisConfig) -> Result<AnalysisReport> {
        validate_namespace(&config.namespace)?;
        validate_pod_name(&config.pod_name)?;

        let namespace = config.namespace.as_str();
        let pod_name = config.pod_name.as_str();
        let deadline = deadline_after(config.timeout)?;
        let audit_mark = self.audit.len();

        self.audit
            .log_analysis_start(TargetType::Pod, pod_name, namespace);

        let get_pod = Request {
            operation: "GetPod",
            resource: "pods",
            verb: "get",
            namespace,
            pod_name,
        };
        self.audit.log_pod_get(pod_name, namespace);
        let pod = bounded(
            deadline,
            config.timeout,
            get_pod.operation,
            self.source.get_pod(namespace, pod_name),
        )
        .await?
        .map_err(|e| get_pod.map_err(e))?;

        let events = if affected_containers(&pod).is_empty() {
            debug!(pod = %pod_name, namespace = %namespace, "No container is failing to pull its image");
            Vec::new()
        } else {
            let list_events = Request {
                operation: "GetPodEvents",
                resource: "events",
                verb: "list",
                namespace,
                pod_name,
            };
            self.audit.log_event_list(namespace);
            let raw = bounded(
                deadline,
                config.timeout,
                list_events.operation,
                self.source.list_pod_events(namespace, pod_name),
            )
            .await?
            .map_err(|e| list_events.map_err(e))?;

            summarize(&raw, config.redact, Utc::now())
        };

        let mut report = assemble_pod_report(&pod, &events, Utc::now())?;
        if config.include_audit_log {
            report.audit_log = self.audit.entries_since(audit_mark);
        }

        self.audit.log_analysis_complete(
            TargetType::Pod,
            pod_name,
            namespace,
            report.findings.len(),
        );

        Ok(report)
    }

    /// Scan namespaces for pods with common problems.
    ///
    /// A namespace whose pods cannot be listed is skipped with a warning; a
    /// passed deadline aborts the whole scan.
    pub async fn scan(&self, scope: &ScanScope, timeout: Duration) -> Result<ScanResult> {
        let deadline = deadline_after(timeout)?;

        let namespaces = match scope {
            ScanScope::Namespace(ns) => {
                validate_namespace(ns)?;
                vec![ns.clone()]
            }
            ScanScope::AllNamespaces => {
                let request = Request {
                    operation: "ListNamespaces",
                    resource: "namespaces",
                    verb: "list",
                    namespace: "",
                    pod_name: "",
                };
                self.audit.log_namespace_list();
                bounded(
                    deadline,
                    timeout,
                    request.operation,
                    self.source.list_namespaces(),
                )
                .await?
                .map_err(|e| request.map_err(e))?
            }
        };

        let mut result = ScanResult::default();

        for namespace in namespaces {
            debug!(namespace = %namespace, "Checking namespace");
            self.audit.log_pod_list(&namespace);

            let pods = match bounded(
                deadline,
                timeout,
                "ListPods",
                self.source.list_pods(&namespace),
            )
            .await?
            {
                Ok(pods) => pods,
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Failed to list pods, skipping namespace");
                    result.skipped_namespaces.push(namespace);
                    continue;
                }
            };

            debug!(namespace = %namespace, pods = pods.len(), "Listed pods");
            result.total_pods += pods.len();
            result
                .issues
                .extend(pods.iter().filter_map(detect_pod_issue));
            result.namespaces_scanned.push(namespace);
        }

        info!(
            namespaces = result.namespaces_scanned.len(),
            skipped = result.skipped_namespaces.len(),
            pods = result.total_pods,
            issues = result.issues.len(),
            "Cluster check complete"
        );

        Ok(result)
    }
}

/// Namespaces covered by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanScope {
    AllNamespaces,
    Namespace(String),
}

/// Kind of problem found by a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueType {
    ImagePullBackOff,
    CrashLoopBackOff,
    ConfigError,
    InvalidImage,
    HighRestarts,
    PodFailed,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IssueType::ImagePullBackOff => "ImagePullBackOff",
            IssueType::CrashLoopBackOff => "CrashLoopBackOff",
            IssueType::ConfigError => "ConfigError",
            IssueType::InvalidImage => "InvalidImage",
            IssueType::HighRestarts => "HighRestarts",
            IssueType::PodFailed => "PodFailed",
        };
        write!(f, "{}", name)
    }
}

/// A pod flagged by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIssue {
    pub namespace: String,
    pub pod_name: String,
    pub issue_type: IssueType,
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub namespaces_scanned: Vec<String>,
    pub skipped_namespaces: Vec<String>,
    pub total_pods: usize,
    pub issues: Vec<PodIssue>,
}

impl ScanResult {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issue count per namespace, in scan order
    pub fn issues_by_namespace(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for issue in &self.issues {
            match counts.iter_mut().find(|(ns, _)| *ns == issue.namespace) {
                Some((_, count)) => *count += 1,
                None => counts.push((issue.namespace.as_str(), 1)),
            }
        }
        counts
    }
}

/// First problem found on a pod, if any.
///
/// Container states are checked in order before the pod phase; only
/// regular containers are inspected.
pub fn detect_pod_issue(pod: &PodSnapshot) -> Option<PodIssue> {
    let issue = |issue_type| PodIssue {
        namespace: pod.namespace.clone(),
        pod_name: pod.name.clone(),
        issue_type,
        phase: pod.phase.clone(),
    };

    for status in &pod.container_statuses {
        let waiting = match status.waiting_reason.as_deref() {
            Some("ImagePullBackOff") | Some("ErrImagePull") => Some(IssueType::ImagePullBackOff),
            Some("CrashLoopBackOff") => Some(IssueType::CrashLoopBackOff),
            Some("CreateContainerConfigError") => Some(IssueType::ConfigError),
            Some("InvalidImageName") => Some(IssueType::InvalidImage),
            _ => None,
        };
        if let Some(issue_type) = waiting {
            return Some(issue(issue_type));
        }

        if status.restart_count > HIGH_RESTART_THRESHOLD {
            return Some(issue(IssueType::HighRestarts));
        }
    }

    match pod.phase.as_deref() {
        Some("Failed") | Some("Unknown") => Some(issue(IssueType::PodFailed)),
        _ => None,
    }
}
