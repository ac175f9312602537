//! Core data models for image pull diagnostics

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{RootCause, Severity};

/// Parsed container image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub container_name: String,
    /// Image string exactly as written in the pod spec
    pub full_reference: String,
    /// e.g. "docker.io", "gcr.io", "registry.example.com:5000"
    pub registry: String,
    /// e.g. "library/nginx"
    pub repository: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,
    pub is_digest: bool,
}

/// Redacted projection of one image pull failure event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub message: String,
    pub count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Cluster event as handed over by the cluster-query layer, before filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub reason: String,
    pub message: String,
    /// Repeat count; `None` or `0` still means one occurrence
    pub count: Option<u32>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Container name and image from the pod spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
}

/// Container status fields relevant to image pull analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatusSnapshot {
    pub name: String,
    /// Reason of the current waiting state, if the container is waiting
    pub waiting_reason: Option<String>,
    /// Reason of the waiting state recorded as the last state
    pub last_waiting_reason: Option<String>,
    pub restart_count: i32,
}

/// Pod spec and status as fetched from the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub phase: Option<String>,
    pub containers: Vec<ContainerSpec>,
    pub init_containers: Vec<ContainerSpec>,
    pub container_statuses: Vec<ContainerStatusSnapshot>,
    pub init_container_statuses: Vec<ContainerStatusSnapshot>,
}

impl PodSnapshot {
    /// Container specs in declaration order, regular containers first
    pub fn all_containers(&self) -> impl Iterator<Item = &ContainerSpec> {
        self.containers.iter().chain(self.init_containers.iter())
    }

    /// Container statuses, regular containers first
    pub fn all_statuses(&self) -> impl Iterator<Item = &ContainerStatusSnapshot> {
        self.container_statuses
            .iter()
            .chain(self.init_container_statuses.iter())
    }
}

/// Diagnostic result for one pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticFinding {
    pub root_cause: RootCause,
    pub severity: Severity,

    pub pod_name: String,
    pub pod_namespace: String,
    /// Containers sharing this root cause
    pub affected_containers: Vec<String>,

    pub summary: String,
    pub details: String,
    pub remediation_steps: Vec<String>,

    /// One entry per container on the pod, not only the affected ones
    pub image_references: Vec<ImageReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventSummary>,

    pub is_transient: bool,
    pub failure_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_failure_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_duration: String,

    /// Reserved for registry probing; never filled in by the analysis engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_diagnostics: Option<NetworkDiagnostics>,
}

/// Results of registry connectivity probes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDiagnostics {
    pub registry_host: String,
    pub dns_resolution: Option<DnsResult>,
    pub tcp_connection: Option<TcpResult>,
    pub http_check: Option<HttpResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpResult {
    pub success: bool,
    /// Typically 443 for HTTPS registries
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

/// Scope of an analysis invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Pod,
    Workload,
    Namespace,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Pod => write!(f, "pod"),
            TargetType::Workload => write!(f, "workload"),
            TargetType::Namespace => write!(f, "namespace"),
        }
    }
}

/// Top-level result of one analysis invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,

    pub target_type: TargetType,
    pub target_name: String,
    pub namespace: String,

    pub summary: ReportSummary,
    pub findings: Vec<DiagnosticFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_log: Vec<AuditEntry>,
}

/// Aggregate counts over a report's findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_pods_analyzed: usize,
    pub pods_with_issues: usize,
    pub total_containers: usize,
    pub containers_with_issues: usize,

    pub root_cause_breakdown: BTreeMap<RootCause, usize>,

    pub high_severity_count: usize,
    pub medium_severity_count: usize,
    pub low_severity_count: usize,
}

/// Record of a single cluster API access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// "pods", "events", "namespaces", "secrets"
    pub resource_type: String,
    pub resource_name: String,
    pub namespace: String,
    /// "get" or "list"
    pub operation: String,
}
