//! Audit trail of cluster API access
//!
//! Every cluster read is emitted as a structured `tracing` event and kept as
//! an [`AuditEntry`] so it can be attached to the final report.

use std::sync::Mutex;

use chrono::Utc;
use tracing::info;

use crate::models::{AuditEntry, TargetType};

/// Structured logger for cluster access
#[derive(Debug, Default)]
pub struct AuditLogger {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cluster resource access
    pub fn log_resource_access(
        &self,
        resource_type: &str,
        resource_name: &str,
        namespace: &str,
        operation: &str,
    ) {
        info!(
            event = "cluster_access",
            resource_type = %resource_type,
            resource_name = %resource_name,
            namespace = %namespace,
            operation = %operation,
            "Cluster resource accessed"
        );

        let entry = AuditEntry {
            timestamp: Utc::now(),
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            namespace: namespace.to_string(),
            operation: operation.to_string(),
        };

        // A poisoned lock only means another thread panicked mid-push
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
    }

    pub fn log_pod_get(&self, pod_name: &str, namespace: &str) {
        self.log_resource_access("pods", pod_name, namespace, "get");
    }

    pub fn log_pod_list(&self, namespace: &str) {
        self.log_resource_access("pods", "", namespace, "list");
    }

    pub fn log_event_list(&self, namespace: &str) {
        self.log_resource_access("events", "", namespace, "list");
    }

    pub fn log_namespace_list(&self) {
        self.log_resource_access("namespaces", "", "", "list");
    }

    /// Secret reads happen only when validating imagePullSecrets
    pub fn log_secret_get(&self, secret_name: &str, namespace: &str) {
        self.log_resource_access("secrets", secret_name, namespace, "get");
    }

    pub fn log_analysis_start(&self, target_type: TargetType, target_name: &str, namespace: &str) {
        info!(
            event = "analysis_start",
            target_type = %target_type,
            target_name = %target_name,
            namespace = %namespace,
            "Analysis started"
        );
    }

    pub fn log_analysis_complete(
        &self,
        target_type: TargetType,
        target_name: &str,
        namespace: &str,
        findings_count: usize,
    ) {
        info!(
            event = "analysis_complete",
            target_type = %target_type,
            target_name = %target_name,
            namespace = %namespace,
            findings_count = findings_count,
            "Analysis complete"
        );
    }

    /// Snapshot of all recorded entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of entries recorded so far
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries recorded after the first `mark` entries
    pub fn entries_since(&self, mark: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(mark..).map(<[AuditEntry]>::to_vec).unwrap_or_default()
    }
}
