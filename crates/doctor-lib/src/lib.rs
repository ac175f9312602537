//! Diagnostic library for Kubernetes image pull failures
//!
//! This crate provides the core functionality for:
//! - Image reference parsing
//! - Failure event aggregation and root cause classification
//! - Remediation guidance and report assembly
//! - Cluster-backed analysis behind the `ClusterSource` trait
//! - Input validation, secret redaction and access auditing

pub mod analysis;
pub mod analyzer;
pub mod audit;
pub mod config;
pub mod error;
pub mod image_ref;
pub mod models;
pub mod redaction;
pub mod validation;

pub use analysis::{RootCause, Severity};
pub use analyzer::{
    detect_pod_issue, ClusterSource, IssueType, PodAnalyzer, PodIssue, ScanResult, ScanScope,
};
pub use audit::AuditLogger;
pub use config::AnalysisConfig;
pub use error::{ClusterError, DiagnosticError, ErrorKind};
pub use models::*;

/// Version stamped into every report
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
