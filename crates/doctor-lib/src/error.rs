//! Error types for image pull diagnostics

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the diagnostic engine and the analyzer
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("pod '{pod_name}' not found in namespace '{namespace}'")]
    NotFound { namespace: String, pod_name: String },

    #[error("permission denied: cannot {verb} {resource} in namespace '{namespace}'")]
    PermissionDenied {
        resource: String,
        verb: String,
        namespace: String,
    },

    #[error("operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// No container of the pod is in an image pull failure state
    #[error("no image pull issue detected for pod '{pod_name}' in namespace '{namespace}'")]
    NoIssueDetected { namespace: String, pod_name: String },

    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A finding broke one of its own consistency rules
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("cluster request '{operation}' failed: {source}")]
    Cluster {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Fieldless discriminant of [`DiagnosticError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Timeout,
    NoIssueDetected,
    InvalidInput,
    InvariantViolation,
    Cluster,
}

impl DiagnosticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosticError::NotFound { .. } => ErrorKind::NotFound,
            DiagnosticError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            DiagnosticError::Timeout { .. } => ErrorKind::Timeout,
            DiagnosticError::NoIssueDetected { .. } => ErrorKind::NoIssueDetected,
            DiagnosticError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DiagnosticError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            DiagnosticError::Cluster { .. } => ErrorKind::Cluster,
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        DiagnosticError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Benign outcome rather than a failure
    pub fn is_benign(&self) -> bool {
        matches!(self, DiagnosticError::NoIssueDetected { .. })
    }
}

/// Failure reported by a [`crate::analyzer::ClusterSource`]
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("resource not found")]
    NotFound,

    #[error("access forbidden")]
    Forbidden,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DiagnosticError>;
