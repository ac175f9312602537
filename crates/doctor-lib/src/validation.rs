//! Validation of user-supplied Kubernetes names
//!
//! Names are checked before any cluster call is made:
//! - non-empty and at most 253 characters
//! - free of shell, path and quoting metacharacters
//! - namespaces are a single DNS-1123 label
//! - pod and workload names are dot-separated DNS-1123 labels

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DiagnosticError, Result};

/// Maximum length of a Kubernetes resource name
pub const MAX_NAME_LENGTH: usize = 253;

static DNS1123_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .unwrap_or_else(|_| unreachable!("label pattern must compile"))
});

/// Substrings never legitimate in a Kubernetes name
const INJECTION_PATTERNS: &[&str] = &[
    "..", "/", "\\", "$", "`", ";", "|", "&", "<", ">", "*", "?", "[", "]", "{", "}", "(", ")",
    "'", "\"", "\n", "\r", "\t", "\0",
];

fn contains_injection_pattern(input: &str) -> bool {
    INJECTION_PATTERNS.iter().any(|p| input.contains(p))
}

fn check_common(field: &str, label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DiagnosticError::invalid_input(
            field,
            format!("{} cannot be empty", label),
        ));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(DiagnosticError::invalid_input(
            field,
            format!(
                "{} exceeds maximum length of {} characters",
                label, MAX_NAME_LENGTH
            ),
        ));
    }

    if contains_injection_pattern(value) {
        return Err(DiagnosticError::invalid_input(
            field,
            format!("{} contains invalid characters or injection patterns", label),
        ));
    }

    Ok(())
}

fn check_labels(field: &str, label: &str, value: &str) -> Result<()> {
    match value
        .split('.')
        .find(|part| !DNS1123_LABEL_REGEX.is_match(part))
    {
        Some(bad) => Err(DiagnosticError::invalid_input(
            field,
            format!(
                "{} label '{}' is invalid: must consist of lowercase alphanumeric characters or '-', \
                 and must start and end with an alphanumeric character",
                label, bad
            ),
        )),
        None => Ok(()),
    }
}

pub fn validate_namespace(namespace: &str) -> Result<()> {
    check_common("namespace", "namespace", namespace)?;

    if !DNS1123_LABEL_REGEX.is_match(namespace) {
        return Err(DiagnosticError::invalid_input(
            "namespace",
            "namespace must consist of lowercase alphanumeric characters or '-', \
             and must start and end with an alphanumeric character",
        ));
    }

    Ok(())
}

pub fn validate_pod_name(pod_name: &str) -> Result<()> {
    check_common("pod_name", "pod name", pod_name)?;
    check_labels("pod_name", "pod name", pod_name)
}

/// Deployments, statefulsets and other workloads share the pod name rules
pub fn validate_workload_name(workload_name: &str) -> Result<()> {
    check_common("workload_name", "workload name", workload_name)?;
    check_labels("workload_name", "workload name", workload_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_valid_namespaces() {
        for ns in ["default", "kube-system", "team-a1", "x"] {
            assert!(validate_namespace(ns).is_ok(), "{ns}");
        }
    }

    #[test]
    fn test_invalid_namespaces() {
        for ns in ["", "Prod", "-lead", "trail-", "a.b", "../etc", "ns;rm", "ns with space"] {
            let err = validate_namespace(ns).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{ns}");
        }
    }

    #[test]
    fn test_pod_names_allow_dotted_labels() {
        assert!(validate_pod_name("web-7d9f8b6c5-x2kq9").is_ok());
        assert!(validate_pod_name("app.v1.example").is_ok());
        assert!(validate_pod_name("app..v1").is_err());
        assert!(validate_pod_name("App").is_err());
        assert!(validate_pod_name("app.").is_err());
    }

    #[test]
    fn test_injection_patterns_rejected() {
        for name in ["a$b", "a`b`", "a|b", "a&b", "a>b", "a*", "a?", "a'b", "a\"b", "a\0b", "a\tb"] {
            match validate_pod_name(name) {
                Err(DiagnosticError::InvalidInput { field, message }) => {
                    assert_eq!(field, "pod_name");
                    assert!(message.contains("injection"), "{name}: {message}");
                }
                other => panic!("{name}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(MAX_NAME_LENGTH);
        assert!(validate_pod_name(&at_limit).is_ok());
        assert!(validate_pod_name(&format!("{at_limit}a")).is_err());
    }

    #[test]
    fn test_workload_field_name() {
        match validate_workload_name("") {
            Err(DiagnosticError::InvalidInput { field, .. }) => assert_eq!(field, "workload_name"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(validate_workload_name("frontend").is_ok());
    }
}
