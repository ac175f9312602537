//! Root cause classification
//!
//! Event messages are case-folded, concatenated and matched against an
//! ordered table of rule groups. The first matching group wins; when nothing
//! matches the transient verdict of the event analysis decides between
//! `TRANSIENT_FAILURE` and `UNKNOWN`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::EventAnalysis;
use crate::models::{EventSummary, PodSnapshot};

/// Category of an image pull failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootCause {
    ImageNotFound,
    #[serde(rename = "AUTHENTICATION_FAILURE")]
    AuthFailure,
    NetworkIssue,
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimit,
    PermissionDenied,
    ManifestError,
    #[serde(rename = "TRANSIENT_FAILURE")]
    Transient,
    Unknown,
}

impl RootCause {
    pub const ALL: [RootCause; 8] = [
        RootCause::ImageNotFound,
        RootCause::AuthFailure,
        RootCause::NetworkIssue,
        RootCause::RateLimit,
        RootCause::PermissionDenied,
        RootCause::ManifestError,
        RootCause::Transient,
        RootCause::Unknown,
    ];

    /// Stable identifier used in reports
    pub fn code(&self) -> &'static str {
        match self {
            RootCause::ImageNotFound => "IMAGE_NOT_FOUND",
            RootCause::AuthFailure => "AUTHENTICATION_FAILURE",
            RootCause::NetworkIssue => "NETWORK_ISSUE",
            RootCause::RateLimit => "RATE_LIMIT_EXCEEDED",
            RootCause::PermissionDenied => "PERMISSION_DENIED",
            RootCause::ManifestError => "MANIFEST_ERROR",
            RootCause::Transient => "TRANSIENT_FAILURE",
            RootCause::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            RootCause::ImageNotFound => "Image does not exist in registry",
            RootCause::AuthFailure => "Registry authentication failed",
            RootCause::NetworkIssue => "Cannot reach registry",
            RootCause::RateLimit => "Registry rate limit exceeded",
            RootCause::PermissionDenied => "Insufficient permissions to pull image",
            RootCause::ManifestError => "Image manifest is invalid or corrupted",
            RootCause::Transient => "Transient failure (may resolve automatically)",
            RootCause::Unknown => "Unknown failure reason",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RootCause::ImageNotFound | RootCause::AuthFailure | RootCause::PermissionDenied => {
                Severity::High
            }
            RootCause::NetworkIssue | RootCause::RateLimit | RootCause::ManifestError => {
                Severity::Medium
            }
            RootCause::Transient => Severity::Low,
            RootCause::Unknown => Severity::Medium,
        }
    }
}

impl std::fmt::Display for RootCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Urgency of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Requires immediate action
    High,
    /// Needs investigation
    Medium,
    /// May self-resolve
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// A single predicate over the case-folded message text
#[derive(Debug, Clone, Copy)]
pub enum MatchRule {
    /// Text contains the token
    Any(&'static str),
    /// Text contains every token
    All(&'static [&'static str]),
}

impl MatchRule {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            MatchRule::Any(token) => text.contains(token),
            MatchRule::All(tokens) => tokens.iter().all(|t| text.contains(t)),
        }
    }
}

/// Rules that identify one root cause
#[derive(Debug, Clone, Copy)]
pub struct RuleGroup {
    pub root_cause: RootCause,
    pub rules: &'static [MatchRule],
}

impl RuleGroup {
    /// Whether any rule of the group matches the case-folded text
    pub fn matches(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(text))
    }
}

/// Rule groups in priority order.
///
/// Specific signals come before broad ones: `NETWORK_ISSUE` contains a bare
/// "failed" token that would otherwise swallow nearly every message.
pub static RULES: &[RuleGroup] = &[
    RuleGroup {
        root_cause: RootCause::ImageNotFound,
        rules: &[
            MatchRule::Any("manifest unknown"),
            MatchRule::Any("manifest not found"),
            MatchRule::Any("not found: manifest unknown"),
            MatchRule::Any("image not found"),
            MatchRule::Any("repository does not exist"),
            MatchRule::Any("404"),
        ],
    },
    RuleGroup {
        root_cause: RootCause::AuthFailure,
        rules: &[
            MatchRule::Any("unauthorized"),
            MatchRule::Any("authentication required"),
            MatchRule::Any("authentication failed"),
            MatchRule::Any("authorization failed"),
            MatchRule::Any("401"),
            MatchRule::Any("403"),
            MatchRule::Any("no basic auth credentials"),
            MatchRule::Any("pull access denied"),
            MatchRule::Any("access denied"),
            MatchRule::Any("access forbidden"),
        ],
    },
    RuleGroup {
        root_cause: RootCause::NetworkIssue,
        rules: &[
            MatchRule::Any("dial tcp"),
            MatchRule::Any("timeout"),
            MatchRule::Any("i/o timeout"),
            MatchRule::Any("connection refused"),
            MatchRule::Any("no route to host"),
            MatchRule::Any("dns"),
            MatchRule::Any("failed"),
            MatchRule::Any("lookup"),
            MatchRule::Any("no such host"),
        ],
    },
    RuleGroup {
        root_cause: RootCause::RateLimit,
        rules: &[
            MatchRule::Any("rate limit"),
            MatchRule::Any("too many requests"),
            MatchRule::Any("429"),
            MatchRule::Any("toomanyrequests"),
        ],
    },
    RuleGroup {
        root_cause: RootCause::PermissionDenied,
        rules: &[
            MatchRule::Any("forbidden"),
            MatchRule::Any("permission denied"),
            MatchRule::Any("insufficient"),
            MatchRule::Any("permission"),
        ],
    },
    RuleGroup {
        root_cause: RootCause::ManifestError,
        rules: &[
            MatchRule::Any("manifest invalid"),
            MatchRule::All(&["unsupported", "platform"]),
            MatchRule::Any("no matching manifest"),
            MatchRule::Any("unknown blob"),
        ],
    },
];

/// Case-folded concatenation of all event messages
pub fn search_text(events: &[EventSummary]) -> String {
    let mut text = String::new();
    for event in events {
        text.push_str(&event.message.to_lowercase());
        text.push(' ');
    }
    text
}

/// Classify already case-folded text
pub fn classify_text(text: &str, is_transient: bool) -> RootCause {
    if let Some(group) = RULES.iter().find(|group| group.matches(text)) {
        return group.root_cause;
    }

    if is_transient {
        RootCause::Transient
    } else {
        RootCause::Unknown
    }
}

/// Determine the root cause of a pod's image pull failure
pub fn classify(events: &[EventSummary], pod: &PodSnapshot, analysis: &EventAnalysis) -> RootCause {
    let root_cause = classify_text(&search_text(events), analysis.is_transient);

    debug!(
        pod = %pod.name,
        namespace = %pod.namespace,
        events = events.len(),
        root_cause = %root_cause,
        "Classified image pull failure"
    );

    root_cause
}
