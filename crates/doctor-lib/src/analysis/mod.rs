//! Image pull failure analysis
//!
//! This module provides:
//! - Event aggregation and transient/persistent classification
//! - Root cause classification from event messages
//! - Remediation step generation
//! - Finding and report assembly

pub mod assembler;
pub mod classifier;
pub mod events;
pub mod remediation;

#[cfg(test)]
mod tests;

pub use assembler::{
    affected_containers, assemble_pod_report, build_finding, format_failure_duration,
    image_references, primary_reference, ReportBuilder,
};
pub use classifier::{classify, MatchRule, RootCause, RuleGroup, Severity, RULES};
pub use events::{
    analyze, analyze_raw, filter_failure_events, is_failure_reason, summarize, EventAnalysis,
    FAILURE_REASONS, TRANSIENT_MAX_FAILURES, TRANSIENT_WINDOW_SECS,
};
pub use remediation::generate as generate_remediation;
