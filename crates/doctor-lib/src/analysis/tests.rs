//! End-to-end scenarios for the analysis pipeline
//!
//! These tests drive pod snapshots and raw events through summarization,
//! classification, remediation and report assembly.

#[cfg(test)]
mod pipeline_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::analysis::{
        assemble_pod_report, build_finding, summarize, ReportBuilder, RootCause, Severity,
    };
    use crate::error::ErrorKind;
    use crate::models::{
        ContainerSpec, ContainerStatusSnapshot, PodSnapshot, RawEvent, TargetType,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn failing_pod(name: &str, image: &str) -> PodSnapshot {
        PodSnapshot {
            name: name.to_string(),
            namespace: "shop".to_string(),
            phase: Some("Pending".to_string()),
            containers: vec![
                ContainerSpec {
                    name: "app".to_string(),
                    image: image.to_string(),
                },
                ContainerSpec {
                    name: "metrics".to_string(),
                    image: "prom/statsd-exporter:v0.26.0".to_string(),
                },
            ],
            container_statuses: vec![
                ContainerStatusSnapshot {
                    name: "app".to_string(),
                    waiting_reason: Some("ImagePullBackOff".to_string()),
                    ..Default::default()
                },
                ContainerStatusSnapshot {
                    name: "metrics".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn event(reason: &str, message: &str, count: u32, first: i64, last: i64) -> RawEvent {
        RawEvent {
            reason: reason.to_string(),
            message: message.to_string(),
            count: Some(count),
            first_seen: Some(t0() + Duration::seconds(first)),
            last_seen: Some(t0() + Duration::seconds(last)),
        }
    }

    #[test]
    fn test_missing_tag_is_persistent_image_not_found() {
        let pod = failing_pod("checkout-5f7d", "registry.shop.io/checkout:v9");
        let raw = vec![
            event("Scheduled", "Successfully assigned shop/checkout-5f7d", 1, 0, 0),
            event(
                "Failed",
                "Failed to pull image \"registry.shop.io/checkout:v9\": rpc error: code = NotFound desc = manifest unknown",
                5,
                0,
                120,
            ),
            event("BackOff", "Back-off pulling image \"registry.shop.io/checkout:v9\"", 4, 10, 110),
        ];
        let events = summarize(&raw, true, t0());
        let finding = build_finding(&pod, &events).unwrap();

        assert_eq!(finding.root_cause, RootCause::ImageNotFound);
        assert_eq!(finding.severity, Severity::High);
        assert!(!finding.is_transient);
        assert_eq!(finding.failure_count, 9);
        assert_eq!(finding.failure_duration, "2 minutes 0 seconds");
        assert_eq!(finding.affected_containers, vec!["app"]);
        assert_eq!(finding.image_references.len(), 2);
        assert_eq!(finding.events.len(), 2);
        assert_eq!(finding.summary, "IMAGE_NOT_FOUND: Image does not exist in registry");
        assert!(finding.details.ends_with(" (and 1 more events)"));
        assert!(finding
            .remediation_steps
            .iter()
            .any(|s| s.contains("docker pull registry.shop.io/checkout:v9")));
    }

    #[test]
    fn test_single_refused_connection_is_transient_network_issue() {
        let pod = failing_pod("api-0", "ghcr.io/shop/api:1.4");
        let raw = vec![event(
            "Failed",
            "dial tcp 140.82.112.33:443: connect: connection refused",
            1,
            0,
            30,
        )];
        let finding = build_finding(&pod, &summarize(&raw, true, t0())).unwrap();

        assert_eq!(finding.root_cause, RootCause::NetworkIssue);
        assert_eq!(finding.severity, Severity::Medium);
        assert!(finding.is_transient);
        assert_eq!(finding.failure_count, 1);
        assert_eq!(finding.failure_duration, "30 seconds");
        assert!(finding
            .remediation_steps
            .iter()
            .any(|s| s.ends_with("nslookup ghcr.io")));
    }

    #[test]
    fn test_unmatched_short_burst_is_transient_failure() {
        let pod = failing_pod("web-1", "nginx:1.25");
        let raw = vec![event("BackOff", "Back-off pulling image \"nginx:1.25\"", 1, 0, 10)];
        let finding = build_finding(&pod, &summarize(&raw, true, t0())).unwrap();

        assert_eq!(finding.root_cause, RootCause::Transient);
        assert_eq!(finding.severity, Severity::Low);
        assert!(finding.is_transient);
        assert_eq!(finding.details, "Back-off pulling image \"nginx:1.25\"");
    }

    #[test]
    fn test_ambiguous_denial_prefers_image_not_found() {
        let pod = failing_pod("worker-2", "shop/private-worker:2");
        let raw = vec![event(
            "Failed",
            "pull access denied for shop/private-worker, repository does not exist or may require 'docker login'",
            6,
            0,
            400,
        )];
        let finding = build_finding(&pod, &summarize(&raw, true, t0())).unwrap();
        assert_eq!(finding.root_cause, RootCause::ImageNotFound);
    }

    #[test]
    fn test_docker_hub_rate_limit() {
        let pod = failing_pod("cache-7", "redis:7");
        let raw = vec![event(
            "Failed",
            "toomanyrequests: You have reached your pull rate limit",
            4,
            0,
            90,
        )];
        let finding = build_finding(&pod, &summarize(&raw, true, t0())).unwrap();
        assert_eq!(finding.root_cause, RootCause::RateLimit);
        assert!(finding
            .remediation_steps
            .iter()
            .any(|s| s.contains("Docker Hub rate limits")));
    }

    #[test]
    fn test_sparse_persistent_failure_violates_invariant() {
        // One occurrence spread over ten minutes is neither transient nor
        // backed by enough failures
        let pod = failing_pod("slow-0", "nginx");
        let raw = vec![event("BackOff", "Back-off pulling image", 1, 0, 600)];
        let err = build_finding(&pod, &summarize(&raw, true, t0())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_failure_without_events_violates_invariant() {
        let pod = failing_pod("quiet-0", "nginx");
        let err = build_finding(&pod, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_healthy_pod_gives_empty_report() {
        let mut pod = failing_pod("ok-0", "nginx");
        pod.container_statuses[0].waiting_reason = None;
        pod.phase = Some("Running".to_string());

        let report = assemble_pod_report(&pod, &[], t0()).unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.summary.total_pods_analyzed, 1);
        assert_eq!(report.summary.pods_with_issues, 0);
        assert_eq!(report.summary.total_containers, 2);
        assert!(report.summary.root_cause_breakdown.is_empty());
        assert_eq!(report.target_type, TargetType::Pod);
        assert_eq!(report.tool_version, crate::TOOL_VERSION);
    }

    #[test]
    fn test_report_summary_is_consistent() {
        let raw_nf = vec![event("Failed", "manifest unknown", 3, 0, 60)];
        let raw_net = vec![event("Failed", "i/o timeout", 1, 0, 5)];
        let raw_auth = vec![event("Failed", "401 Unauthorized", 5, 0, 60)];

        let findings = [
            build_finding(&failing_pod("a", "nginx"), &summarize(&raw_nf, true, t0())).unwrap(),
            build_finding(&failing_pod("b", "nginx"), &summarize(&raw_net, true, t0())).unwrap(),
            build_finding(&failing_pod("c", "nginx"), &summarize(&raw_auth, true, t0())).unwrap(),
        ];

        let report = findings
            .into_iter()
            .fold(
                ReportBuilder::new(TargetType::Namespace, "shop", "shop", t0()),
                |b, f| b.with_pod(2).with_finding(f),
            )
            .build();

        let s = &report.summary;
        assert_eq!(s.total_pods_analyzed, 3);
        assert_eq!(s.pods_with_issues, report.findings.len());
        assert_eq!(s.total_containers, 6);
        assert_eq!(s.containers_with_issues, 3);
        assert_eq!(
            s.high_severity_count + s.medium_severity_count + s.low_severity_count,
            report.findings.len()
        );
        assert_eq!(s.root_cause_breakdown.values().sum::<usize>(), report.findings.len());
        assert_eq!(s.high_severity_count, 2);
        assert_eq!(s.medium_severity_count, 1);
    }

    #[test]
    fn test_report_serializes_with_stable_names() {
        let pod = failing_pod("checkout-5f7d", "registry.shop.io/checkout:v9");
        let raw = vec![event("Failed", "manifest unknown", 5, 0, 120)];
        let report = assemble_pod_report(&pod, &summarize(&raw, true, t0()), t0()).unwrap();

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target_type"], "pod");
        assert_eq!(json["summary"]["root_cause_breakdown"]["IMAGE_NOT_FOUND"], 1);
        assert_eq!(json["findings"][0]["root_cause"], "IMAGE_NOT_FOUND");
        assert_eq!(json["findings"][0]["severity"], "HIGH");
        assert!(json.get("audit_log").is_none());
        assert!(json["findings"][0].get("network_diagnostics").is_none());

        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("root_cause: IMAGE_NOT_FOUND"));
        assert!(yaml.contains("failure_duration: 2 minutes 0 seconds"));
    }
}
