//! Remediation step generation
//!
//! Each root cause has a fixed list of steps. When the primary image of the
//! failing pod is known, image-specific commands (docker pull, secret
//! creation, connectivity probes) are spliced in.

use super::classifier::RootCause;
use crate::models::ImageReference;

/// Returned for a root cause without a table entry
pub const FALLBACK_STEP: &str = "No remediation steps available for this root cause";

/// Builds the steps for one root cause
pub type StepBuilder = fn(Option<&ImageReference>) -> Vec<String>;

/// Remediation builders keyed by root cause
pub static REMEDIATIONS: &[(RootCause, StepBuilder)] = &[
    (RootCause::ImageNotFound, image_not_found),
    (RootCause::AuthFailure, auth_failure),
    (RootCause::NetworkIssue, network_issue),
    (RootCause::RateLimit, rate_limit),
    (RootCause::PermissionDenied, permission_denied),
    (RootCause::ManifestError, manifest_error),
    (RootCause::Transient, transient),
    (RootCause::Unknown, unknown),
];

/// Generate ordered, never-empty remediation steps
pub fn generate(root_cause: RootCause, image: Option<&ImageReference>) -> Vec<String> {
    generate_from(REMEDIATIONS, root_cause, image)
}

/// Generate steps from an explicit table
pub fn generate_from(
    table: &[(RootCause, StepBuilder)],
    root_cause: RootCause,
    image: Option<&ImageReference>,
) -> Vec<String> {
    let steps = table
        .iter()
        .find(|(cause, _)| *cause == root_cause)
        .map(|(_, build)| build(image))
        .unwrap_or_default();

    if steps.is_empty() {
        vec![FALLBACK_STEP.to_string()]
    } else {
        steps
    }
}

fn owned(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}

fn image_not_found(image: Option<&ImageReference>) -> Vec<String> {
    let Some(image) = image else {
        return owned(&[
            "Verify the image name and tag are correct in your pod specification",
            "Check if the image exists in the registry",
            "Ensure the image was pushed to the registry after building",
            "Verify the registry URL is correct and accessible from your cluster",
        ]);
    };

    vec![
        format!(
            "Verify the image name and tag are correct: {}",
            image.full_reference
        ),
        format!("Check if the image exists: docker pull {}", image.full_reference),
        "Ensure the image was pushed to the registry after building".to_string(),
        format!(
            "Verify registry '{}' is accessible from your cluster",
            image.registry
        ),
        "Check if the image tag was deleted or moved".to_string(),
    ]
}

fn auth_failure(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Create or verify the image pull secret with valid registry credentials",
        "Ensure the secret is in the same namespace as the pod",
        "Reference the secret in pod spec: spec.imagePullSecrets",
    ]);

    if let Some(image) = image {
        steps.push(format!(
            "Create secret: kubectl create secret docker-registry regcred \
             --docker-server={} --docker-username=<user> --docker-password=<pwd>",
            image.registry
        ));
        steps.push("Add to pod spec: imagePullSecrets: [{name: regcred}]".to_string());
    }

    steps.push("Verify credentials are still valid (not expired or revoked)".to_string());
    steps
}

fn network_issue(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Check cluster network connectivity to external registries",
        "Verify DNS resolution is working in the cluster",
        "Check for firewall or network policies blocking registry access",
        "Verify proxy settings if cluster uses an HTTP proxy",
    ]);

    if let Some(image) = image {
        steps.push(format!(
            "Test connectivity: kubectl run test --image=busybox --rm -it -- nslookup {}",
            image.registry
        ));
        steps.push(format!(
            "Test HTTPS access: kubectl run test --image=busybox --rm -it -- wget https://{}",
            image.registry
        ));
    }

    steps.push("Check for service mesh or CNI issues that might block external traffic".to_string());
    steps
}

fn rate_limit(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Wait for the rate limit window to reset (typically 5-60 minutes)",
        "Reduce the frequency of image pulls (use imagePullPolicy: IfNotPresent)",
        "Consider using a registry mirror or cache to reduce external pulls",
    ]);

    if image.is_some_and(ImageReference::is_docker_hub) {
        steps.extend(owned(&[
            "Docker Hub rate limits: anonymous users (100 pulls/6h), authenticated (200 pulls/6h)",
            "Authenticate with Docker Hub to increase rate limits",
            "Consider Docker Hub paid plans for higher limits",
        ]));
    }

    steps.extend(owned(&[
        "Use image pull secrets with authenticated registry access",
        "Consider deploying a registry mirror in your cluster",
    ]));
    steps
}

fn permission_denied(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Verify the service account has permission to pull images",
        "Check if the image repository has access restrictions",
        "Ensure the image pull secret has sufficient permissions",
    ]);

    if let Some(image) = image {
        steps.push(format!(
            "Verify repository '{}/{}' access permissions",
            image.registry, image.repository
        ));
        steps.push("Check if the registry requires authentication".to_string());
    }

    steps.extend(owned(&[
        "For private registries, ensure the account in pull secret has read access",
        "Review registry access policies and IAM permissions",
    ]));
    steps
}

fn manifest_error(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Verify the image manifest is valid and not corrupted",
        "Check if the image was built for the correct platform (linux/amd64, linux/arm64, etc.)",
        "Ensure multi-platform manifest includes your cluster's architecture",
    ]);

    if let Some(image) = image {
        steps.push(format!(
            "Inspect image manifest: docker manifest inspect {}",
            image.full_reference
        ));
        steps.push("Verify platform compatibility with your Kubernetes nodes".to_string());
    }

    steps.extend(owned(&[
        "Try re-pushing the image to fix potential corruption",
        "Check registry logs for manifest-related errors",
    ]));
    steps
}

fn transient(_image: Option<&ImageReference>) -> Vec<String> {
    owned(&[
        "This appears to be a transient failure (< 3 attempts or < 5 minutes)",
        "Kubernetes will automatically retry pulling the image",
        "Monitor the pod status to see if it resolves automatically",
        "If the issue persists beyond 10 minutes, investigate for underlying causes",
        "Check recent events: kubectl describe pod <pod-name>",
    ])
}

fn unknown(image: Option<&ImageReference>) -> Vec<String> {
    let mut steps = owned(&[
        "Review the full error message in pod events for more details",
        "Check pod events: kubectl describe pod <pod-name>",
        "Verify the image reference is correct and complete",
        "Test image pull manually: docker pull <image>",
        "Check registry status and availability",
        "Review cluster logs for additional error context",
    ]);

    if let Some(image) = image {
        steps.push(format!("Manually test pull: docker pull {}", image.full_reference));
    }

    steps.push("Contact registry support if the issue persists".to_string());
    steps
}
