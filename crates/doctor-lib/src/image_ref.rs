//! Container image reference parsing
//!
//! Decomposes image strings as they appear in pod specs:
//! - `nginx`
//! - `nginx:1.21`
//! - `myuser/myapp:v1.0`
//! - `registry.example.com:5000/app:latest`
//! - `gcr.io/project/image@sha256:abc123...`

use thiserror::Error;

use crate::models::ImageReference;

/// Registry assumed for references without an explicit registry host
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Tag assumed when neither a tag nor a digest is given
pub const DEFAULT_TAG: &str = "latest";

/// Namespace Docker Hub uses for official single-segment images
const OFFICIAL_NAMESPACE: &str = "library";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("image reference cannot be empty")]
    EmptyReference,
}

/// Parse an image string into its registry, repository and tag or digest.
///
/// Any non-empty input is accepted; ambiguous strings are resolved by the
/// precedence rules rather than rejected.
pub fn parse(container_name: &str, raw_image: &str) -> Result<ImageReference, ParseError> {
    if raw_image.is_empty() {
        return Err(ParseError::EmptyReference);
    }

    let mut tag = String::new();
    let mut digest = String::new();

    let name = match raw_image.rsplit_once('@') {
        Some((name, d)) if !d.is_empty() => {
            digest = d.to_string();
            name
        }
        // A dangling '@' carries no digest; fall back to tag parsing
        Some((name, _)) => name,
        None => raw_image,
    };
    let is_digest = !digest.is_empty();

    let registry_and_repo = if is_digest {
        name
    } else {
        match name.rsplit_once(':') {
            // The candidate tag must not contain '/', otherwise the colon
            // belongs to a registry port (`host:5000/app`)
            Some((rest, candidate)) if !candidate.contains('/') => {
                tag = candidate.to_string();
                rest
            }
            _ => name,
        }
    };

    let (registry, repository) = split_registry(registry_and_repo);

    if tag.is_empty() && !is_digest {
        tag = DEFAULT_TAG.to_string();
    }

    Ok(ImageReference {
        container_name: container_name.to_string(),
        full_reference: raw_image.to_string(),
        registry,
        repository,
        tag,
        digest,
        is_digest,
    })
}

/// Split `registry/repo/path` into registry host and repository path
fn split_registry(registry_and_repo: &str) -> (String, String) {
    let segments: Vec<&str> = registry_and_repo.split('/').collect();

    match segments.as_slice() {
        [image] => (
            DEFAULT_REGISTRY.to_string(),
            format!("{}/{}", OFFICIAL_NAMESPACE, image),
        ),
        [first, second] => {
            if looks_like_registry_host(first) {
                (first.to_string(), second.to_string())
            } else {
                (DEFAULT_REGISTRY.to_string(), format!("{}/{}", first, second))
            }
        }
        [first, rest @ ..] => (first.to_string(), rest.join("/")),
        // `split` always yields at least one segment
        [] => (DEFAULT_REGISTRY.to_string(), String::new()),
    }
}

/// A first path segment with a dot or a port is a registry host, not a user
fn looks_like_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':')
}

impl ImageReference {
    /// Tag or digest, whichever identifies this image
    pub fn version(&self) -> &str {
        if self.is_digest {
            &self.digest
        } else {
            &self.tag
        }
    }

    /// Whether the image is pulled from Docker Hub
    pub fn is_docker_hub(&self) -> bool {
        self.registry == DEFAULT_REGISTRY
    }
}
