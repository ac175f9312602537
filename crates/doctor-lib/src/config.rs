//! Per-invocation analysis configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default overall deadline for one analysis
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a single pod analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub namespace: String,
    pub pod_name: String,
    /// Overall deadline covering every cluster request (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    /// Redact secrets from event messages (default: true)
    #[serde(default = "default_redact")]
    pub redact: bool,
    /// Attach the cluster access audit trail to the report
    #[serde(default)]
    pub include_audit_log: bool,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_redact() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            pod_name: String::new(),
            timeout: DEFAULT_TIMEOUT,
            redact: true,
            include_audit_log: false,
        }
    }
}

impl AnalysisConfig {
    pub fn new(namespace: impl Into<String>, pod_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pod_name: pod_name.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    pub fn with_audit_log(mut self, include: bool) -> Self {
        self.include_audit_log = include;
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
