//! Configuration management for the CLI
//!
//! Defaults come from `~/.config/ipd/config.json`, overridden by `IPD_*`
//! environment variables, overridden in turn by command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default namespace
    pub namespace: Option<String>,
    /// Default output format (text, json, yaml)
    pub output: Option<String>,
    /// Default analysis timeout, e.g. "30s" or "1m30s"
    pub timeout: Option<String>,
}

impl CliConfig {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::load_sources(None),
        }
    }

    /// Load configuration from a specific file and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_sources(Some(path))
    }

    fn load_sources(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix("IPD"))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("ipd").join("config.json"))
    }
}

/// Parse durations such as `30s`, `500ms`, `2m` or `1h30m`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        bail!("duration cannot be empty");
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            bail!("invalid duration '{}': expected a number", input);
        }
        let value: u64 = rest[..digits]
            .parse()
            .with_context(|| format!("invalid duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let seconds = |factor: u64| value.checked_mul(factor).map(Duration::from_secs);
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => seconds(60),
            "h" => seconds(3600),
            "" => bail!("invalid duration '{}': missing unit (ms, s, m, h)", input),
            unit => bail!("invalid duration '{}': unknown unit '{}'", input, unit),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .with_context(|| format!("invalid duration '{}': value is too large", input))?;
        rest = &rest[unit_len..];
    }

    if total.is_zero() {
        bail!("duration must be greater than zero");
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for input in ["", "30", "s", "10x", "0s", "-5s", "1.5s"] {
            assert!(parse_duration(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        for input in [
            "99999999999999999h",
            "307445734561825861m",
            "18446744073709551615s1s",
        ] {
            let err = parse_duration(input).unwrap_err();
            assert!(err.to_string().contains("too large"), "{input}: {err}");
        }
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"namespace": "staging", "output": "json", "timeout": "45s"}}"#
        )
        .unwrap();

        let config = CliConfig::load_from(file.path()).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("staging"));
        assert_eq!(config.output.as_deref(), Some("json"));
        assert_eq!(config.timeout.as_deref(), Some("45s"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.output, None);
    }
}
