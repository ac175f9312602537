//! Image pull failure analysis command

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use doctor_lib::config::DEFAULT_TIMEOUT;
use doctor_lib::validation;
use doctor_lib::{AnalysisConfig, DiagnosticError, PodAnalyzer};
use tracing::debug;

use crate::cluster::{connect, KubeClusterSource};
use crate::config::{parse_duration, CliConfig};
use crate::exit;
use crate::output::{render_report, OutputFormat};

/// Flags of `ipd analyze imagepullbackoff`
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub pod_name: String,
    pub namespace: Option<String>,
    pub output: Option<OutputFormat>,
    pub timeout: Option<String>,
    pub include_audit_log: bool,
}

/// Resolve flags against configured defaults
pub fn resolve(
    options: &AnalyzeOptions,
    defaults: &CliConfig,
) -> Result<(AnalysisConfig, OutputFormat)> {
    let namespace = options
        .namespace
        .clone()
        .or_else(|| defaults.namespace.clone())
        .unwrap_or_else(|| "default".to_string());

    let format = match (options.output, defaults.output.as_deref()) {
        (Some(format), _) => format,
        (None, Some(name)) => OutputFormat::parse(name)?,
        (None, None) => OutputFormat::default(),
    };

    let timeout: Duration = match options.timeout.as_deref().or(defaults.timeout.as_deref()) {
        Some(value) => parse_duration(value)?,
        None => DEFAULT_TIMEOUT,
    };

    let config = AnalysisConfig::new(namespace, options.pod_name.clone())
        .with_timeout(timeout)
        .with_audit_log(options.include_audit_log);

    Ok((config, format))
}

/// Run the analysis and print the report; returns the process exit code
pub async fn run(options: AnalyzeOptions, kubeconfig: Option<&Path>, quiet: bool) -> Result<u8> {
    let defaults = CliConfig::load()?;
    let (config, format) = match resolve(&options, &defaults) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), e);
            return Ok(exit::INVALID_INPUT);
        }
    };

    let checked = validation::validate_namespace(&config.namespace)
        .and_then(|_| validation::validate_pod_name(&config.pod_name));
    if let Err(e) = checked {
        explain_error(&e);
        return Ok(exit::for_error(&e));
    }

    let client = connect(kubeconfig).await?;
    let analyzer = PodAnalyzer::new(KubeClusterSource::new(client));

    match analyzer.analyze_pod(&config).await {
        Ok(report) => {
            if !quiet || format != OutputFormat::Text {
                println!("{}", render_report(&report, format)?);
            }
            Ok(exit::SUCCESS)
        }
        Err(e) => {
            debug!(error = %e, "Analysis failed");
            explain_error(&e);
            Ok(exit::for_error(&e))
        }
    }
}

/// Print the error with suggestions for resolving it
fn explain_error(err: &DiagnosticError) {
    eprint!("{}", explanation(err));
}

fn explanation(err: &DiagnosticError) -> String {
    let heading = |title: &str| format!("{} {}\n\n", "ERROR:".red().bold(), title);

    match err {
        DiagnosticError::NotFound {
            namespace,
            pod_name,
        } => {
            heading("Pod not found")
                + &format!(
                    "Pod '{}' does not exist in namespace '{}'.\n\n",
                    pod_name, namespace
                )
                + "Suggestions:\n"
                + "  • Check pod name spelling\n"
                + "  • Verify namespace is correct\n"
                + &format!("  • List pods: kubectl get pods -n {}\n", namespace)
        }
        DiagnosticError::PermissionDenied {
            resource,
            verb,
            namespace,
        } => {
            heading("Insufficient RBAC permissions")
                + &format!(
                    "Required: {}/{} in namespace '{}'\n\n",
                    resource, verb, namespace
                )
                + "To grant permissions, create a Role and RoleBinding:\n\n"
                + &format!(
                    "kubectl create role ipd-reader --verb=get,list --resource=pods,events -n {}\n",
                    namespace
                )
                + &format!(
                    "kubectl create rolebinding ipd-binding --role=ipd-reader --user=<your-user> -n {}\n",
                    namespace
                )
        }
        DiagnosticError::Timeout { timeout, operation } => {
            heading("Analysis timeout")
                + &format!(
                    "Failed to complete analysis within {:?} (during {})\n\n",
                    timeout, operation
                )
                + "Suggestions:\n"
                + "  • Retry the analysis\n"
                + "  • Increase timeout: --timeout 60s\n"
                + "  • Check cluster connectivity\n"
        }
        DiagnosticError::InvalidInput { field, message } => {
            heading(&format!("Invalid {}", field)) + message + "\n"
        }
        DiagnosticError::InvariantViolation(reason) => {
            heading("Not enough event history to classify the failure")
                + &format!("{}.\n\n", reason)
                + "The pod is failing to pull an image, but too few failure events are\n"
                + "recorded to tell a persistent problem from a transient one. Events\n"
                + "expire after about an hour, so older failures leave no history.\n\n"
                + "Suggestions:\n"
                + "  • Inspect the pod directly: kubectl describe pod <pod> -n <namespace>\n"
                + "  • Delete the pod so a fresh pull records new events, then re-run\n"
        }
        other => heading(&other.to_string()),
    }
}
