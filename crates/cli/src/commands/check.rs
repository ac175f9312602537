//! Cluster-wide problem scan

use std::path::Path;

use anyhow::Result;
use doctor_lib::config::DEFAULT_TIMEOUT;
use doctor_lib::{PodAnalyzer, ScanResult, ScanScope};

use crate::cluster::{connect, KubeClusterSource};
use crate::config::parse_duration;
use crate::exit;
use crate::output::{issues_table, print_error, print_success, print_warning};

/// Flags of `ipd check`
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub all_namespaces: bool,
    pub namespace: String,
    pub timeout: Option<String>,
}

impl CheckOptions {
    pub fn scope(&self) -> ScanScope {
        if self.all_namespaces {
            ScanScope::AllNamespaces
        } else {
            ScanScope::Namespace(self.namespace.clone())
        }
    }
}

/// Scan the cluster; exits non-zero when any pod has a problem
pub async fn run(options: CheckOptions, kubeconfig: Option<&Path>, quiet: bool) -> Result<u8> {
    let timeout = match options.timeout.as_deref() {
        Some(value) => parse_duration(value)?,
        None => DEFAULT_TIMEOUT,
    };

    let client = connect(kubeconfig).await?;
    let analyzer = PodAnalyzer::new(KubeClusterSource::new(client));

    let result = match analyzer.scan(&options.scope(), timeout).await {
        Ok(result) => result,
        Err(e) => {
            print_error(&format!("Cluster check failed: {}", e));
            return Ok(exit::for_error(&e));
        }
    };

    if !quiet {
        for namespace in &result.skipped_namespaces {
            print_warning(&format!("Skipped namespace '{}': pods could not be listed", namespace));
        }
        if let Some(table) = issues_table(&result) {
            println!("{}", table);
        }
        println!("{}", summary(&result));
    }

    if result.has_issues() {
        return Ok(exit::ISSUES_FOUND);
    }

    if !quiet {
        print_success(&format!(
            "Checked {} pod(s) in {} namespace(s)",
            result.total_pods,
            result.namespaces_scanned.len()
        ));
    }
    Ok(exit::SUCCESS)
}

/// Totals line plus a per-namespace breakdown
pub fn summary(result: &ScanResult) -> String {
    if !result.has_issues() {
        return "No issues found!".to_string();
    }

    let mut out = format!("Total issues found: {}\n\nIssues by namespace:", result.issues.len());
    for (namespace, count) in result.issues_by_namespace() {
        out.push_str(&format!("\n  {}: {} issue(s)", namespace, count));
    }
    out
}
