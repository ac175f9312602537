//! Image Pull Doctor CLI
//!
//! Diagnoses why pods fail to pull their container images and scans
//! namespaces for pods in common failure states.

mod cluster;
mod commands;
mod config;
mod exit;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::analyze::AnalyzeOptions;
use commands::check::CheckOptions;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Image Pull Doctor
#[derive(Parser)]
#[command(name = "ipd")]
#[command(author, version, about = "Image Pull Doctor: root-cause analysis for Kubernetes image pull failures", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Only print errors and machine-readable output
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze Kubernetes resources for issues
    #[command(subcommand)]
    Analyze(AnalyzeCommands),

    /// Check namespaces for pods with common problems
    Check {
        /// Check all namespaces
        #[arg(long, short = 'A')]
        all_namespaces: bool,

        /// Namespace to check
        #[arg(long, short, default_value = "default")]
        namespace: String,

        /// Overall time limit, e.g. 30s or 2m
        #[arg(long)]
        timeout: Option<String>,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Diagnose the root cause of an ImagePullBackOff
    Imagepullbackoff {
        /// Pod name
        pod: String,

        /// Pod namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Output format
        #[arg(long, short)]
        output: Option<output::OutputFormat>,

        /// Analysis time limit, e.g. 30s or 1m
        #[arg(long)]
        timeout: Option<String>,

        /// Include the cluster access audit log in the report
        #[arg(long)]
        audit: bool,
    },
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(!cli.no_color),
            )
            .init();
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let kubeconfig = cli.kubeconfig.as_deref();

    match cli.command {
        Commands::Analyze(AnalyzeCommands::Imagepullbackoff {
            pod,
            namespace,
            output,
            timeout,
            audit,
        }) => {
            let options = AnalyzeOptions {
                pod_name: pod,
                namespace,
                output,
                timeout,
                include_audit_log: audit,
            };
            commands::analyze::run(options, kubeconfig, cli.quiet).await
        }
        Commands::Check {
            all_namespaces,
            namespace,
            timeout,
        } => {
            let options = CheckOptions {
                all_namespaces,
                namespace,
                timeout,
            };
            commands::check::run(options, kubeconfig, cli.quiet).await
        }
        Commands::Version => {
            println!("ipd {}", doctor_lib::TOOL_VERSION);
            Ok(exit::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(&cli);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(exit::GENERIC_ERROR)
        }
    }
}
