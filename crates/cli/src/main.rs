//! Workload Provisioner CLI
//!
//! Resolves cluster credentials, builds the workload's Deployment and
//! submits it for creation. One shot: no updates, rollouts or watches.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use provisioner_lib::{
    build, init_tracing, resolve, submit, AuthMode, KubeDeploymentApi, LogFormat,
    ProvisionLogger, WorkloadIntent,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Workload Provisioner CLI
#[derive(Parser)]
#[command(name = "provision")]
#[command(author, version, about = "Provision a workload onto a Kubernetes cluster", long_about = None)]
pub struct Cli {
    /// Base name; the cluster appends a unique suffix
    #[arg(long, default_value = "screen-recorder")]
    pub name: String,

    /// Workload label as KEY=VALUE (repeatable, defaults to app=<name>)
    #[arg(long = "label", short, value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Path to kubeconfig file (uses $KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long)]
    pub context: Option<String>,

    /// Credential sources to try: auto, kubeconfig or in-cluster
    #[arg(long)]
    pub auth_mode: Option<AuthMode>,

    /// Print the Deployment without contacting the cluster
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Log format: text or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Provisioner config file (defaults to ~/.config/provisioner/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid label {s:?}: expected KEY=VALUE"))?;
    if key.is_empty() {
        return Err(format!("invalid label {s:?}: empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn workload_intent(name: &str, labels: Vec<(String, String)>) -> Result<WorkloadIntent> {
    let intent = if labels.is_empty() {
        WorkloadIntent::with_app_label(name)
    } else {
        WorkloadIntent::new(name, labels.into_iter().collect::<BTreeMap<_, _>>())
    };
    intent.context("Invalid workload")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::ProvisionerConfig::load(cli.config.as_deref())?;
    init_tracing(cli.log_format.unwrap_or(settings.log_format), cli.verbose);
    debug!(?settings, "Loaded configuration");

    let intent = workload_intent(&cli.name, cli.labels)?;
    let logger = ProvisionLogger::new(intent.base_name());

    if cli.dry_run {
        output::print_descriptor(&build(&intent), cli.format)?;
        return Ok(());
    }

    let kubeconfig =
        config::kubeconfig_path(cli.kubeconfig.as_deref(), settings.kubeconfig.as_deref());
    let auth_mode = cli.auth_mode.unwrap_or(settings.auth_mode);
    let context = cli.context.or(settings.context);

    let credentials = resolve(kubeconfig, context, auth_mode)
        .await
        .context("Error building config")?;
    logger.log_credentials_resolved(&credentials);

    let client = credentials
        .into_client()
        .context("Error getting client")?;

    let descriptor = build(&intent);
    let api = KubeDeploymentApi::new(client);
    let created = submit(&api, &descriptor, &logger)
        .await
        .context("Error creating the Deployment")?;

    output::print_created(&created, cli.format)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label("app=web").unwrap(),
            ("app".to_string(), "web".to_string())
        );
        assert_eq!(
            parse_label("tier=").unwrap(),
            ("tier".to_string(), String::new())
        );
        assert!(parse_label("app").is_err());
        assert!(parse_label("=web").is_err());
    }

    #[test]
    fn test_default_intent_uses_app_label() {
        let intent = workload_intent("screen-recorder", Vec::new()).unwrap();
        assert_eq!(intent.labels().get("app"), Some("screen-recorder"));
    }

    #[test]
    fn test_explicit_labels_replace_default() {
        let labels = vec![("team".to_string(), "media".to_string())];
        let intent = workload_intent("recorder", labels).unwrap();
        assert_eq!(intent.labels().get("team"), Some("media"));
        assert_eq!(intent.labels().get("app"), None);
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        assert!(workload_intent("Not_Valid", Vec::new()).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "provision",
            "--name",
            "recorder",
            "-l",
            "app=recorder",
            "--label",
            "tier=web",
            "--auth-mode",
            "in-cluster",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.name, "recorder");
        assert_eq!(cli.labels.len(), 2);
        assert_eq!(cli.auth_mode, Some(AuthMode::InCluster));
        assert!(cli.dry_run);
        assert!(matches!(cli.format, output::OutputFormat::Json));
    }
}
