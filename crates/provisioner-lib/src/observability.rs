//! Observability infrastructure for the provisioner
//!
//! Provides:
//! - tracing subscriber setup (text or JSON, filtered by `RUST_LOG`)
//! - structured event logging for the provisioning steps

use crate::credentials::ClusterCredentials;
use crate::models::{CreatedWorkload, ResourceKind, WorkloadDescriptor};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout carries only command output. `RUST_LOG`
/// takes precedence over `verbose`.
pub fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Structured logger for provisioning events
///
/// Every event carries the `event` name and the workload it concerns.
#[derive(Clone)]
pub struct ProvisionLogger {
    workload: String,
}

impl ProvisionLogger {
    pub fn new(workload: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
        }
    }

    pub fn log_credentials_resolved(&self, credentials: &ClusterCredentials) {
        info!(
            event = "credentials_resolved",
            workload = %self.workload,
            origin = %credentials.origin(),
            cluster_url = %credentials.cluster_url(),
            "Resolved cluster credentials"
        );
    }

    pub fn log_creating(&self, descriptor: &WorkloadDescriptor) {
        let bound = |kind: ResourceKind| {
            descriptor
                .container
                .resource(kind)
                .map(|b| b.limit().0.clone())
                .unwrap_or_default()
        };

        info!(
            event = "deployment_creating",
            workload = %self.workload,
            namespace = %descriptor.namespace,
            name_prefix = %descriptor.name_prefix,
            replicas = descriptor.replicas,
            image = %descriptor.container.image,
            cpu = %bound(ResourceKind::Cpu),
            memory = %bound(ResourceKind::Memory),
            "Creating Deployment"
        );
    }

    pub fn log_created(&self, created: &CreatedWorkload) {
        info!(
            event = "deployment_created",
            workload = %self.workload,
            namespace = %created.namespace,
            name = %created.name,
            uid = ?created.uid,
            "Created Deployment"
        );
    }
}
