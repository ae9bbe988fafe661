//! Cluster credential resolution
//!
//! Credentials come from one of two sources, tried in order:
//! 1. a kubeconfig file (operator workstation)
//! 2. the ambient service-account identity (process running inside the cluster)
//!
//! The same binary works in both places without being told where it runs.
//! [`AuthMode`] can pin resolution to a single source when the caller knows.

mod in_cluster;
mod kubeconfig;


pub use in_cluster::InClusterSource;
pub use kubeconfig::KubeconfigSource;

use async_trait::async_trait;
use kube::{Client, Config};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Where a set of credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialOrigin {
    Kubeconfig,
    InCluster,
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Kubeconfig => f.write_str("kubeconfig"),
            CredentialOrigin::InCluster => f.write_str("in-cluster"),
        }
    }
}

/// Credential resolution failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{origin} credentials unavailable: {reason}")]
    Source {
        origin: CredentialOrigin,
        reason: String,
    },

    #[error("no usable cluster credentials ({primary}; {fallback})")]
    Exhausted {
        primary: Box<AuthError>,
        fallback: Box<AuthError>,
    },

    #[error("failed to build cluster client: {0}")]
    Client(#[source] kube::Error),
}

impl AuthError {
    pub fn source_failed(origin: CredentialOrigin, reason: impl fmt::Display) -> Self {
        AuthError::Source {
            origin,
            reason: reason.to_string(),
        }
    }
}

/// Which sources the resolver may consult
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Kubeconfig first, in-cluster identity on failure
    #[default]
    Auto,
    /// Kubeconfig only
    Kubeconfig,
    /// In-cluster identity only
    InCluster,
}

#[derive(Debug, Error)]
#[error("unknown auth mode {0:?} (expected auto, kubeconfig or in-cluster)")]
pub struct ParseAuthModeError(String);

impl FromStr for AuthMode {
    type Err = ParseAuthModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(AuthMode::Auto),
            "kubeconfig" => Ok(AuthMode::Kubeconfig),
            "in-cluster" | "incluster" => Ok(AuthMode::InCluster),
            _ => Err(ParseAuthModeError(s.to_string())),
        }
    }
}

/// Authenticated handle to one cluster endpoint
#[derive(Debug, Clone)]
pub struct ClusterCredentials {
    config: Config,
    origin: CredentialOrigin,
}

impl ClusterCredentials {
    pub fn new(config: Config, origin: CredentialOrigin) -> Self {
        Self { config, origin }
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }

    pub fn cluster_url(&self) -> String {
        self.config.cluster_url.to_string()
    }

    pub fn default_namespace(&self) -> &str {
        &self.config.default_namespace
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the credentials and build an API client
    pub fn into_client(self) -> Result<Client, AuthError> {
        Client::try_from(self.config).map_err(AuthError::Client)
    }
}

/// One strategy for obtaining cluster credentials
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn origin(&self) -> CredentialOrigin;

    async fn load(&self) -> Result<Config, AuthError>;
}

/// Two-step credential lookup: primary source, then fallback
pub struct CredentialResolver<P, F> {
    primary: P,
    fallback: F,
    mode: AuthMode,
}

impl<P, F> CredentialResolver<P, F>
where
    P: CredentialSource,
    F: CredentialSource,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            mode: AuthMode::Auto,
        }
    }

    pub fn with_mode(mut self, mode: AuthMode) -> Self {
        self.mode = mode;
        self
    }

    pub async fn resolve(&self) -> Result<ClusterCredentials, AuthError> {
        match self.mode {
            AuthMode::Kubeconfig => load_from(&self.primary).await,
            AuthMode::InCluster => load_from(&self.fallback).await,
            AuthMode::Auto => match load_from(&self.primary).await {
                Ok(credentials) => Ok(credentials),
                Err(primary) => {
                    warn!(
                        event = "credential_source_failed",
                        origin = %self.primary.origin(),
                        fallback = %self.fallback.origin(),
                        error = %primary,
                        "Error building config from {}, trying {}",
                        self.primary.origin(),
                        self.fallback.origin()
                    );

                    load_from(&self.fallback)
                        .await
                        .map_err(|fallback| AuthError::Exhausted {
                            primary: Box::new(primary),
                            fallback: Box::new(fallback),
                        })
                }
            },
        }
    }
}

async fn load_from<S: CredentialSource>(source: &S) -> Result<ClusterCredentials, AuthError> {
    let config = source.load().await?;
    debug!(
        origin = %source.origin(),
        cluster_url = %config.cluster_url,
        "Loaded cluster credentials"
    );
    Ok(ClusterCredentials::new(config, source.origin()))
}

/// Resolve credentials from the kubeconfig at `kubeconfig`, falling back to
/// the in-cluster identity as allowed by `mode`.
pub async fn resolve(
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    mode: AuthMode,
) -> Result<ClusterCredentials, AuthError> {
    CredentialResolver::new(
        KubeconfigSource::new(kubeconfig).with_context(context),
        InClusterSource,
    )
    .with_mode(mode)
    .resolve()
    .await
}
