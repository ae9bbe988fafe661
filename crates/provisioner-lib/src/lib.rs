//! Library for provisioning a single workload onto a Kubernetes cluster
//!
//! This crate provides:
//! - Credential resolution (kubeconfig, falling back to in-cluster identity)
//! - The workload descriptor builder
//! - Deployment submission through a mockable API seam
//! - Logging setup and structured provisioning events

pub mod credentials;
pub mod descriptor;
pub mod models;
pub mod observability;
pub mod submit;

pub use credentials::{
    resolve, AuthError, AuthMode, ClusterCredentials, CredentialOrigin, CredentialResolver,
    CredentialSource, InClusterSource, KubeconfigSource,
};
pub use descriptor::build;
pub use models::*;
pub use observability::{init_tracing, LogFormat, ProvisionLogger};
pub use submit::{submit, DeploymentApi, KubeDeploymentApi, SubmitError};
