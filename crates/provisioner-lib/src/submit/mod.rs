//! Deployment submission
//!
//! The create call itself belongs to the cluster. [`DeploymentApi`] is the
//! seam; [`KubeDeploymentApi`] is the production implementation.


use crate::models::{CreatedWorkload, WorkloadDescriptor};
use crate::observability::ProvisionLogger;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use kube::Client;
use thiserror::Error;

/// Errors returned by the create call
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("API server rejected deployment ({code} {reason}): {message}")]
    Rejected {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("request to API server failed: {message}")]
    Transport { message: String },

    #[error("API server returned a deployment without a name")]
    Unnamed,
}

impl From<kube::Error> for SubmitError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => SubmitError::Rejected {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => SubmitError::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// Create operation on Deployments
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Create `deployment` in `namespace`, returning the object as stored
    async fn create(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, SubmitError>;
}

/// [`DeploymentApi`] backed by a kube client
pub struct KubeDeploymentApi {
    client: Client,
}

impl KubeDeploymentApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeploymentApi for KubeDeploymentApi {
    async fn create(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, SubmitError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let created = deployments
            .create(&PostParams::default(), deployment)
            .await?;
        Ok(created)
    }
}

/// Submit a descriptor with a single create call. No retries.
pub async fn submit(
    api: &dyn DeploymentApi,
    descriptor: &WorkloadDescriptor,
    logger: &ProvisionLogger,
) -> Result<CreatedWorkload, SubmitError> {
    let deployment = descriptor.to_deployment();
    logger.log_creating(descriptor);

    let created = api.create(&descriptor.namespace, &deployment).await?;

    let metadata = created.metadata;
    let name = metadata.name.ok_or(SubmitError::Unnamed)?;
    let workload = CreatedWorkload {
        name,
        namespace: metadata
            .namespace
            .unwrap_or_else(|| descriptor.namespace.clone()),
        uid: metadata.uid,
        created_at: metadata.creation_timestamp.map(|t| t.0),
    };

    logger.log_created(&workload);
    Ok(workload)
}
