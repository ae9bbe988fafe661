//! Credentials from the ambient service-account identity

use super::{AuthError, CredentialOrigin, CredentialSource};
use async_trait::async_trait;
use kube::Config;

/// Uses the mounted service-account token and CA together with the
/// `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT` endpoint. Only valid
/// inside a pod.
#[derive(Debug, Clone, Copy, Default)]
pub struct InClusterSource;

#[async_trait]
impl CredentialSource for InClusterSource {
    fn origin(&self) -> CredentialOrigin {
        CredentialOrigin::InCluster
    }

    async fn load(&self) -> Result<Config, AuthError> {
        Config::incluster().map_err(|e| AuthError::source_failed(self.origin(), e))
    }
}
