//! Credentials from a kubeconfig file

use super::{AuthError, CredentialOrigin, CredentialSource};
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::PathBuf;

/// Reads credentials from a kubeconfig file on disk
#[derive(Debug, Clone, Default)]
pub struct KubeconfigSource {
    path: Option<PathBuf>,
    context: Option<String>,
}

impl KubeconfigSource {
    /// `None` means no path could be determined; loading then fails and the
    /// resolver moves on.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            context: None,
        }
    }

    /// Use a named context instead of `current-context`
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}

#[async_trait]
impl CredentialSource for KubeconfigSource {
    fn origin(&self) -> CredentialOrigin {
        CredentialOrigin::Kubeconfig
    }

    async fn load(&self) -> Result<Config, AuthError> {
        let path = self.path.as_ref().ok_or_else(|| {
            AuthError::source_failed(self.origin(), "no kubeconfig path available")
        })?;

        let kubeconfig =
            Kubeconfig::read_from(path).map_err(|e| AuthError::source_failed(self.origin(), e))?;

        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| {
                AuthError::source_failed(self.origin(), format!("{}: {}", path.display(), e))
            })
    }
}
