//! Configuration management for the CLI

use anyhow::{Context, Result};
use provisioner_lib::{AuthMode, LogFormat};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Provisioner configuration.
///
/// Layered from an optional JSON file and `PROVISIONER_*` environment
/// variables; command-line flags win over both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionerConfig {
    /// Kubeconfig file to read credentials from
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use
    #[serde(default)]
    pub context: Option<String>,
    /// Credential sources to consult
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl ProvisionerConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder =
                        builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("PROVISIONER"))
            .build()
            .context("Failed to read config file")?;

        config
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("provisioner").join("config.json"))
    }
}

/// Get kubeconfig path.
///
/// Precedence: command-line flag, configured path, first entry of
/// `$KUBECONFIG`, then `~/.kube/config`. `None` if nothing applies.
pub fn kubeconfig_path(
    override_path: Option<&Path>,
    configured: Option<&Path>,
) -> Option<PathBuf> {
    select_kubeconfig_path(
        override_path,
        configured,
        std::env::var_os("KUBECONFIG"),
        dirs_next::home_dir(),
    )
}

fn select_kubeconfig_path(
    override_path: Option<&Path>,
    configured: Option<&Path>,
    env_value: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = override_path.or(configured) {
        return Some(path.to_path_buf());
    }

    if let Some(value) = env_value {
        if let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }

    home.map(|home| home.join(".kube").join("config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that read or write `PROVISIONER_*` variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_flag_wins() {
        let path = select_kubeconfig_path(
            Some(Path::new("/flag/config")),
            Some(Path::new("/configured/config")),
            Some(OsString::from("/env/config")),
            Some(PathBuf::from("/home/op")),
        );
        assert_eq!(path, Some(PathBuf::from("/flag/config")));
    }

    #[test]
    fn test_configured_beats_env() {
        let path = select_kubeconfig_path(
            None,
            Some(Path::new("/configured/config")),
            Some(OsString::from("/env/config")),
            Some(PathBuf::from("/home/op")),
        );
        assert_eq!(path, Some(PathBuf::from("/configured/config")));
    }

    #[cfg(unix)]
    #[test]
    fn test_env_uses_first_entry() {
        let path = select_kubeconfig_path(
            None,
            None,
            Some(OsString::from("/env/a:/env/b")),
            Some(PathBuf::from("/home/op")),
        );
        assert_eq!(path, Some(PathBuf::from("/env/a")));
    }

    #[test]
    fn test_home_default() {
        let path = select_kubeconfig_path(
            None,
            None,
            Some(OsString::new()),
            Some(PathBuf::from("/home/op")),
        );
        assert_eq!(path, Some(PathBuf::from("/home/op/.kube/config")));
    }

    #[test]
    fn test_no_home_no_path() {
        assert_eq!(select_kubeconfig_path(None, None, None, None), None);
    }

    #[test]
    fn test_load_from_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provisioner.json");
        std::fs::write(
            &path,
            r#"{"kubeconfig": "/etc/provisioner/kubeconfig", "context": "staging", "auth_mode": "in-cluster", "log_format": "json"}"#,
        )
        .unwrap();

        let config = ProvisionerConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.kubeconfig,
            Some(PathBuf::from("/etc/provisioner/kubeconfig"))
        );
        assert_eq!(config.context.as_deref(), Some("staging"));
        assert_eq!(config.auth_mode, AuthMode::InCluster);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provisioner.json");
        std::fs::write(&path, "{}").unwrap();

        let config = ProvisionerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.auth_mode, AuthMode::Auto);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.kubeconfig.is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        assert!(ProvisionerConfig::load(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provisioner.json");
        std::fs::write(
            &path,
            r#"{"kubeconfig": "/etc/provisioner/kubeconfig", "auth_mode": "kubeconfig", "context": "staging"}"#,
        )
        .unwrap();

        std::env::set_var("PROVISIONER_AUTH_MODE", "in-cluster");
        std::env::set_var("PROVISIONER_KUBECONFIG", "/run/secrets/kubeconfig");
        std::env::set_var("PROVISIONER_LOG_FORMAT", "json");
        let loaded = ProvisionerConfig::load(Some(&path));
        std::env::remove_var("PROVISIONER_AUTH_MODE");
        std::env::remove_var("PROVISIONER_KUBECONFIG");
        std::env::remove_var("PROVISIONER_LOG_FORMAT");

        let config = loaded.unwrap();
        assert_eq!(config.auth_mode, AuthMode::InCluster);
        assert_eq!(
            config.kubeconfig,
            Some(PathBuf::from("/run/secrets/kubeconfig"))
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.context.as_deref(), Some("staging"));
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provisioner.json");
        std::fs::write(&path, "{}").unwrap();

        std::env::set_var("PROVISIONER_AUTH_MODE", "sideways");
        let loaded = ProvisionerConfig::load(Some(&path));
        std::env::remove_var("PROVISIONER_AUTH_MODE");

        let err = loaded.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}
