//! gantry.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GantryConfig {
    pub daemon: Option<DaemonConfig>,
    pub providers: Option<ProvidersConfig>,
    pub deploy: Option<DeployTuning>,
    /// Environment variables injected into every deployed application.
    pub env: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub port: Option<u16>,
    pub data_dir: Option<String>,
}

/// One credentials block per configured provider. A missing block means
/// that provider is unavailable on this installation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub dokploy: Option<ProviderCredentials>,
    pub vercel: Option<ProviderCredentials>,
    pub netlify: Option<ProviderCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployTuning {
    /// Wall-clock budget for one provider build, in seconds.
    pub build_timeout_secs: Option<u64>,
    /// Interval between build status polls, in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Wall-clock budget for the post-deploy health gate, in seconds.
    pub health_max_wait_secs: Option<u64>,
    /// Interval between health polls, in seconds.
    pub health_poll_secs: Option<u64>,
}

impl DeployTuning {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs.unwrap_or(600))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(5))
    }

    pub fn health_max_wait(&self) -> Duration {
        Duration::from_secs(self.health_max_wait_secs.unwrap_or(120))
    }

    pub fn health_poll(&self) -> Duration {
        Duration::from_secs(self.health_poll_secs.unwrap_or(5))
    }
}

impl GantryConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GantryConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn tuning(&self) -> DeployTuning {
        self.deploy.clone().unwrap_or_default()
    }

    /// Scaffold a minimal gantry.toml with one provider block filled in.
    pub fn scaffold() -> Self {
        GantryConfig {
            daemon: Some(DaemonConfig {
                port: Some(7070),
                data_dir: Some("/var/lib/gantry".to_string()),
            }),
            providers: Some(ProvidersConfig {
                dokploy: Some(ProviderCredentials {
                    base_url: "https://dokploy.example.com".to_string(),
                    token: "CHANGE-ME".to_string(),
                }),
                vercel: None,
                netlify: None,
            }),
            deploy: Some(DeployTuning {
                build_timeout_secs: Some(600),
                poll_interval_secs: Some(5),
                health_max_wait_secs: Some(120),
                health_poll_secs: Some(5),
            }),
            env: None,
        }
    }
}
