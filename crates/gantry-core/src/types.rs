//! Shared types used across Gantry crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hosting providers Gantry can deploy to.
///
/// A closed set: every provider-specific response shape is normalized
/// inside its adapter, so nothing above the adapter layer ever needs to
/// know which variant it is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Self-hosted PaaS with container builds.
    Dokploy,
    /// Managed static/edge platform with Git-triggered builds.
    Vercel,
    /// Managed static/edge platform with Git-triggered builds.
    Netlify,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Dokploy => "dokploy",
            ProviderKind::Vercel => "vercel",
            ProviderKind::Netlify => "netlify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dokploy" => Some(ProviderKind::Dokploy),
            "vercel" => Some(ProviderKind::Vercel),
            "netlify" => Some(ProviderKind::Netlify),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal status of one deployment attempt.
///
/// `Timeout` is distinct from `Failed`: the provider may still finish the
/// build server-side after the orchestrator gives up waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Success,
    Failed,
    Canceled,
    Timeout,
}

impl DeployStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DeployStatus::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeployStatus::Success => "success",
            DeployStatus::Failed => "failed",
            DeployStatus::Canceled => "canceled",
            DeployStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The application config document carried by a deploy request.
///
/// `repo_url`, `type`, and `port` are required by the time the pipeline
/// reaches the build-config gate (stage 4); everything else is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional in request bodies; the caller-facing name wins.
    #[serde(default)]
    pub app_name: String,
    pub repo_url: Option<String>,
    /// Framework tag ("nextjs", "astro", "express", ...).
    #[serde(rename = "type")]
    pub framework: Option<String>,
    pub port: Option<u16>,
    pub domain: Option<String>,
    /// Explicit provider choice; defaults by framework when absent.
    pub provider: Option<ProviderKind>,
    /// Environment variables to apply on the provider resource.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn new(app_name: &str, repo_url: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            repo_url: Some(repo_url.to_string()),
            framework: None,
            port: None,
            domain: None,
            provider: None,
            env: BTreeMap::new(),
        }
    }

    /// Required fields that are absent, in a fixed order.
    pub fn missing_build_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.repo_url.as_deref().unwrap_or("").is_empty() {
            missing.push("repo_url");
        }
        if self.framework.as_deref().unwrap_or("").is_empty() {
            missing.push("type");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        missing
    }

    /// Stage-4 gate: `repo_url`, `type`, and `port` must all be present.
    pub fn validate_for_build(&self) -> Result<(), ConfigError> {
        let missing = self.missing_build_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields { fields: missing })
        }
    }
}

/// Validation errors for application config documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("invalid application name: {0:?}")]
    InvalidName(String),
}

/// Normalize an application name to slug form: lowercase, alphanumerics
/// and hyphens, with runs of anything else collapsed to a single hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_roundtrip() {
        for kind in [
            ProviderKind::Dokploy,
            ProviderKind::Vercel,
            ProviderKind::Netlify,
        ] {
            assert_eq!(ProviderKind::parse(kind.label()), Some(kind));
        }
        assert_eq!(ProviderKind::parse("VERCEL"), Some(ProviderKind::Vercel));
        assert_eq!(ProviderKind::parse("heroku"), None);
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("My Demo App"), "my-demo-app");
        assert_eq!(slugify("demo"), "demo");
        assert_eq!(slugify("Shop_API v2"), "shop-api-v2");
    }

    #[test]
    fn slugify_strips_edges_and_collapses_runs() {
        assert_eq!(slugify("--hello--world--"), "hello-world");
        assert_eq!(slugify("a!!!b"), "a-b");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn config_validation_reports_all_missing_fields() {
        let config = AppConfig {
            app_name: "demo".into(),
            repo_url: None,
            framework: None,
            port: None,
            domain: None,
            provider: None,
            env: BTreeMap::new(),
        };
        assert_eq!(
            config.missing_build_fields(),
            vec!["repo_url", "type", "port"]
        );
        let err = config.validate_for_build().unwrap_err();
        assert!(err.to_string().contains("repo_url"));
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn config_validation_passes_when_complete() {
        let mut config = AppConfig::new("demo", "https://example/demo");
        config.framework = Some("nextjs".into());
        config.port = Some(3000);
        assert!(config.validate_for_build().is_ok());
    }

    #[test]
    fn empty_repo_url_counts_as_missing() {
        let mut config = AppConfig::new("demo", "");
        config.framework = Some("nextjs".into());
        config.port = Some(3000);
        assert_eq!(config.missing_build_fields(), vec!["repo_url"]);
    }

    #[test]
    fn config_document_json_shape() {
        let json = r#"{
            "app_name": "demo",
            "repo_url": "https://example/demo",
            "type": "nextjs",
            "port": 3000,
            "domain": "demo.example.com"
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.framework.as_deref(), Some("nextjs"));
        assert_eq!(config.port, Some(3000));
        assert!(config.env.is_empty());
    }
}
