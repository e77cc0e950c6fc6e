//! Provider-neutral request and result shapes.
//!
//! The pipeline speaks these types exclusively; everything provider-specific
//! (paths, field names, status vocabularies) stays inside the adapters.

use std::time::Duration;

use gantry_core::types::DeployStatus;

/// What the pipeline asks a provider to host.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub repo_url: String,
    pub framework: String,
    pub port: u16,
    /// Runtime image recipe selected for the framework, if any.
    pub build_recipe: Option<String>,
}

/// Routing settings applied during the configure step.
#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub domain: String,
    pub port: u16,
    pub health_path: String,
}

impl RouteSettings {
    pub fn new(domain: impl Into<String>, port: u16) -> Self {
        Self {
            domain: domain.into(),
            port,
            health_path: "/health".to_string(),
        }
    }
}

/// Handle to a build the provider has accepted but not finished.
#[derive(Debug, Clone)]
pub struct BuildRef {
    pub resource_id: String,
    /// Provider-assigned deployment identifier, when the trigger reply
    /// carries one. Netlify and vercel do; dokploy does not.
    pub external_id: Option<String>,
    pub url: Option<String>,
}

/// Normalized provider build state observed by a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    InProgress,
    Succeeded { url: Option<String> },
    Failed { log_tail: Vec<String> },
    Canceled,
}

/// Final result of a release: triggered, polled to a terminal state (or a
/// deadline), and summarized.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub status: DeployStatus,
    pub external_id: Option<String>,
    pub url: Option<String>,
    /// Wall time from trigger to the terminal observation. On timeout this
    /// is exactly the deadline that was given.
    pub elapsed: Duration,
    pub log_tail: Vec<String>,
}

/// Providers are inconsistent about returning full URLs versus bare hosts;
/// normalize to something a health check can GET.
pub(crate) fn absolute_url(host_or_url: &str) -> String {
    if host_or_url.starts_with("http://") || host_or_url.starts_with("https://") {
        host_or_url.to_string()
    } else {
        format!("https://{host_or_url}")
    }
}
