//! Domain records persisted by the registry.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gantry_core::meta::ProjectMeta;
use gantry_core::{AppConfig, DeployStatus, ProviderKind};
use serde::{Deserialize, Serialize};

/// How many deployment records are retained per application.
pub const HISTORY_LIMIT: usize = 20;

/// How many trailing log lines a deployment record may keep.
pub const FAILURE_LOG_LINES: usize = 5;

/// Longest retained failure log line, in characters.
pub const FAILURE_LINE_MAX_CHARS: usize = 200;

/// One registered application.
///
/// `name` is the normalized slug and doubles as the table key. The
/// record-level `provider`, `resource_id`, and `domain` fields hold
/// resolved values filled in by the pipeline; the embedded [`AppConfig`]
/// keeps what the operator asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub repo_url: Option<String>,
    pub config: AppConfig,
    #[serde(default)]
    pub meta: Option<ProjectMeta>,
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub removed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<DeploymentRecord>,
}

impl AppRecord {
    /// Builds a fresh record from a config document.
    pub fn new(name: &str, config: AppConfig, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            repo_url: config.repo_url.clone(),
            provider: config.provider,
            domain: config.domain.clone(),
            config,
            meta: None,
            resource_id: None,
            removed: false,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// Most recent deployment that ended in success, if any.
    pub fn last_successful_deploy(&self) -> Option<&DeploymentRecord> {
        self.history
            .iter()
            .rev()
            .find(|r| r.status == DeployStatus::Success)
    }

    /// Most recent deployment attempt, if any.
    pub fn last_deploy(&self) -> Option<&DeploymentRecord> {
        self.history.last()
    }
}

/// Outcome of one deployment attempt, kept in the bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Provider-side deployment id, when the provider reported one.
    pub external_id: Option<String>,
    pub provider: ProviderKind,
    pub status: DeployStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub url: Option<String>,
    /// Bounded tail of the provider build log, kept for failed attempts.
    #[serde(default)]
    pub failure_log: Vec<String>,
}

/// Partial update to an application's config document.
///
/// Fields left as `None` keep their stored values; `env` entries merge
/// key by key into the stored map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppPatch {
    pub repo_url: Option<String>,
    #[serde(rename = "type")]
    pub framework: Option<String>,
    pub port: Option<u16>,
    pub domain: Option<String>,
    pub provider: Option<ProviderKind>,
    pub env: Option<BTreeMap<String, String>>,
}

impl AppPatch {
    pub fn is_empty(&self) -> bool {
        self.repo_url.is_none()
            && self.framework.is_none()
            && self.port.is_none()
            && self.domain.is_none()
            && self.provider.is_none()
            && self.env.is_none()
    }

    /// Merges the patch into a record, updating both the config document
    /// and the record-level resolved fields.
    pub fn apply_to(&self, record: &mut AppRecord) {
        if let Some(repo_url) = &self.repo_url {
            record.config.repo_url = Some(repo_url.clone());
            record.repo_url = Some(repo_url.clone());
        }
        if let Some(framework) = &self.framework {
            record.config.framework = Some(framework.clone());
        }
        if let Some(port) = self.port {
            record.config.port = Some(port);
        }
        if let Some(domain) = &self.domain {
            record.config.domain = Some(domain.clone());
            record.domain = Some(domain.clone());
        }
        if let Some(provider) = self.provider {
            record.config.provider = Some(provider);
            record.provider = Some(provider);
        }
        if let Some(env) = &self.env {
            for (key, value) in env {
                record.config.env.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Clips a provider log tail to the retention bounds: the last
/// [`FAILURE_LOG_LINES`] lines, each at most [`FAILURE_LINE_MAX_CHARS`]
/// characters.
pub fn clip_failure_log<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let skip = lines.len().saturating_sub(FAILURE_LOG_LINES);
    lines[skip..]
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if line.chars().count() > FAILURE_LINE_MAX_CHARS {
                line.chars().take(FAILURE_LINE_MAX_CHARS).collect()
            } else {
                line.to_string()
            }
        })
        .collect()
}
