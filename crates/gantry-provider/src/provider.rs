//! The uniform provider contract and the set of configured adapters.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::dokploy::DokployAdapter;
use crate::error::{ProviderError, ProviderResult};
use crate::netlify::NetlifyAdapter;
use crate::types::{BuildRef, BuildState, DeployOutcome, ResourceSpec, RouteSettings};
use crate::vercel::VercelAdapter;
use gantry_core::config::ProvidersConfig;
use gantry_core::types::{DeployStatus, ProviderKind};

/// One configured hosting provider.
///
/// A closed enum rather than a trait object: the set of providers is fixed,
/// and the shared polling and variable-application logic lives here so each
/// adapter only has to translate wire shapes.
pub enum Provider {
    Dokploy(DokployAdapter),
    Vercel(VercelAdapter),
    Netlify(NetlifyAdapter),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Dokploy(_) => ProviderKind::Dokploy,
            Provider::Vercel(_) => ProviderKind::Vercel,
            Provider::Netlify(_) => ProviderKind::Netlify,
        }
    }

    /// Find or create the hosted resource for `name`. Idempotent: an
    /// existing resource (matched case-insensitively) is reused, never
    /// duplicated.
    pub async fn ensure_resource(&self, name: &str, spec: &ResourceSpec) -> ProviderResult<String> {
        match self {
            Provider::Dokploy(adapter) => adapter.ensure_resource(name, spec).await,
            Provider::Vercel(adapter) => adapter.ensure_resource(name, spec).await,
            Provider::Netlify(adapter) => adapter.ensure_resource(name, spec).await,
        }
    }

    /// Apply routing settings. `Ok(false)` means the provider answered but
    /// did not accept the settings.
    pub async fn configure(&self, resource_id: &str, route: &RouteSettings) -> ProviderResult<bool> {
        match self {
            Provider::Dokploy(adapter) => adapter.configure(resource_id, route).await,
            Provider::Vercel(adapter) => adapter.configure(resource_id, route).await,
            Provider::Netlify(adapter) => adapter.configure(resource_id, route).await,
        }
    }

    pub async fn set_variable(
        &self,
        resource_id: &str,
        key: &str,
        value: &str,
    ) -> ProviderResult<bool> {
        match self {
            Provider::Dokploy(adapter) => adapter.set_variable(resource_id, key, value).await,
            Provider::Vercel(adapter) => adapter.set_variable(resource_id, key, value).await,
            Provider::Netlify(adapter) => adapter.set_variable(resource_id, key, value).await,
        }
    }

    /// Apply every variable, one call per key, and report per-key success.
    ///
    /// A rejection marks that key `false` and moves on, so a single bad
    /// variable never hides the fate of the rest. Transient failures abort
    /// the whole call instead, leaving the retry driver to re-run it; the
    /// per-key applies are idempotent.
    pub async fn set_variables(
        &self,
        resource_id: &str,
        vars: &BTreeMap<String, String>,
    ) -> ProviderResult<BTreeMap<String, bool>> {
        let mut results = BTreeMap::new();
        for (key, value) in vars {
            match self.set_variable(resource_id, key, value).await {
                Ok(applied) => {
                    results.insert(key.clone(), applied);
                }
                Err(err @ ProviderError::Rejected { .. }) => {
                    warn!(provider = %self.kind(), key = %key, error = %err, "variable rejected");
                    results.insert(key.clone(), false);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(results)
    }

    async fn trigger(&self, resource_id: &str) -> ProviderResult<BuildRef> {
        match self {
            Provider::Dokploy(adapter) => adapter.trigger(resource_id).await,
            Provider::Vercel(adapter) => adapter.trigger(resource_id).await,
            Provider::Netlify(adapter) => adapter.trigger(resource_id).await,
        }
    }

    async fn poll_build(&self, build: &BuildRef) -> ProviderResult<BuildState> {
        match self {
            Provider::Dokploy(adapter) => adapter.poll_build(build).await,
            Provider::Vercel(adapter) => adapter.poll_build(build).await,
            Provider::Netlify(adapter) => adapter.poll_build(build).await,
        }
    }

    /// Trigger a build and poll until it reaches a terminal state or the
    /// deadline passes.
    ///
    /// A timeout is a normal outcome, not an error: the returned
    /// [`DeployOutcome`] carries `status: Timeout` with `elapsed` equal to
    /// `timeout` exactly. Sleeps are clamped so the deadline is never
    /// overshot.
    pub async fn trigger_and_wait(
        &self,
        resource_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> ProviderResult<DeployOutcome> {
        let started = Instant::now();
        let deadline = started + timeout;

        let build = self.trigger(resource_id).await?;
        info!(
            provider = %self.kind(),
            resource = resource_id,
            external = ?build.external_id,
            "build triggered"
        );

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    provider = %self.kind(),
                    resource = resource_id,
                    timeout_secs = timeout.as_secs(),
                    "build still running at the deadline; giving up on it"
                );
                return Ok(DeployOutcome {
                    status: DeployStatus::Timeout,
                    external_id: build.external_id,
                    url: build.url,
                    elapsed: timeout,
                    log_tail: Vec::new(),
                });
            }

            match self.poll_build(&build).await? {
                BuildState::InProgress => {}
                BuildState::Succeeded { url } => {
                    let elapsed = started.elapsed();
                    info!(
                        provider = %self.kind(),
                        resource = resource_id,
                        elapsed_secs = elapsed.as_secs(),
                        "build succeeded"
                    );
                    return Ok(DeployOutcome {
                        status: DeployStatus::Success,
                        external_id: build.external_id,
                        url: url.or(build.url),
                        elapsed,
                        log_tail: Vec::new(),
                    });
                }
                BuildState::Failed { log_tail } => {
                    return Ok(DeployOutcome {
                        status: DeployStatus::Failed,
                        external_id: build.external_id,
                        url: build.url,
                        elapsed: started.elapsed(),
                        log_tail,
                    });
                }
                BuildState::Canceled => {
                    return Ok(DeployOutcome {
                        status: DeployStatus::Canceled,
                        external_id: build.external_id,
                        url: build.url,
                        elapsed: started.elapsed(),
                        log_tail: Vec::new(),
                    });
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(poll_interval.min(remaining)).await;
        }
    }
}

/// The providers configured on this installation, keyed by kind.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: Arc<HashMap<ProviderKind, Provider>>,
}

impl ProviderSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build adapters for every credentials block present in the config.
    pub fn from_config(config: &ProvidersConfig) -> ProviderResult<Self> {
        let mut providers = HashMap::new();
        if let Some(creds) = &config.dokploy {
            providers.insert(
                ProviderKind::Dokploy,
                Provider::Dokploy(DokployAdapter::connect(creds)?),
            );
        }
        if let Some(creds) = &config.vercel {
            providers.insert(
                ProviderKind::Vercel,
                Provider::Vercel(VercelAdapter::connect(creds)?),
            );
        }
        if let Some(creds) = &config.netlify {
            providers.insert(
                ProviderKind::Netlify,
                Provider::Netlify(NetlifyAdapter::connect(creds)?),
            );
        }
        Ok(Self {
            providers: Arc::new(providers),
        })
    }

    /// A set holding exactly one provider. Test installations mostly want
    /// this with a scripted transport behind the adapter.
    pub fn single(provider: Provider) -> Self {
        let mut providers = HashMap::new();
        providers.insert(provider.kind(), provider);
        Self {
            providers: Arc::new(providers),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Provider> {
        self.providers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Configured provider kinds, in a stable order.
    pub fn available(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.label());
        kinds
    }
}
