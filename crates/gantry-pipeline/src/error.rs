use std::time::Duration;

use gantry_core::types::{ConfigError, ProviderKind};
use gantry_health::HealthError;
use gantry_ledger::LedgerError;
use gantry_provider::{DeployOutcome, ProviderError};
use gantry_registry::RegistryError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can halt a deploy pipeline or fail a control operation.
///
/// Build-terminal variants (`BuildFailed`, `BuildTimeout`, `BuildCanceled`)
/// carry the full [`DeployOutcome`] so the failure can be recorded in the
/// deployment history with its log tail intact.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown application '{0}'; include a config document on first deploy")]
    UnknownApp(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("provider {0} is not configured on this installation")]
    ProviderUnavailable(ProviderKind),

    #[error("no provider selected for '{0}'; earlier gates have not run")]
    ProviderNotSelected(String),

    #[error("no provider resource recorded for '{0}'; provisioning has not run")]
    ResourceNotProvisioned(String),

    #[error("no build recipe for framework '{0}'")]
    NoRecipe(String),

    #[error("provider rejected variables: {}", keys.join(", "))]
    VariablesRejected { keys: Vec<String> },

    #[error("provider did not accept the routing settings")]
    RoutingRefused,

    #[error("build failed on {provider}: {summary}")]
    BuildFailed {
        provider: ProviderKind,
        summary: String,
        outcome: DeployOutcome,
    },

    #[error("build on {provider} still running after {}s; gave up waiting", timeout.as_secs())]
    BuildTimeout {
        provider: ProviderKind,
        timeout: Duration,
        outcome: DeployOutcome,
    },

    #[error("build canceled on {provider}")]
    BuildCanceled {
        provider: ProviderKind,
        outcome: DeployOutcome,
    },

    #[error("health gate failed for {url} after {}s: {}", waited.as_secs(), last_probe_error(errors))]
    HealthGate {
        url: String,
        waited: Duration,
        errors: Vec<String>,
    },

    #[error("no deployed URL known for '{0}'")]
    NoDeployedUrl(String),

    #[error("'{0}' has no successful deployment to roll back to")]
    NoSuccessfulDeploy(String),

    #[error(transparent)]
    Health(#[from] HealthError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),
}

fn last_probe_error(errors: &[String]) -> &str {
    errors.last().map(String::as_str).unwrap_or("no probe results")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_gate_message_names_the_last_probe() {
        let err = PipelineError::HealthGate {
            url: "https://demo.traefik.me".into(),
            waited: Duration::from_secs(120),
            errors: vec!["GET /health -> HTTP 502".into(), "GET / -> HTTP 502".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("120s"));
        assert!(msg.contains("GET / -> HTTP 502"));
    }

    #[test]
    fn variables_rejected_lists_the_keys() {
        let err = PipelineError::VariablesRejected {
            keys: vec!["PATH".into(), "HOME".into()],
        };
        assert_eq!(err.to_string(), "provider rejected variables: PATH, HOME");
    }
}
