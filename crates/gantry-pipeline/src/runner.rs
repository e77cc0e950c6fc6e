//! The deploy job: walks the ledger's gates in order and runs each stage.
//!
//! The ledger is the source of truth for where a deploy stands. Every pass
//! asks it for the next actionable stage, runs exactly that stage, persists
//! the record mutations, and only then marks the gate done — so a crash
//! between stages resumes at the first unchecked gate with nothing lost.
//! A stage failure appends a note to the ledger, records the attempt in
//! the deployment history when a provider was involved, and halts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::Deps;
use gantry_core::meta::{ProjectMeta, build_recipe, default_provider};
use gantry_core::stage::{StageDef, StageId, default_stages};
use gantry_core::types::{ConfigError, DeployStatus, ProviderKind};
use gantry_ledger::NextAction;
use gantry_provider::{DeployOutcome, Provider, ResourceSpec, RouteSettings, run_with_retry};
use gantry_registry::{AppRecord, DeploymentRecord, clip_failure_log};
use gantry_stream::{DeployEvent, EventKind};

/// Fallback application port when the config document names none.
const DEFAULT_APP_PORT: u16 = 3000;

/// State threaded through one deploy job, across stages.
pub(crate) struct DeployContext {
    started_at: DateTime<Utc>,
    t0: Instant,
    /// Release outcome from the build gate, consumed by the record gate.
    build: Option<BuildResult>,
}

struct BuildResult {
    outcome: DeployOutcome,
    retries: u32,
}

impl DeployContext {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            t0: Instant::now(),
            build: None,
        }
    }
}

/// Entry point spawned on the deploy queue for one application.
pub(crate) async fn run_deploy_job(deps: Arc<Deps>, app: String) {
    info!(app = %app, "deploy pipeline starting");
    deps.stream
        .publish(DeployEvent::new(&app, EventKind::Started, "deploy started"))
        .await;

    let mut ctx = DeployContext::new();
    match drive_stages(&deps, &app, &mut ctx).await {
        Ok(()) => {
            info!(app = %app, "deploy pipeline complete");
            deps.stream
                .publish(DeployEvent::new(&app, EventKind::Finished, "deploy complete"))
                .await;
        }
        Err(err) => {
            error!(app = %app, error = %err, "deploy pipeline halted");
            deps.stream
                .publish(DeployEvent::new(
                    &app,
                    EventKind::Finished,
                    format!("deploy failed: {err}"),
                ))
                .await;
        }
    }
}

async fn drive_stages(deps: &Deps, app: &str, ctx: &mut DeployContext) -> PipelineResult<()> {
    deps.ledgers.load_or_create(app, &default_stages())?;

    loop {
        let NextAction::Stage { stage } = deps.ledgers.next_actionable(app)? else {
            return Ok(());
        };
        deps.stream
            .publish(
                DeployEvent::new(app, EventKind::StageStarted, stage.description.clone())
                    .at_stage(stage.index, &stage.name),
            )
            .await;

        let mut record = deps
            .registry
            .get(app)?
            .ok_or_else(|| PipelineError::UnknownApp(app.to_string()))?;

        match run_stage(deps, &mut record, &stage, ctx).await {
            Ok(result) => {
                // Record mutations land before the gate is checked off:
                // a crash in between reruns an idempotent stage instead of
                // leaving a checked gate with missing state.
                deps.registry.put(&record)?;
                deps.ledgers.mark_done(app, stage.index, &result)?;
                info!(app = %app, stage = stage.index, name = %stage.name, "stage complete");
                deps.stream
                    .publish(
                        DeployEvent::new(app, EventKind::StageCompleted, result)
                            .at_stage(stage.index, &stage.name),
                    )
                    .await;
            }
            Err(err) => {
                warn!(app = %app, stage = stage.index, error = %err, "stage failed; halting");
                // Bookkeeping failures must not mask the stage error.
                if let Err(note_err) = deps
                    .ledgers
                    .append_note(app, stage.index, &format!("failed: {err}"))
                {
                    error!(app = %app, error = %note_err, "could not write the failure note");
                }
                deps.stream
                    .publish(
                        DeployEvent::new(app, EventKind::StageFailed, err.to_string())
                            .at_stage(stage.index, &stage.name),
                    )
                    .await;
                if let Some(attempt) = failure_record(&record, &err, ctx) {
                    if let Err(rec_err) = deps.registry.record_deployment(app, attempt) {
                        error!(app = %app, error = %rec_err, "could not record the failed attempt");
                    }
                }
                return Err(err);
            }
        }
    }
}

async fn run_stage(
    deps: &Deps,
    record: &mut AppRecord,
    stage: &StageDef,
    ctx: &mut DeployContext,
) -> PipelineResult<String> {
    match StageId::from_index(stage.index) {
        Some(StageId::RepoRegistered) => stage_repo_registered(record),
        Some(StageId::SourceAnalyzed) => stage_source_analyzed(record),
        Some(StageId::ProviderSelected) => stage_provider_selected(deps, record),
        Some(StageId::BuildConfigReady) => stage_build_config_ready(record),
        Some(StageId::RuntimeImageReady) => stage_runtime_image_ready(record),
        Some(StageId::ResourceProvisioned) => stage_resource_provisioned(deps, record).await,
        Some(StageId::VariablesApplied) => stage_variables_applied(deps, record).await,
        Some(StageId::RoutingConfigured) => stage_routing_configured(deps, record).await,
        Some(StageId::BuildReleased) => stage_build_released(deps, record, ctx).await,
        Some(StageId::HealthVerified) => stage_health_verified(deps, record, ctx).await,
        Some(StageId::DeploymentRecorded) => stage_deployment_recorded(deps, record, ctx).await,
        // A ledger written by a newer version could carry stages this
        // build does not know how to run.
        None => Err(gantry_ledger::LedgerError::NotFound(stage.index).into()),
    }
}

fn stage_repo_registered(record: &mut AppRecord) -> PipelineResult<String> {
    let repo_url = record
        .config
        .repo_url
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or(ConfigError::MissingFields {
            fields: vec!["repo_url"],
        })?;
    record.repo_url = Some(repo_url.clone());
    Ok(format!("repository {repo_url} registered"))
}

fn stage_source_analyzed(record: &mut AppRecord) -> PipelineResult<String> {
    let tag = record
        .config
        .framework
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::MissingFields {
            fields: vec!["type"],
        })?;
    let port = record.config.port.unwrap_or(DEFAULT_APP_PORT);
    let meta = ProjectMeta::for_framework(&tag, port);
    let result = format!(
        "analyzed as {}/{} on port {}",
        meta.language, meta.framework, meta.port
    );
    record.meta = Some(meta);
    Ok(result)
}

fn stage_provider_selected(deps: &Deps, record: &mut AppRecord) -> PipelineResult<String> {
    let (kind, how) = match record.config.provider {
        Some(kind) => (kind, "configured"),
        None => (default_provider(&framework_of(record)), "default for framework"),
    };
    if deps.providers.get(kind).is_none() {
        return Err(PipelineError::ProviderUnavailable(kind));
    }
    record.provider = Some(kind);
    Ok(format!("provider {kind} selected ({how})"))
}

fn stage_build_config_ready(record: &mut AppRecord) -> PipelineResult<String> {
    record.config.validate_for_build()?;
    // The detector may have guessed the port before the config named one.
    if let (Some(port), Some(meta)) = (record.config.port, record.meta.as_mut()) {
        meta.port = port;
    }
    Ok(format!(
        "build config complete (type={}, port={})",
        record.config.framework.clone().unwrap_or_default(),
        record.config.port.unwrap_or_default(),
    ))
}

fn stage_runtime_image_ready(record: &AppRecord) -> PipelineResult<String> {
    let framework = framework_of(record);
    let recipe =
        build_recipe(&framework).ok_or_else(|| PipelineError::NoRecipe(framework.clone()))?;
    Ok(format!("runtime image recipe {recipe} selected for {framework}"))
}

async fn stage_resource_provisioned(
    deps: &Deps,
    record: &mut AppRecord,
) -> PipelineResult<String> {
    let (provider, kind) = provider_for(deps, record)?;
    let framework = framework_of(record);
    let spec = ResourceSpec {
        repo_url: record.repo_url.clone().unwrap_or_default(),
        framework: framework.clone(),
        port: record.config.port.unwrap_or(DEFAULT_APP_PORT),
        build_recipe: build_recipe(&framework).map(str::to_string),
    };
    let name = record.name.clone();
    let ensured = run_with_retry(&deps.backoff, |_| provider.ensure_resource(&name, &spec)).await?;
    record.resource_id = Some(ensured.value.clone());
    Ok(match ensured.retries {
        0 => format!("resource {} ready on {kind}", ensured.value),
        n => format!("resource {} ready on {kind} after {n} retries", ensured.value),
    })
}

async fn stage_variables_applied(deps: &Deps, record: &mut AppRecord) -> PipelineResult<String> {
    let mut vars = deps.extra_env.clone();
    for (key, value) in &record.config.env {
        vars.insert(key.clone(), value.clone());
    }
    if vars.is_empty() {
        return Ok("no variables to apply".to_string());
    }

    let (provider, _) = provider_for(deps, record)?;
    let resource_id = resource_of(record)?;
    let applied = run_with_retry(&deps.backoff, |_| provider.set_variables(&resource_id, &vars))
        .await?
        .value;

    let rejected: Vec<String> = applied
        .iter()
        .filter(|(_, ok)| !**ok)
        .map(|(key, _)| key.clone())
        .collect();
    if !rejected.is_empty() {
        return Err(PipelineError::VariablesRejected { keys: rejected });
    }
    Ok(format!("{} variables applied", applied.len()))
}

async fn stage_routing_configured(deps: &Deps, record: &mut AppRecord) -> PipelineResult<String> {
    let (provider, kind) = provider_for(deps, record)?;
    let resource_id = resource_of(record)?;
    let domain = record
        .config
        .domain
        .clone()
        .or_else(|| record.domain.clone())
        .unwrap_or_else(|| default_domain(kind, &record.name));
    let port = record.config.port.unwrap_or(DEFAULT_APP_PORT);

    let route = RouteSettings::new(domain.clone(), port);
    let accepted = run_with_retry(&deps.backoff, |_| provider.configure(&resource_id, &route))
        .await?
        .value;
    if !accepted {
        return Err(PipelineError::RoutingRefused);
    }
    record.domain = Some(domain.clone());
    Ok(format!("routing configured: {domain} -> port {port}"))
}

async fn stage_build_released(
    deps: &Deps,
    record: &mut AppRecord,
    ctx: &mut DeployContext,
) -> PipelineResult<String> {
    let (provider, kind) = provider_for(deps, record)?;
    let resource_id = resource_of(record)?;
    let timeout = deps.tuning.build_timeout();
    let poll = deps.tuning.poll_interval();

    let released = run_with_retry(&deps.backoff, |_| {
        provider.trigger_and_wait(&resource_id, timeout, poll)
    })
    .await?;
    let retries = released.retries;
    let outcome = released.value;

    if outcome.status != DeployStatus::Success {
        return Err(release_error(kind, timeout, outcome));
    }

    let location = outcome
        .url
        .clone()
        .or_else(|| record.domain.clone())
        .unwrap_or_else(|| resource_id.clone());
    let result = match retries {
        0 => format!("build released at {location} in {}s", outcome.elapsed.as_secs()),
        n => format!(
            "build released at {location} in {}s after {n} retries",
            outcome.elapsed.as_secs()
        ),
    };
    ctx.build = Some(BuildResult { outcome, retries });
    Ok(result)
}

async fn stage_health_verified(
    deps: &Deps,
    record: &mut AppRecord,
    ctx: &DeployContext,
) -> PipelineResult<String> {
    // Prefer the URL the provider reported for this release; fall back to
    // the routed domain for resumed pipelines that skipped the build gate.
    let base_url = ctx
        .build
        .as_ref()
        .and_then(|b| b.outcome.url.clone())
        .or_else(|| record.domain.clone().map(|d| format!("https://{d}")))
        .ok_or_else(|| PipelineError::NoDeployedUrl(record.name.clone()))?;

    let wait = deps
        .verifier
        .wait_for_healthy(
            &base_url,
            deps.tuning.health_max_wait(),
            deps.tuning.health_poll(),
        )
        .await;
    if wait.healthy {
        let endpoint = wait.last.matched_endpoint.clone().unwrap_or_default();
        Ok(format!(
            "{base_url}{endpoint} answered 200 after {} checks",
            wait.checks
        ))
    } else {
        Err(PipelineError::HealthGate {
            url: base_url,
            waited: wait.waited,
            errors: wait.last.errors,
        })
    }
}

async fn stage_deployment_recorded(
    deps: &Deps,
    record: &mut AppRecord,
    ctx: &mut DeployContext,
) -> PipelineResult<String> {
    let (_, kind) = provider_for(deps, record)?;
    let (external_id, url, elapsed) = match ctx.build.take() {
        Some(build) => (
            build.outcome.external_id,
            build.outcome.url,
            build.outcome.elapsed,
        ),
        // Resumed pipeline: the build gate was checked in an earlier run,
        // so record what is still known.
        None => (
            None,
            record.domain.clone().map(|d| format!("https://{d}")),
            ctx.t0.elapsed(),
        ),
    };
    let deploy = DeploymentRecord {
        external_id,
        provider: kind,
        status: DeployStatus::Success,
        started_at: ctx.started_at,
        elapsed,
        url,
        failure_log: Vec::new(),
    };
    // record_deployment rewrites the stored record; adopt it so the
    // driver's follow-up put does not clobber the new history.
    *record = deps.registry.record_deployment(&record.name, deploy)?;
    Ok(format!(
        "deployment recorded (success, {} in history)",
        record.history.len()
    ))
}

/// Turn a non-success release outcome into its pipeline error, keeping the
/// outcome for the history record.
fn release_error(kind: ProviderKind, timeout: Duration, outcome: DeployOutcome) -> PipelineError {
    match outcome.status {
        DeployStatus::Timeout => PipelineError::BuildTimeout {
            provider: kind,
            timeout,
            outcome,
        },
        DeployStatus::Canceled => PipelineError::BuildCanceled {
            provider: kind,
            outcome,
        },
        _ => {
            let summary = outcome
                .log_tail
                .last()
                .cloned()
                .unwrap_or_else(|| "provider reported a failed build".to_string());
            PipelineError::BuildFailed {
                provider: kind,
                summary,
                outcome,
            }
        }
    }
}

/// Deployment history entry for a halted pipeline, when the failure
/// involved the provider at all. Pre-provider failures (config validation,
/// missing recipe) leave no history entry; the ledger note carries them.
fn failure_record(
    record: &AppRecord,
    err: &PipelineError,
    ctx: &DeployContext,
) -> Option<DeploymentRecord> {
    let provider = record.provider?;
    let (status, external_id, url, elapsed, log) = match err {
        PipelineError::BuildFailed { outcome, .. }
        | PipelineError::BuildTimeout { outcome, .. }
        | PipelineError::BuildCanceled { outcome, .. } => (
            match err {
                PipelineError::BuildTimeout { .. } => DeployStatus::Timeout,
                PipelineError::BuildCanceled { .. } => DeployStatus::Canceled,
                _ => DeployStatus::Failed,
            },
            outcome.external_id.clone(),
            outcome.url.clone(),
            outcome.elapsed,
            outcome.log_tail.clone(),
        ),
        PipelineError::HealthGate { url, errors, .. } => (
            DeployStatus::Failed,
            None,
            Some(url.clone()),
            ctx.t0.elapsed(),
            errors.clone(),
        ),
        PipelineError::Provider(cause) => (
            DeployStatus::Failed,
            None,
            None,
            ctx.t0.elapsed(),
            vec![cause.to_string()],
        ),
        PipelineError::VariablesRejected { .. } | PipelineError::RoutingRefused => (
            DeployStatus::Failed,
            None,
            None,
            ctx.t0.elapsed(),
            vec![err.to_string()],
        ),
        _ => return None,
    };
    Some(DeploymentRecord {
        external_id,
        provider,
        status,
        started_at: ctx.started_at,
        elapsed,
        url,
        failure_log: clip_failure_log(&log),
    })
}

fn framework_of(record: &AppRecord) -> String {
    record
        .meta
        .as_ref()
        .map(|m| m.framework.clone())
        .or_else(|| record.config.framework.clone())
        .unwrap_or_default()
}

fn provider_for<'a>(
    deps: &'a Deps,
    record: &AppRecord,
) -> PipelineResult<(&'a Provider, ProviderKind)> {
    let kind = record
        .provider
        .ok_or_else(|| PipelineError::ProviderNotSelected(record.name.clone()))?;
    let provider = deps
        .providers
        .get(kind)
        .ok_or(PipelineError::ProviderUnavailable(kind))?;
    Ok((provider, kind))
}

fn resource_of(record: &AppRecord) -> PipelineResult<String> {
    record
        .resource_id
        .clone()
        .ok_or_else(|| PipelineError::ResourceNotProvisioned(record.name.clone()))
}

/// Placeholder domain per provider when the config names none.
fn default_domain(kind: ProviderKind, app: &str) -> String {
    match kind {
        ProviderKind::Dokploy => format!("{app}.traefik.me"),
        ProviderKind::Vercel => format!("{app}.vercel.app"),
        ProviderKind::Netlify => format!("{app}.netlify.app"),
    }
}

/// Rollback job: re-release the last successful deployment, health-check
/// it, and record the result. Runs on the same deploy lane as normal
/// deploys so the two can never interleave.
pub(crate) async fn run_rollback_job(deps: Arc<Deps>, app: String) {
    info!(app = %app, "rollback starting");
    deps.stream
        .publish(DeployEvent::new(&app, EventKind::Started, "rollback started"))
        .await;

    let message = match drive_rollback(&deps, &app).await {
        Ok(url) => {
            info!(app = %app, url = %url, "rollback complete");
            format!("rollback complete: {url}")
        }
        Err(err) => {
            error!(app = %app, error = %err, "rollback failed");
            format!("rollback failed: {err}")
        }
    };
    deps.stream
        .publish(DeployEvent::new(&app, EventKind::Finished, message))
        .await;
}

async fn drive_rollback(deps: &Deps, app: &str) -> PipelineResult<String> {
    let record = deps
        .registry
        .get(app)?
        .ok_or_else(|| PipelineError::UnknownApp(app.to_string()))?;
    let target = record
        .last_successful_deploy()
        .cloned()
        .ok_or_else(|| PipelineError::NoSuccessfulDeploy(app.to_string()))?;
    let kind = record
        .provider
        .ok_or_else(|| PipelineError::ProviderNotSelected(app.to_string()))?;
    let provider = deps
        .providers
        .get(kind)
        .ok_or(PipelineError::ProviderUnavailable(kind))?;
    let resource_id = record
        .resource_id
        .clone()
        .ok_or_else(|| PipelineError::ResourceNotProvisioned(app.to_string()))?;

    info!(
        app = %app,
        target = target.external_id.as_deref().unwrap_or("(unnamed)"),
        "re-releasing last successful deployment"
    );
    let started_at = Utc::now();
    let timeout = deps.tuning.build_timeout();
    let outcome = run_with_retry(&deps.backoff, |_| {
        provider.trigger_and_wait(&resource_id, timeout, deps.tuning.poll_interval())
    })
    .await?
    .value;

    if outcome.status != DeployStatus::Success {
        let attempt = DeploymentRecord {
            external_id: outcome.external_id.clone(),
            provider: kind,
            status: outcome.status,
            started_at,
            elapsed: outcome.elapsed,
            url: outcome.url.clone(),
            failure_log: clip_failure_log(&outcome.log_tail),
        };
        deps.registry.record_deployment(app, attempt)?;
        return Err(release_error(kind, timeout, outcome));
    }

    let base_url = outcome
        .url
        .clone()
        .or_else(|| record.domain.clone().map(|d| format!("https://{d}")))
        .or_else(|| target.url.clone())
        .ok_or_else(|| PipelineError::NoDeployedUrl(app.to_string()))?;
    let wait = deps
        .verifier
        .wait_for_healthy(
            &base_url,
            deps.tuning.health_max_wait(),
            deps.tuning.health_poll(),
        )
        .await;
    if !wait.healthy {
        let attempt = DeploymentRecord {
            external_id: outcome.external_id.clone(),
            provider: kind,
            status: DeployStatus::Failed,
            started_at,
            elapsed: outcome.elapsed,
            url: Some(base_url.clone()),
            failure_log: clip_failure_log(&wait.last.errors),
        };
        deps.registry.record_deployment(app, attempt)?;
        return Err(PipelineError::HealthGate {
            url: base_url,
            waited: wait.waited,
            errors: wait.last.errors,
        });
    }

    let deploy = DeploymentRecord {
        external_id: outcome.external_id.clone(),
        provider: kind,
        status: DeployStatus::Success,
        started_at,
        elapsed: outcome.elapsed,
        url: Some(base_url.clone()),
        failure_log: Vec::new(),
    };
    deps.registry.record_deployment(app, deploy)?;

    // The checklist keeps a trace of the re-release too.
    deps.ledgers.load_or_create(app, &default_stages())?;
    let note = format!(
        "rollback: re-released {} ({base_url})",
        target.external_id.as_deref().unwrap_or("previous deployment")
    );
    deps.ledgers
        .append_note(app, StageId::DeploymentRecorded.index(), &note)?;
    Ok(base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::types::AppConfig;

    fn record_with_provider(kind: Option<ProviderKind>) -> AppRecord {
        let mut record = AppRecord::new(
            "demo",
            AppConfig::new("demo", "https://github.com/acme/demo"),
            Utc::now(),
        );
        record.provider = kind;
        record
    }

    #[test]
    fn default_domains_per_provider() {
        assert_eq!(default_domain(ProviderKind::Dokploy, "shop"), "shop.traefik.me");
        assert_eq!(default_domain(ProviderKind::Vercel, "shop"), "shop.vercel.app");
        assert_eq!(default_domain(ProviderKind::Netlify, "shop"), "shop.netlify.app");
    }

    #[test]
    fn failure_record_skips_pre_provider_errors() {
        let ctx = DeployContext::new();
        let record = record_with_provider(Some(ProviderKind::Dokploy));
        let err = PipelineError::NoRecipe("cobol".into());
        assert!(failure_record(&record, &err, &ctx).is_none());

        // Without a selected provider there is nothing to attribute the
        // attempt to, even for provider-class errors.
        let record = record_with_provider(None);
        let err = PipelineError::Provider(gantry_provider::ProviderError::Transport("x".into()));
        assert!(failure_record(&record, &err, &ctx).is_none());
    }

    #[test]
    fn failure_record_keeps_the_build_outcome() {
        let ctx = DeployContext::new();
        let record = record_with_provider(Some(ProviderKind::Vercel));
        let outcome = DeployOutcome {
            status: DeployStatus::Failed,
            external_id: Some("dpl_9".into()),
            url: Some("https://demo.vercel.app".into()),
            elapsed: Duration::from_secs(42),
            log_tail: vec!["line1".into(), "line2".into()],
        };
        let err = release_error(ProviderKind::Vercel, Duration::from_secs(600), outcome);

        let attempt = failure_record(&record, &err, &ctx).unwrap();
        assert_eq!(attempt.status, DeployStatus::Failed);
        assert_eq!(attempt.external_id.as_deref(), Some("dpl_9"));
        assert_eq!(attempt.elapsed, Duration::from_secs(42));
        assert_eq!(attempt.failure_log, vec!["line1", "line2"]);
    }

    #[test]
    fn release_error_distinguishes_timeout_and_cancel() {
        let outcome = |status| DeployOutcome {
            status,
            external_id: None,
            url: None,
            elapsed: Duration::from_secs(600),
            log_tail: Vec::new(),
        };
        assert!(matches!(
            release_error(ProviderKind::Dokploy, Duration::from_secs(600), outcome(DeployStatus::Timeout)),
            PipelineError::BuildTimeout { .. }
        ));
        assert!(matches!(
            release_error(ProviderKind::Vercel, Duration::from_secs(600), outcome(DeployStatus::Canceled)),
            PipelineError::BuildCanceled { .. }
        ));
        assert!(matches!(
            release_error(ProviderKind::Vercel, Duration::from_secs(600), outcome(DeployStatus::Failed)),
            PipelineError::BuildFailed { .. }
        ));
    }

    #[test]
    fn framework_prefers_analyzed_meta() {
        let mut record = record_with_provider(None);
        record.config.framework = Some("express".into());
        assert_eq!(framework_of(&record), "express");

        record.meta = Some(ProjectMeta::for_framework("nextjs", 3000));
        assert_eq!(framework_of(&record), "nextjs");
    }
}
