//! Control surface for the deploy pipeline.
//!
//! The orchestrator owns the shared subsystem handles and exposes the
//! operations the API layer calls: trigger a deploy, answer "what's next"
//! for an agent walking the checklist manually, mark a stage done, roll
//! back, and report status. Deploy work itself runs on the queue's lanes
//! in [`crate::runner`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::runner;
use crate::status::AppStatus;
use gantry_core::backoff::BackoffPolicy;
use gantry_core::config::DeployTuning;
use gantry_core::stage::default_stages;
use gantry_core::types::{AppConfig, ConfigError, slugify};
use gantry_health::HealthVerifier;
use gantry_ledger::{Ledger, LedgerError, LedgerStore, NextAction};
use gantry_provider::ProviderSet;
use gantry_queue::{Admission, DeployQueue, job};
use gantry_registry::{AppPatch, AppRecord, RegistryStore};
use gantry_stream::{DeployEvent, DeployStream, EventKind, Subscriber};

/// Shared handles threaded through every deploy job.
pub(crate) struct Deps {
    pub(crate) registry: RegistryStore,
    pub(crate) ledgers: LedgerStore,
    pub(crate) queue: DeployQueue,
    pub(crate) stream: DeployStream,
    pub(crate) providers: ProviderSet,
    pub(crate) verifier: HealthVerifier,
    pub(crate) tuning: DeployTuning,
    pub(crate) backoff: BackoffPolicy,
    /// Variables injected into every application, under the config's ones.
    pub(crate) extra_env: BTreeMap<String, String>,
}

/// Answer to a deploy or rollback request.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReceipt {
    pub app: String,
    #[serde(flatten)]
    pub admission: Admission,
}

/// Cloning is cheap; clones share every handle.
#[derive(Clone)]
pub struct Orchestrator {
    deps: Arc<Deps>,
}

impl Orchestrator {
    pub fn new(
        registry: RegistryStore,
        ledgers: LedgerStore,
        providers: ProviderSet,
        tuning: DeployTuning,
    ) -> PipelineResult<Self> {
        Self::with_options(
            registry,
            ledgers,
            providers,
            tuning,
            BackoffPolicy::default(),
            BTreeMap::new(),
        )
    }

    pub fn with_options(
        registry: RegistryStore,
        ledgers: LedgerStore,
        providers: ProviderSet,
        tuning: DeployTuning,
        backoff: BackoffPolicy,
        extra_env: BTreeMap<String, String>,
    ) -> PipelineResult<Self> {
        Ok(Self {
            deps: Arc::new(Deps {
                registry,
                ledgers,
                queue: DeployQueue::new(),
                stream: DeployStream::new(),
                providers,
                verifier: HealthVerifier::new()?,
                tuning,
                backoff,
                extra_env,
            }),
        })
    }

    /// Subscribe to an application's live deploy events.
    pub async fn subscribe(&self, name: &str) -> Subscriber {
        self.deps.stream.subscribe(&slugify(name)).await
    }

    /// Register or update the application and put a deploy job on its lane.
    ///
    /// A config document is required the first time an application is seen
    /// and optional afterwards; when present it is merged into the stored
    /// record before the job is admitted.
    pub async fn trigger_deploy(
        &self,
        name: &str,
        config: Option<AppConfig>,
    ) -> PipelineResult<DeployReceipt> {
        let app = slugify(name);
        if app.is_empty() {
            return Err(ConfigError::InvalidName(name.to_string()).into());
        }

        let existing = self.deps.registry.get(&app)?.filter(|r| !r.removed);
        match (existing, config) {
            (None, Some(mut config)) => {
                config.app_name = app.clone();
                self.deps.registry.register(&app, config)?;
                info!(app = %app, "application registered");
            }
            (None, None) => return Err(PipelineError::UnknownApp(app)),
            (Some(_), Some(config)) => {
                let patch = AppPatch {
                    repo_url: config.repo_url,
                    framework: config.framework,
                    port: config.port,
                    domain: config.domain,
                    provider: config.provider,
                    env: (!config.env.is_empty()).then_some(config.env),
                };
                if !patch.is_empty() {
                    self.deps.registry.update(&app, &patch)?;
                    info!(app = %app, "application config updated");
                }
            }
            (Some(_), None) => {}
        }

        let deps = Arc::clone(&self.deps);
        let job_app = app.clone();
        let admission = self
            .deps
            .queue
            .enqueue(&app, job(move || runner::run_deploy_job(deps, job_app)))
            .await;
        if let Admission::Queued { position } = admission {
            self.deps
                .stream
                .publish(DeployEvent::new(
                    &app,
                    EventKind::Queued,
                    format!("deploy queued at position {position}"),
                ))
                .await;
        }
        Ok(DeployReceipt { app, admission })
    }

    /// Re-release the last successful deployment on the application's lane.
    ///
    /// Validated eagerly so a caller with nothing to roll back to gets an
    /// error now instead of a queued job that fails immediately.
    pub async fn rollback(&self, name: &str) -> PipelineResult<DeployReceipt> {
        let record = self.require_app(name)?;
        if record.last_successful_deploy().is_none() {
            return Err(PipelineError::NoSuccessfulDeploy(record.name));
        }
        let app = record.name;

        let deps = Arc::clone(&self.deps);
        let job_app = app.clone();
        let admission = self
            .deps
            .queue
            .enqueue(&app, job(move || runner::run_rollback_job(deps, job_app)))
            .await;
        if let Admission::Queued { position } = admission {
            self.deps
                .stream
                .publish(DeployEvent::new(
                    &app,
                    EventKind::Queued,
                    format!("rollback queued at position {position}"),
                ))
                .await;
        }
        Ok(DeployReceipt { app, admission })
    }

    /// Lowest unchecked stage for an agent working the checklist by hand.
    ///
    /// A read: an application that never deployed gets the answer from a
    /// fresh in-memory checklist without a ledger file appearing on disk.
    pub fn next_task(&self, name: &str) -> PipelineResult<NextAction> {
        let record = self.require_app(name)?;
        match self.deps.ledgers.load(&record.name) {
            Ok(ledger) => Ok(ledger.next_actionable()),
            Err(LedgerError::MissingLedger(_)) => {
                Ok(Ledger::new(record.name, &default_stages()).next_actionable())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Check a stage off on behalf of an external agent and return what to
    /// do next. Ordering is enforced by the ledger.
    pub async fn mark_task_done(
        &self,
        name: &str,
        index: u32,
        result: &str,
    ) -> PipelineResult<NextAction> {
        let record = self.require_app(name)?;
        let app = record.name;
        self.deps.ledgers.load_or_create(&app, &default_stages())?;
        let ledger = self.deps.ledgers.mark_done(&app, index, result)?;

        let stage_name = ledger
            .stages()
            .iter()
            .find(|s| s.def.index == index)
            .map(|s| s.def.name.clone())
            .unwrap_or_default();
        self.deps
            .stream
            .publish(
                DeployEvent::new(&app, EventKind::StageCompleted, result)
                    .at_stage(index, &stage_name),
            )
            .await;
        Ok(ledger.next_actionable())
    }

    /// Combined registry, checklist, and lane view for one application.
    /// Soft-removed applications still answer, flagged as removed.
    pub async fn app_status(&self, name: &str) -> PipelineResult<AppStatus> {
        let app = slugify(name);
        if app.is_empty() {
            return Err(ConfigError::InvalidName(name.to_string()).into());
        }
        let record = self
            .deps
            .registry
            .get(&app)?
            .ok_or_else(|| PipelineError::UnknownApp(app.clone()))?;
        let ledger = match self.deps.ledgers.load(&app) {
            Ok(ledger) => ledger,
            Err(LedgerError::MissingLedger(_)) => Ledger::new(app.as_str(), &default_stages()),
            Err(err) => return Err(err.into()),
        };
        let deploy_active = self.deps.queue.is_busy(&app).await;
        let deploys_waiting = self.deps.queue.waiting(&app).await;
        Ok(AppStatus::assemble(
            record,
            &ledger,
            deploy_active,
            deploys_waiting,
        ))
    }

    /// Live applications, soft-removed ones excluded.
    pub fn list_apps(&self) -> PipelineResult<Vec<AppRecord>> {
        Ok(self.deps.registry.list()?)
    }

    /// Soft-remove an application. Returns false when there was no live
    /// record to remove.
    pub fn remove_app(&self, name: &str) -> PipelineResult<bool> {
        let app = slugify(name);
        if app.is_empty() {
            return Err(ConfigError::InvalidName(name.to_string()).into());
        }
        Ok(self.deps.registry.remove(&app)?)
    }

    /// Safety valve: abort a wedged deploy and free its lane. Returns false
    /// when nothing was running.
    pub async fn force_release(&self, name: &str) -> PipelineResult<bool> {
        let record = self.require_app(name)?;
        let app = record.name;
        let released = self.deps.queue.force_release(&app).await;
        if released {
            warn!(app = %app, "deploy lane force released by operator");
            self.deps
                .stream
                .publish(DeployEvent::new(
                    &app,
                    EventKind::Finished,
                    "deploy aborted: lane force released",
                ))
                .await;
        }
        Ok(released)
    }

    fn require_app(&self, name: &str) -> PipelineResult<AppRecord> {
        let app = slugify(name);
        if app.is_empty() {
            return Err(ConfigError::InvalidName(name.to_string()).into());
        }
        self.deps
            .registry
            .get(&app)?
            .filter(|r| !r.removed)
            .ok_or(PipelineError::UnknownApp(app))
    }
}
