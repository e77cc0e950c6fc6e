//! The fixed pipeline gate catalog.
//!
//! Every application walks the same 11 ordered gates. Indices are 1-based
//! and stable: they appear in ledger files on disk and in progress entries,
//! so they must never be renumbered.

use serde::{Deserialize, Serialize};

/// Number of gates in the pipeline.
pub const STAGE_COUNT: u32 = 11;

/// One of the 11 ordered pipeline gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    RepoRegistered,
    SourceAnalyzed,
    ProviderSelected,
    BuildConfigReady,
    RuntimeImageReady,
    ResourceProvisioned,
    VariablesApplied,
    RoutingConfigured,
    BuildReleased,
    HealthVerified,
    DeploymentRecorded,
}

impl StageId {
    /// All gates, in pipeline order.
    pub const ALL: [StageId; STAGE_COUNT as usize] = [
        StageId::RepoRegistered,
        StageId::SourceAnalyzed,
        StageId::ProviderSelected,
        StageId::BuildConfigReady,
        StageId::RuntimeImageReady,
        StageId::ResourceProvisioned,
        StageId::VariablesApplied,
        StageId::RoutingConfigured,
        StageId::BuildReleased,
        StageId::HealthVerified,
        StageId::DeploymentRecorded,
    ];

    /// 1-based index as written to the ledger.
    pub fn index(self) -> u32 {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .map(|p| p as u32 + 1)
            .unwrap_or(0)
    }

    pub fn from_index(index: u32) -> Option<StageId> {
        if index == 0 {
            return None;
        }
        Self::ALL.get(index as usize - 1).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StageId::RepoRegistered => "REPO_REGISTERED",
            StageId::SourceAnalyzed => "SOURCE_ANALYZED",
            StageId::ProviderSelected => "PROVIDER_SELECTED",
            StageId::BuildConfigReady => "BUILD_CONFIG_READY",
            StageId::RuntimeImageReady => "RUNTIME_IMAGE_READY",
            StageId::ResourceProvisioned => "RESOURCE_PROVISIONED",
            StageId::VariablesApplied => "VARIABLES_APPLIED",
            StageId::RoutingConfigured => "ROUTING_CONFIGURED",
            StageId::BuildReleased => "BUILD_RELEASED",
            StageId::HealthVerified => "HEALTH_VERIFIED",
            StageId::DeploymentRecorded => "DEPLOYMENT_RECORDED",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StageId::RepoRegistered => "repository URL recorded and application registered",
            StageId::SourceAnalyzed => "project metadata detected (language, framework, port)",
            StageId::ProviderSelected => "target hosting provider chosen and available",
            StageId::BuildConfigReady => "build configuration validated (repo_url, type, port)",
            StageId::RuntimeImageReady => "build recipe selected for the framework",
            StageId::ResourceProvisioned => "provider resource created or found by name",
            StageId::VariablesApplied => "environment variables applied per key",
            StageId::RoutingConfigured => "domain, port and health-check routing configured",
            StageId::BuildReleased => "provider build triggered and polled to completion",
            StageId::HealthVerified => "deployed endpoint answered the health probe",
            StageId::DeploymentRecorded => "deployment recorded in history and announced",
        }
    }
}

/// Definition of one ledger stage as it appears on disk.
///
/// Owned strings rather than the `StageId` catalog: a loaded ledger
/// reflects whatever the file says, even if descriptions drift from the
/// built-in catalog across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDef {
    pub index: u32,
    pub name: String,
    pub description: String,
}

/// The default gate catalog, in pipeline order.
pub fn default_stages() -> Vec<StageDef> {
    StageId::ALL
        .iter()
        .map(|s| StageDef {
            index: s.index(),
            name: s.name().to_string(),
            description: s.description().to_string(),
        })
        .collect()
}
