//! Assembled status view for one application.

use serde::Serialize;

use gantry_ledger::{Ledger, NextAction, ProgressEntry};
use gantry_registry::AppRecord;

/// Progress entries included in a status view, newest kept.
const RECENT_PROGRESS: usize = 10;

/// One checklist row.
#[derive(Debug, Clone, Serialize)]
pub struct StageStatus {
    pub index: u32,
    pub name: String,
    pub done: bool,
}

/// Everything a caller needs to see where an application stands: the
/// stored record, the checklist, the tail of the progress log, and
/// whether its deploy lane is busy.
#[derive(Debug, Clone, Serialize)]
pub struct AppStatus {
    pub app: AppRecord,
    pub stages: Vec<StageStatus>,
    pub done_count: u32,
    pub next: NextAction,
    /// Most recent progress entries, oldest first.
    pub recent_progress: Vec<ProgressEntry>,
    pub deploy_active: bool,
    pub deploys_waiting: usize,
}

impl AppStatus {
    pub fn assemble(
        app: AppRecord,
        ledger: &Ledger,
        deploy_active: bool,
        deploys_waiting: usize,
    ) -> Self {
        let stages = ledger
            .stages()
            .iter()
            .map(|s| StageStatus {
                index: s.def.index,
                name: s.def.name.clone(),
                done: s.done,
            })
            .collect();
        let skip = ledger.log().len().saturating_sub(RECENT_PROGRESS);
        Self {
            stages,
            done_count: ledger.done_count(),
            next: ledger.next_actionable(),
            recent_progress: ledger.log()[skip..].to_vec(),
            deploy_active,
            deploys_waiting,
            app,
        }
    }
}
