//! In-memory ledger state and the ordering rules for stage completion.

use chrono::{DateTime, Utc};
use gantry_core::stage::StageDef;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};

/// One stage of the checklist together with its completion flag.
#[derive(Debug, Clone, Serialize)]
pub struct StageState {
    #[serde(flatten)]
    pub def: StageDef,
    pub done: bool,
}

/// One line of the append-only progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    pub at: DateTime<Utc>,
    pub stage_index: u32,
    pub text: String,
}

/// What the pipeline should work on next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
    /// The lowest-indexed stage that is not yet done.
    Stage { stage: StageDef },
    /// Every stage is done.
    Complete,
}

/// Ordered stage checklist plus progress log for one application.
///
/// The ledger itself is pure state: callers supply timestamps, and
/// persistence lives in [`crate::store::LedgerStore`].
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    app: String,
    stages: Vec<StageState>,
    log: Vec<ProgressEntry>,
}

impl Ledger {
    /// Creates a fresh ledger with every stage unchecked.
    pub fn new(app: impl Into<String>, defs: &[StageDef]) -> Self {
        Self {
            app: app.into(),
            stages: defs
                .iter()
                .map(|def| StageState {
                    def: def.clone(),
                    done: false,
                })
                .collect(),
            log: Vec::new(),
        }
    }

    /// Rebuilds a ledger from already-validated parts. Used by the parser.
    pub(crate) fn from_parts(
        app: String,
        stages: Vec<StageState>,
        log: Vec<ProgressEntry>,
    ) -> Self {
        Self { app, stages, log }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn stages(&self) -> &[StageState] {
        &self.stages
    }

    pub fn log(&self) -> &[ProgressEntry] {
        &self.log
    }

    pub fn done_count(&self) -> u32 {
        self.stages.iter().filter(|s| s.done).count() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.done)
    }

    /// Returns the lowest-indexed unchecked stage, or `Complete`.
    pub fn next_actionable(&self) -> NextAction {
        match self.stages.iter().find(|s| !s.done) {
            Some(state) => NextAction::Stage {
                stage: state.def.clone(),
            },
            None => NextAction::Complete,
        }
    }

    /// Marks stage `index` done and records `result` in the progress log.
    ///
    /// Stages unlock strictly in order: the call fails with `OutOfOrder`
    /// when any lower-indexed stage is still unchecked, `AlreadyDone` when
    /// the stage is checked, and `NotFound` when the index does not exist.
    /// On failure the ledger is left untouched.
    pub fn mark_done(
        &mut self,
        index: u32,
        result: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let pos = self
            .stages
            .iter()
            .position(|s| s.def.index == index)
            .ok_or(LedgerError::NotFound(index))?;
        if self.stages[pos].done {
            return Err(LedgerError::AlreadyDone(index));
        }
        if let Some(open) = self.stages.iter().find(|s| !s.done) {
            if open.def.index != index {
                return Err(LedgerError::OutOfOrder {
                    expected: open.def.index,
                    got: index,
                });
            }
        }
        self.stages[pos].done = true;
        self.log.push(ProgressEntry {
            at,
            stage_index: index,
            text: result.into(),
        });
        Ok(())
    }

    /// Appends a note to the progress log without checking the stage off.
    ///
    /// Used for failure records: the stage stays actionable so the deploy
    /// can be retried, but the attempt is still visible in the history.
    pub fn append_note(
        &mut self,
        index: u32,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<()> {
        if !self.stages.iter().any(|s| s.def.index == index) {
            return Err(LedgerError::NotFound(index));
        }
        self.log.push(ProgressEntry {
            at,
            stage_index: index,
            text: text.into(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::stage::default_stages;

    fn ts() -> DateTime<Utc> {
        "2026-08-25T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn fresh_ledger_starts_at_stage_one() {
        let ledger = Ledger::new("demo", &default_stages());
        match ledger.next_actionable() {
            NextAction::Stage { stage } => assert_eq!(stage.index, 1),
            NextAction::Complete => panic!("fresh ledger cannot be complete"),
        }
        assert_eq!(ledger.done_count(), 0);
        assert!(!ledger.is_complete());
    }

    #[test]
    fn marking_in_order_advances_next_actionable() {
        let mut ledger = Ledger::new("demo", &default_stages());
        ledger.mark_done(1, "repo registered", ts()).unwrap();
        ledger.mark_done(2, "source analyzed", ts()).unwrap();
        match ledger.next_actionable() {
            NextAction::Stage { stage } => assert_eq!(stage.index, 3),
            NextAction::Complete => panic!("only two stages done"),
        }
        assert_eq!(ledger.log().len(), 2);
        assert_eq!(ledger.log()[0].text, "repo registered");
    }

    #[test]
    fn out_of_order_mark_is_rejected_and_leaves_state_alone() {
        let mut ledger = Ledger::new("demo", &default_stages());
        ledger.mark_done(1, "ok", ts()).unwrap();
        let err = ledger.mark_done(5, "skipped ahead", ts()).unwrap_err();
        match err {
            LedgerError::OutOfOrder { expected, got } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.done_count(), 1);
        assert_eq!(ledger.log().len(), 1, "failed mark must not log");
    }

    #[test]
    fn double_mark_is_already_done() {
        let mut ledger = Ledger::new("demo", &default_stages());
        ledger.mark_done(1, "ok", ts()).unwrap();
        assert!(matches!(
            ledger.mark_done(1, "again", ts()),
            Err(LedgerError::AlreadyDone(1))
        ));
    }

    #[test]
    fn unknown_stage_is_not_found() {
        let mut ledger = Ledger::new("demo", &default_stages());
        assert!(matches!(
            ledger.mark_done(99, "nope", ts()),
            Err(LedgerError::NotFound(99))
        ));
        assert!(matches!(
            ledger.append_note(0, "nope", ts()),
            Err(LedgerError::NotFound(0))
        ));
    }

    #[test]
    fn completing_every_stage_yields_complete() {
        let mut ledger = Ledger::new("demo", &default_stages());
        for idx in 1..=gantry_core::stage::STAGE_COUNT {
            ledger.mark_done(idx, format!("stage {idx} ok"), ts()).unwrap();
        }
        assert!(ledger.is_complete());
        assert_eq!(ledger.next_actionable(), NextAction::Complete);
    }

    #[test]
    fn append_note_does_not_check_the_stage_off() {
        let mut ledger = Ledger::new("demo", &default_stages());
        ledger.mark_done(1, "ok", ts()).unwrap();
        ledger.append_note(2, "failed: analyzer crashed", ts()).unwrap();
        match ledger.next_actionable() {
            NextAction::Stage { stage } => assert_eq!(stage.index, 2),
            NextAction::Complete => panic!("stage 2 must still be open"),
        }
        assert_eq!(ledger.log().len(), 2);
    }
}
