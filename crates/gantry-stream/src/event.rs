//! Deploy event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The deploy is waiting behind another one on the same lane.
    Queued,
    /// The deploy took its lane and the pipeline is running.
    Started,
    StageStarted,
    StageCompleted,
    StageFailed,
    /// The pipeline finished, successfully or not.
    Finished,
}

impl EventKind {
    /// Wire name, matching the serde casing. SSE frames use this as the
    /// event name.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Queued => "queued",
            EventKind::Started => "started",
            EventKind::StageStarted => "stage_started",
            EventKind::StageCompleted => "stage_completed",
            EventKind::StageFailed => "stage_failed",
            EventKind::Finished => "finished",
        }
    }
}

/// One progress event for one application's deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployEvent {
    pub app: String,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl DeployEvent {
    pub fn new(app: &str, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            app: app.to_string(),
            kind,
            stage_index: None,
            stage_name: None,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Attaches the stage the event belongs to.
    pub fn at_stage(mut self, index: u32, name: &str) -> Self {
        self.stage_index = Some(index);
        self.stage_name = Some(name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_matches_the_serde_casing() {
        for kind in [
            EventKind::Queued,
            EventKind::Started,
            EventKind::StageStarted,
            EventKind::StageCompleted,
            EventKind::StageFailed,
            EventKind::Finished,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }
    }

    #[test]
    fn stage_fields_are_optional() {
        let plain = DeployEvent::new("demo", EventKind::Started, "deploy started");
        assert!(plain.stage_index.is_none());

        let staged = DeployEvent::new("demo", EventKind::StageCompleted, "ok").at_stage(3, "PROVIDER_SELECTED");
        assert_eq!(staged.stage_index, Some(3));
        assert_eq!(staged.stage_name.as_deref(), Some("PROVIDER_SELECTED"));
    }
}
