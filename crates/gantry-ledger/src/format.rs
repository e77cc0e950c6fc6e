//! Markdown codec for ledger files.
//!
//! A ledger is stored as a human-editable checklist:
//!
//! ```text
//! # demo-app — deployment gates
//!
//! - [x] 1. REPO_REGISTERED — repository URL recorded and application registered
//! - [ ] 2. SOURCE_ANALYZED — source inspected and project metadata derived
//!
//! ## Progress log
//!
//! - 2026-08-25T12:00:00Z · stage 1 · repository registered
//! ```
//!
//! The parser only acts on lines matching these exact shapes and ignores
//! everything else, so hand-written headings or notes survive a rewrite.

use chrono::{DateTime, SecondsFormat, Utc};
use gantry_core::stage::StageDef;
use regex::Regex;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{Ledger, ProgressEntry, StageState};

const LOG_HEADING: &str = "## Progress log";

/// Renders the ledger to its on-disk markdown form.
pub fn to_markdown(ledger: &Ledger) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} — deployment gates\n\n", ledger.app()));
    for state in ledger.stages() {
        let mark = if state.done { 'x' } else { ' ' };
        out.push_str(&format!(
            "- [{mark}] {}. {} — {}\n",
            state.def.index,
            state.def.name,
            flatten(&state.def.description),
        ));
    }
    out.push_str(&format!("\n{LOG_HEADING}\n\n"));
    for entry in ledger.log() {
        out.push_str(&format!(
            "- {} · stage {} · {}\n",
            entry.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.stage_index,
            flatten(&entry.text),
        ));
    }
    out
}

/// Parses a ledger from its markdown form.
///
/// Stage lines must carry contiguous indices starting at 1; anything else
/// is a `Parse` error. Log lines with an unparseable timestamp are treated
/// as surrounding prose and skipped.
pub fn parse_markdown(app: &str, text: &str) -> LedgerResult<Ledger> {
    let stage_re = Regex::new(r"^- \[([ x])\] (\d+)\. ([A-Z][A-Z0-9_]*) — (.+)$")
        .map_err(|e| LedgerError::Parse(e.to_string()))?;
    let entry_re = Regex::new(r"^- (\S+) · stage (\d+) · (.*)$")
        .map_err(|e| LedgerError::Parse(e.to_string()))?;

    let mut stages: Vec<StageState> = Vec::new();
    let mut log: Vec<ProgressEntry> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = stage_re.captures(line) {
            let index: u32 = caps[2]
                .parse()
                .map_err(|_| LedgerError::Parse(format!("bad stage index in '{line}'")))?;
            stages.push(StageState {
                def: StageDef {
                    index,
                    name: caps[3].to_string(),
                    description: caps[4].to_string(),
                },
                done: &caps[1] == "x",
            });
        } else if let Some(caps) = entry_re.captures(line) {
            let Ok(at) = DateTime::parse_from_rfc3339(&caps[1]) else {
                continue;
            };
            let stage_index: u32 = caps[2]
                .parse()
                .map_err(|_| LedgerError::Parse(format!("bad stage index in '{line}'")))?;
            log.push(ProgressEntry {
                at: at.with_timezone(&Utc),
                stage_index,
                text: caps[3].to_string(),
            });
        }
    }

    if stages.is_empty() {
        return Err(LedgerError::Parse("no stage lines found".into()));
    }
    for (pos, state) in stages.iter().enumerate() {
        let expected = pos as u32 + 1;
        if state.def.index != expected {
            return Err(LedgerError::Parse(format!(
                "stage indices must run 1..{} without gaps; found {} at position {}",
                stages.len(),
                state.def.index,
                expected,
            )));
        }
    }

    Ok(Ledger::from_parts(app.to_string(), stages, log))
}

// Stage and log lines are line-oriented; embedded newlines would split
// an entry into unparseable fragments.
fn flatten(text: &str) -> String {
    if text.contains('\n') {
        text.replace('\n', " | ")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gantry_core::stage::default_stages;

    fn ts() -> DateTime<Utc> {
        "2026-08-25T09:30:00Z".parse().unwrap()
    }

    #[test]
    fn render_and_parse_round_trip() {
        let mut ledger = Ledger::new("demo-app", &default_stages());
        ledger.mark_done(1, "repository registered", ts()).unwrap();
        ledger.mark_done(2, "framework: nextjs", ts()).unwrap();
        ledger.append_note(3, "failed: provider unreachable", ts()).unwrap();

        let text = to_markdown(&ledger);
        let parsed = parse_markdown("demo-app", &text).unwrap();

        assert_eq!(parsed.app(), "demo-app");
        assert_eq!(parsed.done_count(), 2);
        assert_eq!(parsed.log().len(), 3);
        assert_eq!(parsed.log()[2].stage_index, 3);
        assert_eq!(parsed.log()[2].text, "failed: provider unreachable");
        assert_eq!(parsed.log()[0].at, ts());
    }

    #[test]
    fn parser_ignores_surrounding_prose() {
        let text = "\
# demo — deployment gates

Some operator left a note here.

- [x] 1. REPO_REGISTERED — repository recorded
- [ ] 2. SOURCE_ANALYZED — source inspected

## Progress log

random line that is not an entry
- 2026-08-25T09:30:00Z · stage 1 · registered
- not-a-timestamp · stage 1 · skipped
";
        let ledger = parse_markdown("demo", text).unwrap();
        assert_eq!(ledger.stages().len(), 2);
        assert_eq!(ledger.done_count(), 1);
        assert_eq!(ledger.log().len(), 1, "malformed entry lines are skipped");
    }

    #[test]
    fn gap_in_stage_indices_is_a_parse_error() {
        let text = "\
- [x] 1. REPO_REGISTERED — repository recorded
- [ ] 3. PROVIDER_SELECTED — provider chosen
";
        assert!(matches!(
            parse_markdown("demo", text),
            Err(LedgerError::Parse(_))
        ));
    }

    #[test]
    fn empty_file_is_a_parse_error() {
        assert!(matches!(
            parse_markdown("demo", "nothing here"),
            Err(LedgerError::Parse(_))
        ));
    }

    #[test]
    fn multiline_notes_are_flattened_to_one_line() {
        let mut ledger = Ledger::new("demo", &default_stages());
        ledger
            .append_note(1, "failed after 3 attempts\nError: connect refused", ts())
            .unwrap();
        let text = to_markdown(&ledger);
        let parsed = parse_markdown("demo", &text).unwrap();
        assert_eq!(parsed.log().len(), 1);
        assert_eq!(
            parsed.log()[0].text,
            "failed after 3 attempts | Error: connect refused"
        );
    }
}
