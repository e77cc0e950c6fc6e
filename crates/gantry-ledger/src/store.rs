//! Durable ledger storage, one markdown file per application.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use gantry_core::stage::StageDef;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::format;
use crate::ledger::{Ledger, NextAction};

/// Directory-backed ledger store.
///
/// Each application owns one file at `<dir>/<app>.md`. Mutations take a
/// per-application lock and replace the file atomically (temporary
/// sibling, fsync, rename), so a crash mid-write leaves the previous
/// ledger intact. Application names are expected to be pre-normalized
/// slugs (see [`gantry_core::slugify`]). Clones share the lock map.
#[derive(Clone)]
pub struct LedgerStore {
    dir: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl LedgerStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> LedgerResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Path of the ledger file for `app`.
    pub fn path_for(&self, app: &str) -> PathBuf {
        self.dir.join(format!("{app}.md"))
    }

    pub fn exists(&self, app: &str) -> bool {
        self.path_for(app).exists()
    }

    /// Creates a fresh ledger for `app` with every stage unchecked.
    pub fn create(&self, app: &str, defs: &[StageDef]) -> LedgerResult<Ledger> {
        let lock = self.app_lock(app);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.exists(app) {
            return Err(LedgerError::AlreadyExists(app.to_string()));
        }
        let ledger = Ledger::new(app, defs);
        self.write_atomic(&ledger)?;
        debug!(app = %app, path = %self.path_for(app).display(), "created ledger");
        Ok(ledger)
    }

    /// Loads the ledger for `app` from disk.
    pub fn load(&self, app: &str) -> LedgerResult<Ledger> {
        let path = self.path_for(app);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LedgerError::MissingLedger(app.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        format::parse_markdown(app, &text)
    }

    /// Loads the ledger for `app`, creating it first if none exists.
    pub fn load_or_create(&self, app: &str, defs: &[StageDef]) -> LedgerResult<Ledger> {
        match self.load(app) {
            Ok(ledger) => Ok(ledger),
            Err(LedgerError::MissingLedger(_)) => self.create(app, defs),
            Err(e) => Err(e),
        }
    }

    /// Marks a stage done and persists the updated ledger.
    ///
    /// Ordering rules are enforced by [`Ledger::mark_done`]; on any error
    /// the file on disk is untouched.
    pub fn mark_done(&self, app: &str, index: u32, result: &str) -> LedgerResult<Ledger> {
        let lock = self.app_lock(app);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut ledger = self.load(app)?;
        ledger.mark_done(index, result, Utc::now())?;
        self.write_atomic(&ledger)?;
        debug!(app = %app, stage = index, "stage marked done");
        Ok(ledger)
    }

    /// Appends a progress note without checking the stage off.
    pub fn append_note(&self, app: &str, index: u32, text: &str) -> LedgerResult<Ledger> {
        let lock = self.app_lock(app);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut ledger = self.load(app)?;
        ledger.append_note(index, text, Utc::now())?;
        self.write_atomic(&ledger)?;
        debug!(app = %app, stage = index, "progress note appended");
        Ok(ledger)
    }

    /// Returns the next actionable stage for `app`.
    pub fn next_actionable(&self, app: &str) -> LedgerResult<NextAction> {
        Ok(self.load(app)?.next_actionable())
    }

    fn app_lock(&self, app: &str) -> Arc<Mutex<()>> {
        // Poisoning only means a writer panicked; the map is still usable.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(app.to_string()).or_default().clone()
    }

    fn write_atomic(&self, ledger: &Ledger) -> LedgerResult<()> {
        let path = self.path_for(ledger.app());
        let tmp = path.with_extension("md.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(format::to_markdown(ledger).as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
