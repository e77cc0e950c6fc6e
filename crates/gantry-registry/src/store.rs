//! RegistryStore — redb-backed application registry.
//!
//! All values are JSON-serialized into redb's `&[u8]` value column. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing). redb's single-writer transactions make every per-name
//! operation linearizable, including the history append-and-trim.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use gantry_core::AppConfig;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::tables::APPS;
use crate::types::{AppPatch, AppRecord, DeploymentRecord, HISTORY_LIMIT};

/// Convert any `Display` error into a `RegistryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| RegistryError::$variant(e.to_string())
    };
}

/// Thread-safe registry backed by redb.
#[derive(Clone)]
pub struct RegistryStore {
    db: Arc<Database>,
}

impl RegistryStore {
    /// Open (or create) a persistent registry at the given path.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "registry opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory registry (for testing).
    pub fn open_in_memory() -> RegistryResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory registry opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> RegistryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(APPS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Register a new application under its slug.
    ///
    /// Fails with `AlreadyExists` when a live record holds the name; a
    /// soft-removed record is replaced by a fresh one.
    pub fn register(&self, name: &str, config: AppConfig) -> RegistryResult<AppRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut table = txn.open_table(APPS).map_err(map_err!(Table))?;
            let existing = read_record(&table, name)?;
            if let Some(prior) = existing {
                if !prior.removed {
                    return Err(RegistryError::AlreadyExists(name.to_string()));
                }
            }
            record = AppRecord::new(name, config, Utc::now());
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(app = %name, "application registered");
        Ok(record)
    }

    /// Merge a partial config update into an application's record.
    ///
    /// Soft-removed applications are treated as not found.
    pub fn update(&self, name: &str, patch: &AppPatch) -> RegistryResult<AppRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut table = txn.open_table(APPS).map_err(map_err!(Table))?;
            let mut current = read_record(&table, name)?
                .filter(|r| !r.removed)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            patch.apply_to(&mut current);
            current.updated_at = Utc::now();
            let value = serde_json::to_vec(&current).map_err(map_err!(Serialize))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
            record = current;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(app = %name, "application config updated");
        Ok(record)
    }

    /// Insert or replace a whole record. Used by the pipeline to persist
    /// derived metadata, the chosen provider, and the resource id.
    pub fn put(&self, record: &AppRecord) -> RegistryResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(APPS).map_err(map_err!(Table))?;
            table
                .insert(record.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Append a deployment record, trimming history to [`HISTORY_LIMIT`].
    ///
    /// Append and trim happen inside one write transaction; the oldest
    /// record is dropped silently once the bound is hit.
    pub fn record_deployment(
        &self,
        name: &str,
        deploy: DeploymentRecord,
    ) -> RegistryResult<AppRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut table = txn.open_table(APPS).map_err(map_err!(Table))?;
            let mut current = read_record(&table, name)?
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            current.history.push(deploy);
            if current.history.len() > HISTORY_LIMIT {
                let excess = current.history.len() - HISTORY_LIMIT;
                current.history.drain(..excess);
            }
            current.updated_at = Utc::now();
            let value = serde_json::to_vec(&current).map_err(map_err!(Serialize))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
            record = current;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            app = %name,
            kept = record.history.len(),
            "deployment recorded"
        );
        Ok(record)
    }

    /// Get an application by slug. Soft-removed records are returned too.
    pub fn get(&self, name: &str) -> RegistryResult<Option<AppRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(APPS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: AppRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List live applications (soft-removed records are excluded).
    pub fn list(&self) -> RegistryResult<Vec<AppRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(APPS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: AppRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if !record.removed {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Soft-remove an application. Returns true if a live record was
    /// flagged; the record itself stays for history lookups.
    pub fn remove(&self, name: &str) -> RegistryResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let was_live;
        {
            let mut table = txn.open_table(APPS).map_err(map_err!(Table))?;
            match read_record(&table, name)? {
                Some(mut record) if !record.removed => {
                    record.removed = true;
                    record.updated_at = Utc::now();
                    let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                    table
                        .insert(name, value.as_slice())
                        .map_err(map_err!(Write))?;
                    was_live = true;
                }
                _ => was_live = false,
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(app = %name, was_live, "application removed");
        Ok(was_live)
    }
}

fn read_record<T: ReadableTable<&'static str, &'static [u8]>>(
    table: &T,
    name: &str,
) -> RegistryResult<Option<AppRecord>> {
    match table.get(name).map_err(map_err!(Read))? {
        Some(guard) => {
            let record: AppRecord =
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
