// src/storage/registry.rs
use parking_lot::Mutex;
use rocksdb::{Options, DB};
use std::path::Path;
use tracing::info;

use super::types::PluginRecord;
use crate::utils::error::{AggregatorError, Result};

const PLUGIN_TABLE: &str = "Plugin";

/// Durable key-value store of onboarded plugins, keyed by plugin id.
/// Single source of truth for "does this plugin already exist".
pub struct PluginRegistry {
    db: DB,
    // Serializes create() so check-and-put is atomic within the process;
    // readers go straight to rocksdb.
    write_lock: Mutex<()>,
}

impl PluginRegistry {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path)
            .map_err(|e| AggregatorError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn key(id: &str) -> Vec<u8> {
        format!("{}:{}", PLUGIN_TABLE, id).into_bytes()
    }

    /// Key-presence check only. A record whose stored payload is corrupted
    /// or legacy-encrypted still counts as existing; callers must treat
    /// that as a duplicate, not an internal fault.
    pub fn exists(&self, id: &str) -> Result<bool> {
        let found = self
            .db
            .get(Self::key(id))
            .map_err(|e| AggregatorError::Storage(e.to_string()))?
            .is_some();
        Ok(found)
    }

    /// Atomic create-if-absent. Fails with Conflict when the id appeared
    /// after an earlier existence check, so a racing second writer never
    /// overwrites the first.
    pub fn create(&self, record: &PluginRecord) -> Result<()> {
        let serialized = serde_json::to_vec(record)
            .map_err(|e| AggregatorError::Storage(e.to_string()))?;

        let _guard = self.write_lock.lock();
        if self
            .db
            .get(Self::key(&record.id))
            .map_err(|e| AggregatorError::Storage(e.to_string()))?
            .is_some()
        {
            return Err(AggregatorError::Conflict(format!(
                "plugin {} already registered",
                record.id
            )));
        }

        self.db
            .put(Self::key(&record.id), serialized)
            .map_err(|e| AggregatorError::Storage(e.to_string()))?;

        info!("Registered plugin {} at {}", record.id, record.address);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<PluginRecord>> {
        let raw = match self
            .db
            .get(Self::key(id))
            .map_err(|e| AggregatorError::Storage(e.to_string()))?
        {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let record = serde_json::from_slice(&raw)
            .map_err(|e| AggregatorError::Storage(e.to_string()))?;
        Ok(Some(record))
    }

    /// Writes an opaque payload under a plugin id. Test seam for the
    /// corrupted-record cases; exists() must still see these.
    #[cfg(test)]
    pub fn put_raw(&self, id: &str, payload: &[u8]) -> Result<()> {
        self.db
            .put(Self::key(id), payload)
            .map_err(|e| AggregatorError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::onboarding::types::{AuthMode, PluginCategory};
    use crate::storage::types::PluginHealth;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_record(id: &str) -> PluginRecord {
        PluginRecord {
            id: id.to_string(),
            address: "localhost:9091".into(),
            user_name: "admin".into(),
            encrypted_password: vec![1, 2, 3],
            auth_mode: AuthMode::BasicAuth,
            category: PluginCategory::Compute,
            status: PluginHealth::Enabled,
            manager_uuid: None,
            onboarded_at: Utc::now(),
        }
    }

    #[test]
    fn create_then_get() {
        let dir = tempdir().unwrap();
        let registry = PluginRegistry::open(dir.path()).unwrap();

        let record = sample_record("GRF");
        registry.create(&record).unwrap();

        assert!(registry.exists("GRF").unwrap());
        assert_eq!(registry.get("GRF").unwrap().unwrap(), record);
    }

    #[test]
    fn second_create_conflicts() {
        let dir = tempdir().unwrap();
        let registry = PluginRegistry::open(dir.path()).unwrap();

        registry.create(&sample_record("ILO")).unwrap();
        let err = registry.create(&sample_record("ILO")).unwrap_err();
        assert!(matches!(err, AggregatorError::Conflict(_)));
    }

    #[test]
    fn exists_ignores_payload_shape() {
        let dir = tempdir().unwrap();
        let registry = PluginRegistry::open(dir.path()).unwrap();

        registry.put_raw("BadData", b"\"PluginWithBadData\"").unwrap();
        assert!(registry.exists("BadData").unwrap());
        // Decoding it is another matter entirely.
        assert!(registry.get("BadData").is_err());
    }

    #[test]
    fn missing_id_absent() {
        let dir = tempdir().unwrap();
        let registry = PluginRegistry::open(dir.path()).unwrap();
        assert!(!registry.exists("nope").unwrap());
        assert!(registry.get("nope").unwrap().is_none());
    }
}
