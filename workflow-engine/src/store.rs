// Workflow state persistence
// A flat, namespaced key-value layout that outlives the page which wrote it

use crate::context::{CostShare, WorkflowContext, WorkflowStep};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use error_common::{codes, CodedError};
use insurance_service::{InsuranceLevel, Money, Percent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt value under {key}: {reason}")]
    CorruptValue { key: String, reason: String },
}

impl CodedError for StoreError {
    fn code(&self) -> &'static str {
        match self {
            StoreError::Read { .. } => codes::store::READ_FAILED,
            StoreError::Write { .. } => codes::store::WRITE_FAILED,
            StoreError::Serialization(_) | StoreError::CorruptValue { .. } => {
                codes::store::CORRUPT_VALUE
            }
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Flat key-value storage with JSON values
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Write every entry; a reader never sees a subset of one call's writes
    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()>;

    async fn remove_many(&self, keys: &[String]) -> StoreResult<()>;

    async fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Process-local store, used by tests and when no state file is configured
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<String, Value>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        for (key, value) in entries {
            self.values.insert(key, value);
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<()> {
        for key in keys {
            self.values.remove(key);
        }
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self.values.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

/// One JSON object on disk. Writes go to a sibling temp file which is then
/// renamed over the original.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> StoreResult<BTreeMap<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, Value>) -> StoreResult<()> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(key))
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.extend(entries);
        self.write_map(&map).await
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        let before = map.len();
        for key in keys {
            map.remove(key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.write_map(&map).await
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.into_keys().collect())
    }
}

/// Persisted key names, prefixed with `<namespace>:` on disk
pub mod keys {
    pub const STATE: &str = "state";
    pub const RUN_ID: &str = "runId";
    pub const PRIMARY_COPAY: &str = "primaryCopay";
    pub const PRIMARY_COINSURANCE: &str = "primaryCoinsurance";
    pub const URGENT_COPAY: &str = "urgentCopay";
    pub const URGENT_COINSURANCE: &str = "urgentCoinsurance";
    pub const GUARANTOR_BALANCE: &str = "guarantorBalance";
    pub const NEXT_APPOINTMENT: &str = "nextAppointment";
    pub const INSURANCE_LEVEL: &str = "insuranceLevel";
    pub const RETRY_COUNT: &str = "retryCount";
    pub const STARTED_AT: &str = "startedAt";

    pub const ALL: [&str; 11] = [
        STATE,
        RUN_ID,
        PRIMARY_COPAY,
        PRIMARY_COINSURANCE,
        URGENT_COPAY,
        URGENT_COINSURANCE,
        GUARANTOR_BALANCE,
        NEXT_APPOINTMENT,
        INSURANCE_LEVEL,
        RETRY_COUNT,
        STARTED_AT,
    ];
}

/// Sole owner of the persisted [`WorkflowContext`]. Every load hands out a
/// fresh copy; every save writes all keys together.
#[derive(Clone)]
pub struct WorkflowStateStore {
    kv: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl WorkflowStateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()), namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> StoreResult<Option<T>> {
        let key = self.key(name);
        match self.kv.get(&key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::CorruptValue {
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    /// Read the persisted context; a store with no `state` key is idle
    pub async fn load(&self) -> StoreResult<WorkflowContext> {
        let Some(current_step) = self.read::<WorkflowStep>(keys::STATE).await? else {
            return Ok(WorkflowContext::default());
        };

        Ok(WorkflowContext {
            run_id: self.read::<String>(keys::RUN_ID).await?.unwrap_or_default(),
            current_step,
            extraction: CostShare {
                primary_copay: self.read::<Money>(keys::PRIMARY_COPAY).await?,
                primary_coinsurance: self.read::<Percent>(keys::PRIMARY_COINSURANCE).await?,
                urgent_copay: self.read::<Money>(keys::URGENT_COPAY).await?,
                urgent_coinsurance: self.read::<Percent>(keys::URGENT_COINSURANCE).await?,
            },
            insurance_level: self
                .read::<InsuranceLevel>(keys::INSURANCE_LEVEL)
                .await?
                .unwrap_or_default(),
            guarantor_balance: self.read(keys::GUARANTOR_BALANCE).await?,
            next_appointment: self.read(keys::NEXT_APPOINTMENT).await?,
            retry_count: self.read::<u32>(keys::RETRY_COUNT).await?.unwrap_or(0),
            started_at: self.read::<DateTime<Utc>>(keys::STARTED_AT).await?,
        })
    }

    pub async fn save(&self, ctx: &WorkflowContext) -> StoreResult<()> {
        let share = &ctx.extraction;
        let entries = vec![
            (keys::STATE, serde_json::to_value(ctx.current_step)?),
            (keys::RUN_ID, Value::String(ctx.run_id.clone())),
            (keys::PRIMARY_COPAY, serde_json::to_value(&share.primary_copay)?),
            (keys::PRIMARY_COINSURANCE, serde_json::to_value(&share.primary_coinsurance)?),
            (keys::URGENT_COPAY, serde_json::to_value(&share.urgent_copay)?),
            (keys::URGENT_COINSURANCE, serde_json::to_value(&share.urgent_coinsurance)?),
            (keys::GUARANTOR_BALANCE, serde_json::to_value(&ctx.guarantor_balance)?),
            (keys::NEXT_APPOINTMENT, serde_json::to_value(&ctx.next_appointment)?),
            (keys::INSURANCE_LEVEL, serde_json::to_value(ctx.insurance_level)?),
            (keys::RETRY_COUNT, Value::from(ctx.retry_count)),
            (keys::STARTED_AT, serde_json::to_value(ctx.started_at)?),
        ];

        debug!(run_id = %ctx.run_id, step = %ctx.current_step, "persisting workflow context");
        self.kv
            .set_many(entries.into_iter().map(|(k, v)| (self.key(k), v)).collect())
            .await
    }

    /// Remove every key this store owns
    pub async fn clear(&self) -> StoreResult<()> {
        let all: Vec<String> = keys::ALL.iter().map(|k| self.key(k)).collect();
        self.kv.remove_many(&all).await
    }

    /// Raw namespaced entries, for diagnostics
    pub async fn dump(&self) -> StoreResult<BTreeMap<String, Value>> {
        let prefix = format!("{}:", self.namespace);
        let mut out = BTreeMap::new();
        for key in self.kv.keys().await? {
            if !key.starts_with(&prefix) {
                continue;
            }
            if let Some(value) = self.kv.get(&key).await? {
                out.insert(key, value);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_context() -> WorkflowContext {
        let mut ctx = WorkflowContext::new_run();
        ctx.advance_to(WorkflowStep::FillingAndSaving);
        ctx.extraction.primary_coinsurance = Some(Percent::from_amount(20.0));
        ctx.extraction.urgent_copay = Some(Money::from_amount(75.0));
        ctx.insurance_level = InsuranceLevel::Secondary;
        ctx.guarantor_balance = Some("$12.50".to_string());
        ctx.next_appointment = Some("10/20/2026 09:30 AM Est - DR SMITH".to_string());
        ctx.retry_count = 1;
        ctx
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = WorkflowStateStore::in_memory("test");
        let ctx = populated_context();
        store.save(&ctx).await.unwrap();
        assert_eq!(store.load().await.unwrap(), ctx);
    }

    #[tokio::test]
    async fn test_empty_store_loads_idle() {
        let store = WorkflowStateStore::in_memory("test");
        let ctx = store.load().await.unwrap();
        assert!(ctx.current_step.is_idle());
        assert_eq!(ctx.retry_count, 0);
    }

    #[tokio::test]
    async fn test_clear_removes_only_own_namespace() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let ours = WorkflowStateStore::new(kv.clone(), "ours");
        let theirs = WorkflowStateStore::new(kv.clone(), "theirs");
        ours.save(&populated_context()).await.unwrap();
        theirs.save(&populated_context()).await.unwrap();

        ours.clear().await.unwrap();

        assert!(ours.dump().await.unwrap().is_empty());
        assert_eq!(theirs.dump().await.unwrap().len(), keys::ALL.len());
    }

    #[tokio::test]
    async fn test_corrupt_state_is_reported() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set_many(vec![("ns:state".to_string(), Value::from("dancing"))])
            .await
            .unwrap();
        let err = WorkflowStateStore::new(kv, "ns").load().await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptValue { ref key, .. } if key == "ns:state"));
        assert_eq!(err.code(), "STORE_4003");
    }

    #[tokio::test]
    async fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("workflow.json");
        let ctx = populated_context();

        WorkflowStateStore::new(Arc::new(JsonFileKeyValueStore::new(&path)), "ns")
            .save(&ctx)
            .await
            .unwrap();

        let reopened = WorkflowStateStore::new(Arc::new(JsonFileKeyValueStore::new(&path)), "ns");
        assert_eq!(reopened.load().await.unwrap(), ctx);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["ns:state"], "filling_and_saving");
        assert_eq!(raw["ns:primaryCopay"], Value::Null);
        assert_eq!(raw["ns:primaryCoinsurance"], "20");
        assert_eq!(raw["ns:insuranceLevel"], "secondary");
    }
}
