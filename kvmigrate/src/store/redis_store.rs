//! Version store backed by Redis.

use redis::aio::ConnectionManager;
use serde_json::Value;

use super::{VersionStore, scripts::COMMIT_VERSION_SCRIPT};
use crate::{errors::StoreError, keys::KeyContext, types::VersionRecord};

/// Stores version records under a table prefix.
///
/// The connection manager is cloned per call; clones share one multiplexed
/// connection.
#[derive(Clone)]
pub struct RedisVersionStore {
    conn: ConnectionManager,
    table: String,
}

impl RedisVersionStore {
    pub fn new(conn: ConnectionManager, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
        }
    }

    /// Connect to `url` and store records under `table`.
    pub async fn connect(url: &str, table: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, table))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.table)
    }

    async fn load_records(&self, migration_set: &str, versions: &[u64]) -> Result<Vec<VersionRecord>, StoreError> {
        if versions.is_empty() {
            return Ok(Vec::new());
        }

        let keys = self.keys();
        let record_keys: Vec<String> = versions
            .iter()
            .map(|version| keys.version_record(migration_set, *version))
            .collect();

        let mut conn = self.conn.clone();
        let payloads: Vec<Option<String>> = redis::cmd("MGET").arg(&record_keys).query_async(&mut conn).await?;

        payloads
            .into_iter()
            .zip(record_keys)
            .map(|(payload, key)| match payload {
                Some(json) => decode_record(&key, &json),
                None => Err(StoreError::query_failed(format!(
                    "version index references missing record '{key}'"
                ))),
            })
            .collect()
    }
}

impl VersionStore for RedisVersionStore {
    async fn latest_version(&self, migration_set: &str) -> Result<Option<VersionRecord>, StoreError> {
        let index_key = self.keys().version_index(migration_set);
        let mut conn = self.conn.clone();

        // Highest score only.
        let versions: Vec<u64> = redis::cmd("ZREVRANGE")
            .arg(&index_key)
            .arg(0)
            .arg(0)
            .query_async(&mut conn)
            .await?;

        let mut records = self.load_records(migration_set, &versions).await?;
        Ok(records.pop())
    }

    async fn commit(&self, record: &VersionRecord) -> Result<(), StoreError> {
        let keys = self.keys();
        let record_key = keys.version_record(&record.migration_set, record.version_number);
        let index_key = keys.version_index(&record.migration_set);

        let payload = serde_json::to_string(record)
            .map_err(|err| StoreError::query_failed(format!("failed to serialize version record: {err}")))?;

        let mut conn = self.conn.clone();
        let mut invocation = COMMIT_VERSION_SCRIPT.prepare_invoke();
        invocation
            .key(&record_key)
            .key(&index_key)
            .arg(payload)
            .arg(record.version_number);
        let raw: String = invocation.invoke_async(&mut conn).await?;

        let value: Value = serde_json::from_str(&raw)
            .map_err(|err| StoreError::query_failed(format!("failed to parse lua response: {err}")))?;

        match value.get("error").and_then(|v| v.as_str()) {
            None => Ok(()),
            Some("duplicate_version") => Err(StoreError::DuplicateVersion {
                migration_set: record.migration_set.clone(),
                version_number: record.version_number,
            }),
            Some(other) => Err(StoreError::query_failed(other.to_string())),
        }
    }

    async fn history(&self, migration_set: &str) -> Result<Vec<VersionRecord>, StoreError> {
        let index_key = self.keys().version_index(migration_set);
        let mut conn = self.conn.clone();

        let versions: Vec<u64> = redis::cmd("ZRANGE")
            .arg(&index_key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;

        self.load_records(migration_set, &versions).await
    }
}

fn decode_record(key: &str, json: &str) -> Result<VersionRecord, StoreError> {
    serde_json::from_str(json)
        .map_err(|err| StoreError::query_failed(format!("failed to decode version record '{key}': {err}")))
}
