//! Persistence of applied migration versions.
//!
//! - `VersionStore` - contract the engine depends on
//! - `RedisVersionStore` - Redis-backed store using a Lua conditional write
//! - `MemoryVersionStore` - in-process store for tests and embedding

mod memory;
mod redis_store;
mod scripts;

pub use memory::MemoryVersionStore;
pub use redis_store::RedisVersionStore;

use crate::{errors::StoreError, types::VersionRecord};

/// Durable per-migration-set record of applied steps.
#[allow(async_fn_in_trait)]
pub trait VersionStore {
    /// Highest-version record for the set, `None` if nothing was applied yet.
    async fn latest_version(&self, migration_set: &str) -> Result<Option<VersionRecord>, StoreError>;

    /// Write one new record.
    ///
    /// Must fail with [`StoreError::DuplicateVersion`] when a record already
    /// exists for `(migration_set, version_number)`.
    async fn commit(&self, record: &VersionRecord) -> Result<(), StoreError>;

    /// Every applied record for the set, oldest first.
    async fn history(&self, migration_set: &str) -> Result<Vec<VersionRecord>, StoreError>;
}
