//! Sequential migration runner for Redis-backed applications.
//!
//! Each migration set keeps a newest-first list of [`Definition`]s. The
//! [`Migrator`] compares that list with the last version recorded in a
//! [`VersionStore`], runs what is pending oldest-first and records every
//! successful step with a conditional write, so re-running is safe.

pub mod engine;
pub mod errors;
pub mod id;
pub mod keys;
pub mod registry;
pub mod store;
pub mod types;

pub use engine::Migrator;
pub use errors::*;
pub use registry::{
    DefinitionProvider, MigrationSetRegistration, ProviderContext, Registry, find_set, registered_sets,
};
pub use store::{MemoryVersionStore, RedisVersionStore, VersionStore};
pub use types::{Definition, Execution, PendingStep, Plan, Summary, VersionRecord};

// Re-export redis types so migration sets don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;

// Re-export inventory for migration set registration
pub use inventory;

/// Delete all keys matching a pattern (for test cleanup).
///
/// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, StoreError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}
