use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Boxed future produced by a migration action.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

type Action = Box<dyn Fn() -> ActionFuture + Send + Sync>;

/// A single named unit of work inside a migration set.
///
/// Definitions for a set are kept newest-first: a new migration is pushed to
/// the front of the list, so the last element is version 1.
pub struct Definition {
    name: String,
    action: Action,
}

impl Definition {
    /// `name` must be non-empty; [`Migrator`](crate::Migrator) rejects a list
    /// containing an unnamed definition before running anything.
    pub fn new<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(move || -> ActionFuture { Box::pin(action()) }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn fire(&self) -> ActionFuture {
        (self.action)()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Persisted record of one applied migration.
///
/// Field names are the storage contract shared with existing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub migration_set: String,
    pub version_number: u64,
    pub name: String,
    #[serde(rename = "firedAt")]
    pub fired_at: DateTime<Utc>,
    /// Execution time in nanoseconds
    #[serde(rename = "elapsed")]
    pub elapsed_nanos: u64,
}

impl VersionRecord {
    pub fn new(migration_set: impl Into<String>, version_number: u64, execution: &Execution) -> Self {
        Self {
            migration_set: migration_set.into(),
            version_number,
            name: execution.name.clone(),
            fired_at: execution.fired_at,
            elapsed_nanos: u64::try_from(execution.elapsed.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos)
    }
}

/// What happened to one migration during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub name: String,
    pub fired_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_nanos")]
    pub elapsed: Duration,
}

/// Result of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub starting_version: u64,
    pub current_version: u64,
    pub executions: Vec<Execution>,
}

impl Summary {
    /// Number of migrations committed during the run.
    pub fn applied(&self) -> u64 {
        self.current_version - self.starting_version
    }
}

/// A migration that would run next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStep {
    pub version_number: u64,
    pub name: String,
}

/// Pending work for a migration set, computed without executing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub migration_set: String,
    pub current_version: u64,
    pub target_version: u64,
    /// Oldest first, in the order a run would apply them
    pub pending: Vec<PendingStep>,
}

impl Plan {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

fn serialize_nanos<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}
