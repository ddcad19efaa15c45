use std::borrow::Cow;

use thiserror::Error;

use crate::types::{Execution, Summary};

/// Failure reported by a [`VersionStore`](crate::store::VersionStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying Redis command failed (connection refused, dropped, timeout...).
    #[error("store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    /// The backend answered but the response could not be interpreted.
    #[error("query failed: {message}")]
    QueryFailed { message: Cow<'static, str> },

    /// Conditional write rejected: the version is already recorded for the set.
    #[error("version {version_number} of migration set '{migration_set}' is already recorded")]
    DuplicateVersion { migration_set: String, version_number: u64 },
}

impl StoreError {
    pub(crate) fn query_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::QueryFailed { message: message.into() }
    }

    /// Whether this is the conditional-write rejection rather than a transport problem.
    pub fn is_duplicate_version(&self) -> bool {
        matches!(self, Self::DuplicateVersion { .. })
    }
}

/// Top-level error returned by the migration engine and definition providers.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Reading the persisted version failed before any migration ran.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// More migrations are recorded than are currently defined.
    #[error("too few migrations ({defined} defined, {applied} applied), did you remove any by accident?")]
    MigrationHole { defined: u64, applied: u64 },

    /// A migration action returned an error. Nothing was recorded for it.
    #[error("migration '{name}' failure: {cause}")]
    MigrationFailed {
        name: String,
        summary: Summary,
        #[source]
        cause: anyhow::Error,
    },

    /// A migration action succeeded but its version record could not be written.
    #[error("migration '{name}' ran but version {version_number} could not be recorded: {source}")]
    CommitFailed {
        name: String,
        version_number: u64,
        execution: Execution,
        summary: Summary,
        #[source]
        source: StoreError,
    },

    /// The migration set name cannot be turned into a version table key.
    #[error("invalid migration set name '{name}': {reason}")]
    InvalidMigrationSet { name: String, reason: &'static str },

    /// A definition has an empty name. Version records are keyed by name for humans.
    #[error("definition at position {position} of migration set '{migration_set}' has an empty name")]
    UnnamedDefinition { migration_set: String, position: usize },

    /// No migration set is registered under the requested name.
    #[error("unknown migration set: {name}")]
    UnknownMigrationSet { name: String },
}

impl MigrateError {
    /// Progress made before the run halted, for the variants that carry one.
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Self::MigrationFailed { summary, .. } | Self::CommitFailed { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// True when a migration's side effects happened without being recorded.
    ///
    /// Re-running will execute that migration again, so the operator has to
    /// check whether it is safe to repeat.
    pub fn is_unrecorded_side_effect(&self) -> bool {
        matches!(self, Self::CommitFailed { .. })
    }
}
