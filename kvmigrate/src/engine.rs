//! Reconciles a migration set's definitions with its persisted version and
//! applies whatever is pending.

use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};

use crate::{
    errors::MigrateError,
    id::generate_run_id,
    keys::check_set_name,
    store::VersionStore,
    types::{Definition, Execution, PendingStep, Plan, Summary, VersionRecord},
};

/// Runs migration definitions against a version store.
pub struct Migrator<S> {
    store: S,
}

impl<S> Migrator<S>
where
    S: VersionStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply every pending definition of `migration_set`, oldest first.
    ///
    /// `definitions` is newest-first. Each applied step is recorded before the
    /// next one starts; the first failure ends the run and the error carries
    /// the progress made so far.
    pub async fn run(&self, migration_set: &str, definitions: &[Definition]) -> Result<Summary, MigrateError> {
        validate(migration_set, definitions)?;
        let run_id = generate_run_id();
        let starting_version = self.current_version(migration_set).await?;

        if definitions.is_empty() {
            debug!("[{run_id}] migration set '{migration_set}' has no definitions");
            return Ok(Summary::default());
        }

        let pending = pending_definitions(definitions, starting_version)?;
        info!(
            "[{run_id}] migration set '{migration_set}' at version {starting_version}, {} pending",
            pending.len()
        );

        let mut summary = Summary {
            starting_version,
            current_version: starting_version,
            executions: Vec::with_capacity(pending.len()),
        };

        for definition in pending.iter().rev() {
            let name = definition.name();
            let fired_at = Utc::now();
            let started = Instant::now();

            if let Err(cause) = definition.fire().await {
                warn!("[{run_id}] migration '{name}' failed: {cause:#}");
                return Err(MigrateError::MigrationFailed {
                    name: name.to_string(),
                    summary,
                    cause,
                });
            }

            let execution = Execution {
                name: name.to_string(),
                fired_at,
                elapsed: started.elapsed(),
            };
            let version_number = summary.current_version + 1;
            let record = VersionRecord::new(migration_set, version_number, &execution);

            if let Err(source) = self.store.commit(&record).await {
                warn!("[{run_id}] migration '{name}' ran but version {version_number} was not recorded: {source}");
                return Err(MigrateError::CommitFailed {
                    name: name.to_string(),
                    version_number,
                    execution,
                    summary,
                    source,
                });
            }

            info!(
                "[{run_id}] applied '{name}' as version {version_number} in {:?}",
                execution.elapsed
            );
            summary.current_version = version_number;
            summary.executions.push(execution);
        }

        Ok(summary)
    }

    /// Work a run would do right now, without executing anything.
    pub async fn plan(&self, migration_set: &str, definitions: &[Definition]) -> Result<Plan, MigrateError> {
        validate(migration_set, definitions)?;
        let current_version = self.current_version(migration_set).await?;

        let pending: &[Definition] = if definitions.is_empty() {
            &[]
        } else {
            pending_definitions(definitions, current_version)?
        };

        let steps: Vec<PendingStep> = pending
            .iter()
            .rev()
            .zip(current_version + 1..)
            .map(|(definition, version_number)| PendingStep {
                version_number,
                name: definition.name().to_string(),
            })
            .collect();

        Ok(Plan {
            migration_set: migration_set.to_string(),
            current_version,
            target_version: current_version + steps.len() as u64,
            pending: steps,
        })
    }

    async fn current_version(&self, migration_set: &str) -> Result<u64, MigrateError> {
        let latest = self.store.latest_version(migration_set).await?;
        Ok(latest.map(|record| record.version_number).unwrap_or(0))
    }
}

/// Reject names that cannot be stored before anything touches the store.
fn validate(migration_set: &str, definitions: &[Definition]) -> Result<(), MigrateError> {
    check_set_name(migration_set).map_err(|reason| MigrateError::InvalidMigrationSet {
        name: migration_set.to_string(),
        reason,
    })?;

    match definitions.iter().position(|definition| definition.name().is_empty()) {
        Some(position) => Err(MigrateError::UnnamedDefinition {
            migration_set: migration_set.to_string(),
            position,
        }),
        None => Ok(()),
    }
}

/// Slice of `definitions` not yet applied at `version`.
///
/// The list is newest-first, so the pending steps are the leading
/// `len - version` entries and the oldest of them is the last.
fn pending_definitions(definitions: &[Definition], version: u64) -> Result<&[Definition], MigrateError> {
    let defined = definitions.len() as u64;
    if defined < version {
        return Err(MigrateError::MigrationHole {
            defined,
            applied: version,
        });
    }

    Ok(&definitions[..(defined - version) as usize])
}
