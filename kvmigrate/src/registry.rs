//! Migration set auto-registration via the inventory crate.
//!
//! A migration set registers itself once, anywhere in the final binary:
//!
//! ```ignore
//! inventory::submit! {
//!     MigrationSetRegistration {
//!         name: "example",
//!         description: "Seed example records",
//!         definitions: example_definitions,
//!     }
//! }
//! ```
//!
//! [`Registry`] then resolves set names to their definitions at run time.

use crate::{errors::MigrateError, types::Definition};

/// Ambient resources handed to migration actions when definitions are built.
#[derive(Clone)]
pub struct ProviderContext {
    client: redis::Client,
    prefix: String,
}

impl ProviderContext {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    /// Redis client migrations use to reach application data.
    pub fn client(&self) -> &redis::Client {
        &self.client
    }

    /// Key prefix of the application's data.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of a document in one of the application's collections.
    pub fn document_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, id)
    }
}

/// Compile-time registration of a migration set.
pub struct MigrationSetRegistration {
    /// Set name selected on the command line
    pub name: &'static str,
    /// One-line description shown by `kvmigrate sets`
    pub description: &'static str,
    /// Builds the set's definitions, newest first
    pub definitions: fn(&ProviderContext) -> Vec<Definition>,
}

inventory::collect!(MigrationSetRegistration);

/// Supplies the ordered definitions of a migration set.
pub trait DefinitionProvider {
    /// Definitions of `migration_set`, newest first.
    fn provide(&self, migration_set: &str, ctx: &ProviderContext) -> Result<Vec<Definition>, MigrateError>;
}

/// Provider backed by every [`MigrationSetRegistration`] linked into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl DefinitionProvider for Registry {
    fn provide(&self, migration_set: &str, ctx: &ProviderContext) -> Result<Vec<Definition>, MigrateError> {
        let registration = find_set(migration_set)?;
        Ok((registration.definitions)(ctx))
    }
}

/// All registered migration sets, sorted by name.
pub fn registered_sets() -> Vec<&'static MigrationSetRegistration> {
    let mut sets: Vec<_> = inventory::iter::<MigrationSetRegistration>().collect();
    sets.sort_by_key(|set| set.name);
    sets
}

/// Look up a registered migration set by name.
pub fn find_set(name: &str) -> Result<&'static MigrationSetRegistration, MigrateError> {
    inventory::iter::<MigrationSetRegistration>()
        .find(|set| set.name == name)
        .ok_or_else(|| MigrateError::UnknownMigrationSet { name: name.to_string() })
}
