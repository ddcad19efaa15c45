/// Key-construction helpers for the version table.
///
/// Layout for a table `t` and migration set `s`:
/// - `t:{s}:versions` sorted set of applied version numbers (score = version)
/// - `t:{s}:v:<n>` JSON [`VersionRecord`](crate::types::VersionRecord) for version `n`
///
/// The braces are a Redis hash tag so both keys of a set land in the same
/// cluster slot, which the commit script requires.
/// Check that `migration_set` forms a usable hash tag.
///
/// An empty tag (`{}`) is ignored by Redis Cluster and braces inside the name
/// would end the tag early; either way the index and record keys of a set
/// could hash to different slots.
pub fn check_set_name(migration_set: &str) -> Result<(), &'static str> {
    if migration_set.is_empty() {
        return Err("must not be empty");
    }
    if migration_set.contains(['{', '}']) {
        return Err("must not contain '{' or '}'");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub table: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    pub fn version_index(&self, migration_set: &str) -> String {
        format!("{}:{{{}}}:versions", self.table, migration_set)
    }

    pub fn version_record(&self, migration_set: &str, version_number: u64) -> String {
        format!("{}:{{{}}}:v:{}", self.table, migration_set, version_number)
    }

    /// Pattern matching every key of a migration set (for cleanup).
    pub fn set_pattern(&self, migration_set: &str) -> String {
        format!("{}:{{{}}}:*", self.table, migration_set)
    }
}
