pub mod run;
pub mod sets;
pub mod status;

use anyhow::{Context, Result};
use clap::Args;
use kvmigrate::{Definition, DefinitionProvider, Migrator, ProviderContext, RedisVersionStore, Registry};

use crate::config::Settings;
use crate::output::Console;
use crate::theme::Tone;

/// Selects the migration set and the table its versions are recorded in.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Migration set to operate on
    #[arg(short = 's', long = "set")]
    pub set: String,

    /// Version table (key namespace) the set's versions are recorded in
    #[arg(short = 't', long = "table")]
    pub table: String,
}

/// Everything a command needs to work on one migration set.
pub struct Session {
    pub migrator: Migrator<RedisVersionStore>,
    pub definitions: Vec<Definition>,
}

impl Session {
    /// Resolve the set's definitions and connect the version store.
    pub async fn open(target: &TargetArgs, settings: &Settings, console: &Console) -> Result<Self> {
        let client = redis::Client::open(settings.redis_url.as_str())
            .with_context(|| format!("Invalid Redis URL: {}", settings.redis_url))?;
        let provider_ctx = ProviderContext::new(client, settings.prefix.clone());
        let definitions = Registry.provide(&target.set, &provider_ctx)?;

        console.say(Tone::Detail, &format!("connecting to {}", settings.redis_url));
        let store = RedisVersionStore::connect(&settings.redis_url, target.table.clone())
            .await
            .context("Failed to connect to Redis")?;

        log::debug!(
            "opened migration set {} ({} definitions) against table {}",
            target.set,
            definitions.len(),
            store.table()
        );

        Ok(Self {
            migrator: Migrator::new(store),
            definitions,
        })
    }
}
