use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use kvmigrate::{PendingStep, Plan, VersionRecord, VersionStore};
use serde::Serialize;

use super::{Session, TargetArgs};
use crate::config::Settings;
use crate::examples::ExampleGroup;
use crate::output::{Console, View};
use crate::theme::Tone;
use crate::utils::{format_datetime, format_duration};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Inspect",
    commands: &[
        "kvmigrate status --set example --table migrations",
        "kvmigrate status -s example -t migrations --output json",
    ],
}];

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Applied history and pending work of one migration set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub migration_set: String,
    pub table: String,
    pub applied: Vec<VersionRecord>,
    pub pending: Vec<PendingStep>,
}

pub async fn handle_status(args: StatusArgs, settings: &Settings, console: &Console) -> Result<()> {
    let set = args.target.set.as_str();
    console.banner("Status of", set, &args.target.table);

    let session = Session::open(&args.target, settings, console).await?;
    let store = session.migrator.store();
    let applied = store.history(set).await?;
    let plan = session.migrator.plan(set, &session.definitions).await?;

    let view = StatusView {
        migration_set: set.to_string(),
        table: store.table().to_string(),
        applied,
        pending: plan.pending,
    };
    console.show(&view)?;

    if view.pending.is_empty() {
        console.say(Tone::UpToDate, &format!("up to date at version {}", plan.current_version));
    } else {
        console.say(
            Tone::Pending,
            &format!(
                "{} pending, version {} -> {}",
                view.pending.len(),
                plan.current_version,
                plan.target_version
            ),
        );
    }

    Ok(())
}

impl View for StatusView {
    fn table(&self, console: &Console) -> Table {
        let mut table = console.table(&["", "Version", "Migration", "Fired At", "Elapsed"]);

        for record in &self.applied {
            table.add_row(vec![
                Cell::new(Tone::Applied.glyph()),
                Cell::new(record.version_number),
                Cell::new(&record.name),
                Cell::new(format_datetime(record.fired_at)),
                Cell::new(format_duration(record.elapsed())),
            ]);
        }
        for step in &self.pending {
            table.add_row(vec![
                Cell::new(Tone::Pending.glyph()),
                Cell::new(step.version_number),
                Cell::new(&step.name),
                Cell::new("pending"),
                Cell::new(""),
            ]);
        }

        table
    }

    fn compact(&self) -> String {
        format!(
            "{}: {} applied, {} pending",
            self.migration_set,
            self.applied.len(),
            self.pending.len()
        )
    }
}

impl View for Plan {
    fn table(&self, console: &Console) -> Table {
        let mut table = console.table(&["Version", "Pending Migration"]);
        for step in &self.pending {
            table.add_row(vec![Cell::new(step.version_number), Cell::new(&step.name)]);
        }
        table
    }

    fn compact(&self) -> String {
        if self.is_up_to_date() {
            format!("{}: up to date at version {}", self.migration_set, self.current_version)
        } else {
            format!(
                "{}: version {} -> {} ({} pending)",
                self.migration_set,
                self.current_version,
                self.target_version,
                self.pending.len()
            )
        }
    }
}
