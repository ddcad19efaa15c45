use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use kvmigrate::{MigrateError, Summary};

use super::{Session, TargetArgs};
use crate::config::Settings;
use crate::examples::ExampleGroup;
use crate::output::{Console, View};
use crate::theme::Tone;
use crate::utils::{format_datetime, format_duration};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Apply migrations",
        commands: &[
            "kvmigrate run --set example --table migrations",
            "kvmigrate run -s example -t migrations --output json",
        ],
    },
    ExampleGroup {
        title: "Preview",
        commands: &["kvmigrate run --set example --table migrations --dry-run"],
    },
];

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show pending migrations without running them
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_run(args: RunArgs, settings: &Settings, console: &Console) -> Result<()> {
    let set = args.target.set.as_str();
    let action = if args.dry_run { "Plan" } else { "Migrate" };
    console.banner(action, set, &args.target.table);

    let session = Session::open(&args.target, settings, console).await?;

    if args.dry_run {
        let plan = session.migrator.plan(set, &session.definitions).await?;
        return console.show(&plan);
    }

    match session.migrator.run(set, &session.definitions).await {
        Ok(summary) => {
            console.report(&summary)?;
            console.say(outcome_tone(&summary), &outcome_message(&summary));
            Ok(())
        }
        Err(err) => {
            if let Some(summary) = err.summary() {
                console.report(summary)?;
            }
            if let Some(warning) = unrecorded_warning(&err) {
                console.say(Tone::Unrecorded, &warning);
            }
            Err(err.into())
        }
    }
}

fn outcome_tone(summary: &Summary) -> Tone {
    if summary.applied() > 0 { Tone::Applied } else { Tone::UpToDate }
}

fn outcome_message(summary: &Summary) -> String {
    match summary.applied() {
        0 => format!("already at version {}", summary.current_version),
        n => format!(
            "{n} migration(s) applied, version {} -> {}",
            summary.starting_version, summary.current_version
        ),
    }
}

/// Operator-facing note for a step whose side effects are not on record.
fn unrecorded_warning(err: &MigrateError) -> Option<String> {
    match err {
        MigrateError::CommitFailed {
            name,
            version_number,
            execution,
            ..
        } => Some(format!(
            "'{name}' ran at {} but version {version_number} was not recorded; \
             check its effects before running again, the next run repeats it",
            format_datetime(execution.fired_at)
        )),
        _ => None,
    }
}

impl View for Summary {
    fn table(&self, console: &Console) -> Table {
        let mut table = console.table(&["Version", "Migration", "Fired At", "Elapsed"]);
        let versions = self.starting_version + 1..;

        for (version, execution) in versions.zip(&self.executions) {
            table.add_row(vec![
                Cell::new(version),
                Cell::new(&execution.name),
                Cell::new(format_datetime(execution.fired_at)),
                Cell::new(format_duration(execution.elapsed)),
            ]);
        }

        table
    }

    fn compact(&self) -> String {
        format!(
            "version {} -> {} ({} applied)",
            self.starting_version,
            self.current_version,
            self.applied()
        )
    }
}
