use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::examples::ExampleGroup;
use crate::output::{Console, View};
use crate::theme::Tone;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Discover",
    commands: &[
        "kvmigrate sets",
        "kvmigrate sets --output compact",
    ],
}];

#[derive(Debug, Serialize)]
pub struct SetEntry {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SetList(pub Vec<SetEntry>);

pub fn handle_sets(console: &Console) -> Result<()> {
    let sets = SetList(
        kvmigrate::registered_sets()
            .into_iter()
            .map(|set| SetEntry {
                name: set.name,
                description: set.description,
            })
            .collect(),
    );

    if sets.0.is_empty() {
        console.say(Tone::UpToDate, "no migration sets are compiled into this binary");
        return Ok(());
    }

    console.show(&sets)
}

impl View for SetList {
    fn table(&self, console: &Console) -> Table {
        let mut table = console.table(&["Set", "Description"]);
        for entry in &self.0 {
            table.add_row(vec![Cell::new(entry.name), Cell::new(entry.description)]);
        }
        table
    }

    fn compact(&self) -> String {
        self.0.iter().map(|entry| entry.name).collect::<Vec<_>>().join(" ")
    }
}
