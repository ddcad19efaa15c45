//! Usage examples appended to `--help`.

use std::fmt::Write;

use crate::commands::{run, sets, status};
use crate::theme::{self, HEADING, LABEL};

pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

const ENVIRONMENT: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis holding the version table and the application data"),
    ("RUST_LOG", "Log filter, e.g. info or kvmigrate=debug"),
];

pub fn by_command() -> [(&'static str, &'static [ExampleGroup]); 3] {
    [("run", run::EXAMPLES), ("status", status::EXAMPLES), ("sets", sets::EXAMPLES)]
}

pub fn render(groups: &[ExampleGroup], color: bool) -> String {
    let mut text = theme::paint("Examples:", HEADING, true, color);
    for group in groups {
        let _ = write!(text, "\n  {}", theme::paint(group.title, LABEL, true, color));
        for command in group.commands {
            let _ = write!(text, "\n    $ {command}");
        }
    }
    text
}

/// Environment variables section of the top-level help.
pub fn appendix(color: bool) -> String {
    let mut text = theme::paint("Environment:", HEADING, true, color);
    for (name, purpose) in ENVIRONMENT {
        let _ = write!(text, "\n  {:<10} {purpose}", name);
    }
    text.push_str("\n\nSee 'kvmigrate <command> --help' for examples.");
    text
}
