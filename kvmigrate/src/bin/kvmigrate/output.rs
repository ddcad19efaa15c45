//! Console output for migration commands.
//!
//! Results (plans, status views) go to stdout. Run reports and failures go
//! to stderr so a deploy pipeline always captures how far a run got, even
//! with `--quiet` or when stdout is piped into another tool.

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use serde::Serialize;

use crate::theme::{self, Tone};

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON, for scripting
    Json,
    /// One line per view
    Compact,
}

/// Something a command prints in every [`OutputFormat`].
pub trait View: Serialize {
    fn table(&self, console: &Console) -> Table;
    fn compact(&self) -> String;
}

pub struct Console {
    format: OutputFormat,
    quiet: bool,
    verbose: bool,
    color: bool,
}

impl Console {
    pub fn new(format: OutputFormat, quiet: bool, verbose: bool, no_color: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            color: !no_color && theme::color_supported(),
        }
    }

    /// Heading naming the set and version table a command works on.
    pub fn banner(&self, action: &str, migration_set: &str, table: &str) {
        if self.quiet || self.format == OutputFormat::Json {
            return;
        }
        let set = theme::paint(migration_set, theme::LABEL, true, self.color);
        let action = theme::paint(action, theme::HEADING, true, self.color);
        println!("{action} {set} (table {table})");
    }

    /// One status line. Diagnostic tones survive `--quiet`; details need `--verbose`.
    pub fn say(&self, tone: Tone, message: &str) {
        if tone == Tone::Detail && !self.verbose {
            return;
        }
        if !tone.is_diagnostic() && (self.quiet || self.format == OutputFormat::Json) {
            return;
        }

        let line = format_line(tone, message, self.color);
        if tone.is_diagnostic() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    /// Final error of a failed command.
    pub fn failure(&self, err: &anyhow::Error) {
        eprintln!("{}", format_line(Tone::Halted, &format!("{err:#}"), self.color));
    }

    /// Print a result view on stdout.
    pub fn show<T: View>(&self, view: &T) -> Result<()> {
        if !self.quiet {
            println!("{}", self.render(view)?);
        }
        Ok(())
    }

    /// Print a run report on stderr, regardless of `--quiet`.
    pub fn report<T: View>(&self, view: &T) -> Result<()> {
        eprintln!("{}", self.render(view)?);
        Ok(())
    }

    fn render<T: View>(&self, view: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(view)?,
            OutputFormat::Table => view.table(self).to_string(),
            OutputFormat::Compact => view.compact(),
        })
    }

    /// Empty table with this console's border style and a bold header row.
    pub fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(if self.color {
            presets::UTF8_FULL_CONDENSED
        } else {
            presets::ASCII_FULL
        });

        table.set_header(headers.iter().map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if self.color { cell.fg(TableColor::Cyan) } else { cell }
        }));
        table
    }
}

fn format_line(tone: Tone, message: &str, color: bool) -> String {
    let glyph = theme::paint(tone.glyph(), tone.color(), true, color);
    let message = theme::paint(message, tone.color(), false, color);
    format!("{glyph} {message}")
}
