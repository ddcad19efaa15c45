//! Colors and glyphs for migration outcomes.

use colored::{Color, Colorize, control::ShouldColorize};
use once_cell::sync::Lazy;

/// Whether the terminal and environment (`NO_COLOR`, `CLICOLOR`) allow color.
static COLOR_SUPPORTED: Lazy<bool> = Lazy::new(|| ShouldColorize::from_env().should_colorize());

pub fn color_supported() -> bool {
    *COLOR_SUPPORTED
}

/// What a line of output says about the migration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Steps were applied and recorded
    Applied,
    /// Nothing left to apply
    UpToDate,
    /// Steps a run would apply
    Pending,
    /// The run stopped on a failure
    Halted,
    /// A step ran but its version is not on record
    Unrecorded,
    /// Connection and configuration details, shown with `--verbose`
    Detail,
}

impl Tone {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Applied => "✓",
            Self::UpToDate => "=",
            Self::Pending => "◷",
            Self::Halted => "✗",
            Self::Unrecorded => "⚠",
            Self::Detail => "·",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Applied => Color::Green,
            Self::UpToDate => Color::Blue,
            Self::Pending => Color::Cyan,
            Self::Halted => Color::Red,
            Self::Unrecorded => Color::Yellow,
            Self::Detail => Color::BrightBlack,
        }
    }

    /// Failures and side-effect warnings go to stderr, next to the run report.
    pub fn is_diagnostic(self) -> bool {
        matches!(self, Self::Halted | Self::Unrecorded | Self::Detail)
    }
}

/// Color for headings and table headers.
pub const HEADING: Color = Color::BrightBlue;
/// Color for names in help text and banners.
pub const LABEL: Color = Color::BrightCyan;

pub fn paint(text: &str, color: Color, bold: bool, enabled: bool) -> String {
    match (enabled, bold) {
        (false, _) => text.to_string(),
        (true, false) => text.color(color).to_string(),
        (true, true) => text.color(color).bold().to_string(),
    }
}
