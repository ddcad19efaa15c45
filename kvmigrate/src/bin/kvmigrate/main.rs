mod commands;
mod config;
mod examples;
mod migrations;
mod output;
mod theme;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{
    ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::styling::{AnsiColor, Styles},
};

use commands::{
    run::{RunArgs, handle_run},
    sets::handle_sets,
    status::{StatusArgs, handle_status},
};
use config::Settings;
use output::{Console, OutputFormat};

#[derive(Parser)]
#[command(name = "kvmigrate", version)]
#[command(
    about = "Sequential migration runner for Redis-backed applications",
    long_about = "Sequential migration runner for Redis-backed applications.\n\n\
        Each migration set is versioned on its own. Pending migrations run oldest-first, \
        one at a time, and every applied step is recorded with a conditional write, so \
        running again is safe. The first failure halts the run and the report shows how \
        far it got."
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Only print failures and run reports
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Print connection and configuration details
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Redis connection URL (overrides the configuration file)
    #[arg(long, global = true, env = "REDIS_URL", hide_env_values = true)]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations of a migration set
    Run(RunArgs),

    /// Show applied and pending migrations of a migration set
    Status(StatusArgs),

    /// List the migration sets compiled into this binary
    Sets,
}

impl Cli {
    /// Parse argv with colored help and per-command examples.
    fn parse_with_examples() -> Self {
        let color = theme::color_supported();
        let mut command = Cli::command()
            .styles(help_styles())
            .color(if color { ColorChoice::Auto } else { ColorChoice::Never })
            .after_long_help(examples::appendix(color));

        for (name, groups) in examples::by_command() {
            command = command.mut_subcommand(name, |sub| sub.after_long_help(examples::render(groups, color)));
        }

        let matches = command.get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn help_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().bold())
        .usage(AnsiColor::BrightBlue.on_default().bold())
        .literal(AnsiColor::Magenta.on_default())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .error(AnsiColor::Red.on_default().bold())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse_with_examples();
    let console = Console::new(cli.output, cli.quiet, cli.verbose, cli.no_color);

    match execute(cli, &console).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            console.failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli, console: &Console) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let settings = Settings::load(&cli.config, cli.redis_url)?;
            handle_run(args, &settings, console).await
        }
        Commands::Status(args) => {
            let settings = Settings::load(&cli.config, cli.redis_url)?;
            handle_status(args, &settings, console).await
        }
        Commands::Sets => handle_sets(console),
    }
}
