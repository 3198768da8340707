use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

mod aggregate;
mod config;
mod console;
mod datetime;
mod error;
mod fill_command;
mod gap_fill;
mod logger;
mod round_command;
mod rounding;
mod time_entry;
mod toggl;

use config::{TogglConfig, DEFAULT_API_URL};
use console::{ConsoleMarkdownList, ConsolePresenter};
use fill_command::{FillArgs, FillCommand};
use round_command::{RoundArgs, RoundCommand};
use toggl::TogglClient;

/// Toggl のtime entryを15分単位に丸め、1日の作業時間を穴埋めするCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- round 3 --dry-run
/// $ cargo run -- fill --workspace-id 1 --project-id 2
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        long = "api-token",
        env = "TOGGL_API_TOKEN",
        hide_env_values = true,
        help = "Toggl API token"
    )]
    api_token: String,

    #[clap(long = "api-url", default_value = DEFAULT_API_URL, help = "Toggl API base URL")]
    api_url: String,

    #[clap(short, long, parse(from_occurrences), help = "Increase log verbosity")]
    verbose: u64,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Round time entries to quarter hours and update them
    Round(RoundArgs),
    /// Pad days shorter than the target with a filler entry
    Fill(FillArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(logger::level_from_verbosity(args.verbose))?;

    let client = TogglClient::new(TogglConfig::new(&args.api_url, &args.api_token));
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match args.subcommand {
        SubCommands::Round(round) => {
            let time_entries = RoundCommand::new(&client)
                .run(&round)
                .await
                .context("Failed to round time entries")?;
            if round.dry_run {
                presenter.show_time_entries(&time_entries)?;
            }
        }
        SubCommands::Fill(fill) => {
            let fillers = FillCommand::new(&client)
                .run(&fill)
                .await
                .context("Failed to fill time entries")?;
            if fill.dry_run {
                presenter.show_time_entries(&fillers)?;
            }
        }
    }

    info!("Update complete.");

    Ok(())
}
