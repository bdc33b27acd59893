//! gamectl — operator control panel for the shared game state.
//!
//! # Usage
//!
//! ```text
//! gamectl status [--json]
//! gamectl start
//! gamectl stop
//! gamectl checkpoint <1|2|3> [--undo]
//! gamectl reset [--all] [--yes]
//! gamectl refresh
//! gamectl watch
//! gamectl daemon start|stop|status
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    checkpoint::CheckpointArgs, daemon::DaemonCommand, game::StartArgs, game::StopArgs,
    reset::ResetArgs, status::RefreshArgs, status::StatusArgs, watch::WatchArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gamectl",
    version,
    about = "Control the shared game state and checkpoint progression",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the current game state and checkpoint progress.
    Status(StatusArgs),

    /// Mark the game as started.
    Start(StartArgs),

    /// Mark the game as not started (clears every checkpoint).
    Stop(StopArgs),

    /// Complete or undo a checkpoint.
    Checkpoint(CheckpointArgs),

    /// Reset the checkpoint flags (and, with --all, the started flag).
    Reset(ResetArgs),

    /// Re-read the game state from the store.
    Refresh(RefreshArgs),

    /// Follow live changes pushed by the store.
    Watch(WatchArgs),

    /// Manage the gamectl store daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Status(args) => args.run(),
        Commands::Start(args) => args.run(),
        Commands::Stop(args) => args.run(),
        Commands::Checkpoint(args) => args.run(),
        Commands::Reset(args) => args.run(),
        Commands::Refresh(args) => args.run(),
        Commands::Watch(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}
