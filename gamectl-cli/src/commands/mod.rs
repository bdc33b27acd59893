//! Shared plumbing for gamectl subcommands.

pub mod checkpoint;
pub mod daemon;
pub mod game;
pub mod reset;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;

use gamectl_core::policy::{can_enable, completed_checkpoints, progress, CHAIN, CHECKPOINT_COUNT};
use gamectl_core::{Flag, GameState};
use gamectl_store::SocketStore;
use gamectl_sync::{Notification, Synchronizer};

/// One current-thread runtime per command invocation.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}

/// Synchronizer over the store daemon socket under the user's home.
pub(crate) fn synchronizer() -> Result<Synchronizer<SocketStore>> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let store = SocketStore::new(gamectl_daemon::paths::socket_path(&home));
    Ok(Synchronizer::new(store))
}

/// Print drained operator notifications.
pub(crate) fn print_notifications(sync: &mut Synchronizer<SocketStore>) {
    for notification in sync.take_notifications() {
        match notification {
            Notification::Success(message) => println!("{} {message}", "✓".green().bold()),
            Notification::Failure(message) => eprintln!("{} {message}", "✗".red().bold()),
        }
    }
}

/// Render the record the way the dashboard laid it out: started control,
/// one line per checkpoint, progress.
pub(crate) fn render_record(record: &GameState) {
    let started = if record.game_has_started {
        "yes".green().bold().to_string()
    } else {
        "no".red().bold().to_string()
    };
    println!("  started:      {started}");

    for flag in &CHAIN[1..] {
        let label = format!("{flag}:");
        let value = if record.flag(*flag) {
            "done".green().to_string()
        } else if can_enable(record, *flag) {
            "pending".yellow().to_string()
        } else {
            format!("{} {}", "locked".bright_black(), lock_reason(record, *flag))
        };
        println!("  {label:<13} {value}");
    }

    println!(
        "  progress:     {}% ({}/{} checkpoints)",
        progress(record),
        completed_checkpoints(record),
        CHECKPOINT_COUNT,
    );
}

/// Human reason why a checkpoint control is disabled.
pub(crate) fn lock_reason(record: &GameState, flag: Flag) -> String {
    let missing = CHAIN
        .iter()
        .take_while(|f| **f != flag)
        .find(|prerequisite| !record.flag(**prerequisite));
    match missing {
        Some(Flag::GameStarted) => "(start the game first)".bright_black().to_string(),
        Some(prerequisite) => format!("(complete {prerequisite} first)")
            .bright_black()
            .to_string(),
        None => String::new(),
    }
}
