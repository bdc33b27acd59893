//! `gamectl daemon` — store daemon lifecycle.

use anyhow::{Context, Result};
use clap::Subcommand;

use gamectl_daemon::paths::socket_path;
use gamectl_daemon::runtime::start_blocking;
use gamectl_store::{SocketStore, StoreError};

use crate::commands::runtime;

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run the store daemon in the foreground (socket server + watcher).
    Start,
    /// Request graceful daemon shutdown over the unix socket.
    Stop,
    /// Query daemon runtime status over the unix socket.
    Status,
}

pub fn run(command: DaemonCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let store = SocketStore::new(socket_path(&home));

    match command {
        DaemonCommand::Start => {
            start_blocking(&home).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match runtime()?.block_on(store.stop()) {
            Ok(()) => println!("daemon stop requested"),
            Err(StoreError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => match runtime()?.block_on(store.wait_for_status()) {
            Ok(status) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&status)
                        .context("failed to render daemon status JSON")?
                );
            }
            Err(StoreError::DaemonNotRunning { .. }) => {
                let payload = serde_json::json!({
                    "running": false,
                    "socket": socket_path(&home).display().to_string(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&payload)
                        .context("failed to render daemon status JSON")?
                );
            }
            Err(err) => return Err(err).context("failed to query daemon status"),
        },
    }

    Ok(())
}
