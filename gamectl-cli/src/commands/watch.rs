//! `gamectl watch` — follow live row images pushed by the store.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::commands::{render_record, runtime, synchronizer};

/// Arguments for `gamectl watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let mut sync = synchronizer()?;
        let runtime = runtime()?;

        runtime.block_on(async {
            let record = sync.load().await.context("failed to load game state")?;
            println!("{}", "watching for changes (ctrl-c to exit)".bold());
            render_record(&record);

            let mut feed = sync
                .subscribe()
                .await
                .context("failed to subscribe to store changes")?;

            loop {
                tokio::select! {
                    signal = tokio::signal::ctrl_c() => {
                        signal.context("ctrl-c handler failed")?;
                        println!("\nstopped watching");
                        return Ok(());
                    }
                    pushed = feed.next() => {
                        match pushed {
                            Some(record) => {
                                sync.apply_remote(record);
                                println!();
                                println!("{}", "state changed:".bold());
                                render_record(&record);
                            }
                            None => {
                                println!("{}", "store went away; stopping".yellow());
                                return Ok(());
                            }
                        }
                    }
                }
            }
        })
    }
}
