//! `gamectl status` / `gamectl refresh` — load and display the record.

use anyhow::{Context, Result};
use clap::Args;

use crate::commands::{print_notifications, render_record, runtime, synchronizer};

/// Arguments for `gamectl status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit the raw record as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let mut sync = synchronizer()?;
        let record = runtime()?
            .block_on(sync.load())
            .context("failed to load game state")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("failed to render record JSON")?
            );
            return Ok(());
        }

        print_notifications(&mut sync);
        render_record(&record);
        Ok(())
    }
}

/// Arguments for `gamectl refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {}

impl RefreshArgs {
    pub fn run(self) -> Result<()> {
        let mut sync = synchronizer()?;
        let record = runtime()?
            .block_on(sync.load())
            .context("failed to refresh game state")?;

        print_notifications(&mut sync);
        println!("refreshed from store");
        render_record(&record);
        Ok(())
    }
}
