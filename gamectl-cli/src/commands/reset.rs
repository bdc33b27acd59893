//! `gamectl reset` — zero the checkpoint flags behind a confirmation.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use gamectl_core::ResetScope;

use crate::commands::{print_notifications, render_record, runtime, synchronizer};

/// Arguments for `gamectl reset`.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Also clear the started flag.
    #[arg(long)]
    pub all: bool,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ResetArgs {
    pub fn run(self) -> Result<()> {
        let scope = if self.all {
            ResetScope::Full
        } else {
            ResetScope::Checkpoints
        };

        if !self.yes && !confirm(scope)? {
            println!("reset cancelled");
            return Ok(());
        }

        let mut sync = synchronizer()?;
        let runtime = runtime()?;
        runtime
            .block_on(sync.load())
            .context("failed to load game state")?;

        let result = runtime.block_on(sync.reset(scope));
        print_notifications(&mut sync);
        let record = result.context("failed to reset checkpoints")?;
        render_record(&record);
        Ok(())
    }
}

fn confirm(scope: ResetScope) -> Result<bool> {
    let question = match scope {
        ResetScope::Checkpoints => "Reset all checkpoints?",
        ResetScope::Full => "Reset all checkpoints and the started flag?",
    };
    print!("{question} [y/N] ");
    std::io::stdout().flush().context("flush prompt")?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
