//! `gamectl start` / `gamectl stop` — flip the started flag.

use anyhow::{Context, Result};
use clap::Args;

use gamectl_core::Flag;

use crate::commands::{print_notifications, render_record, runtime, synchronizer};

/// Arguments for `gamectl start`.
#[derive(Args, Debug)]
pub struct StartArgs {}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        set_started(true)
    }
}

/// Arguments for `gamectl stop`.
#[derive(Args, Debug)]
pub struct StopArgs {}

impl StopArgs {
    pub fn run(self) -> Result<()> {
        // Stopping cascades: every checkpoint is cleared in the same write.
        set_started(false)
    }
}

fn set_started(value: bool) -> Result<()> {
    let mut sync = synchronizer()?;
    let runtime = runtime()?;
    runtime
        .block_on(sync.load())
        .context("failed to load game state")?;

    let result = runtime.block_on(sync.request_change(Flag::GameStarted, value));
    print_notifications(&mut sync);
    let record = result.context("failed to update game state")?;
    render_record(&record);
    Ok(())
}
