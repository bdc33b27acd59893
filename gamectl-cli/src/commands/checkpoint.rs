//! `gamectl checkpoint` — complete or undo a checkpoint.
//!
//! Completion is gated here, in the view: the write path itself does not
//! re-validate the dependency chain.

use anyhow::{bail, Context, Result};
use clap::Args;

use gamectl_core::policy::can_enable;
use gamectl_core::Flag;

use crate::commands::{lock_reason, print_notifications, render_record, runtime, synchronizer};

/// Arguments for `gamectl checkpoint`.
#[derive(Args, Debug)]
pub struct CheckpointArgs {
    /// Checkpoint number (1, 2 or 3).
    #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
    pub number: u8,

    /// Mark the checkpoint as not completed (clears later checkpoints).
    #[arg(long)]
    pub undo: bool,
}

impl CheckpointArgs {
    pub fn run(self) -> Result<()> {
        let flag = match self.number {
            1 => Flag::Checkpoint1,
            2 => Flag::Checkpoint2,
            3 => Flag::Checkpoint3,
            other => bail!("checkpoint number out of range: {other}"),
        };

        let mut sync = synchronizer()?;
        let runtime = runtime()?;
        let record = runtime
            .block_on(sync.load())
            .context("failed to load game state")?;

        if !self.undo && !can_enable(&record, flag) {
            bail!("{flag} is locked {}", lock_reason(&record, flag));
        }

        let result = runtime.block_on(sync.request_change(flag, !self.undo));
        print_notifications(&mut sync);
        let record = result.with_context(|| format!("failed to update {flag}"))?;
        render_record(&record);
        Ok(())
    }
}
