//! Dependency policy engine.
//!
//! The four flags form one dependency chain:
//! `started → checkpoint1 → checkpoint2 → checkpoint3`. Clearing a flag
//! clears everything after it; setting a flag forces nothing. Which
//! controls a view may offer is a separate, advisory predicate
//! ([`can_enable`]) — the write path never re-validates it.

use crate::types::{Flag, GameState, WriteSet};

/// Dependency order of the mutable flags. Each entry requires every
/// earlier entry to be true before it may be completed.
pub const CHAIN: [Flag; 4] = [
    Flag::GameStarted,
    Flag::Checkpoint1,
    Flag::Checkpoint2,
    Flag::Checkpoint3,
];

/// Number of checkpoint flags in the chain.
pub const CHECKPOINT_COUNT: usize = CHAIN.len() - 1;

/// Which flags a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Clear the three checkpoint flags, leave the started flag alone.
    Checkpoints,
    /// Clear every flag, started included.
    Full,
}

fn chain_index(flag: Flag) -> usize {
    CHAIN
        .iter()
        .position(|f| *f == flag)
        .unwrap_or_else(|| unreachable!("flag {flag} missing from CHAIN"))
}

/// Expand a requested assignment into the minimal write-set that keeps the
/// chain consistent.
///
/// Setting a flag false also clears every flag after it in [`CHAIN`].
/// Setting a flag true touches only that flag: the true direction is
/// intentionally unguarded, callers gate it with [`can_enable`].
pub fn write_set_for(flag: Flag, value: bool) -> WriteSet {
    let mut set = WriteSet::default();
    set.set(flag, value);
    if !value {
        for dependent in &CHAIN[chain_index(flag) + 1..] {
            set.set(*dependent, false);
        }
    }
    set
}

/// The fixed write-set a reset sends, independent of current values.
pub fn reset_write_set(scope: ResetScope) -> WriteSet {
    let mut set = WriteSet::default();
    if matches!(scope, ResetScope::Full) {
        set.set(Flag::GameStarted, false);
    }
    for checkpoint in &CHAIN[1..] {
        set.set(*checkpoint, false);
    }
    set
}

/// Enablement predicate: may the view offer toggling `flag` to true?
///
/// True iff every flag earlier in the chain is currently true. The started
/// flag has no prerequisite. Advisory only — see [`write_set_for`].
pub fn can_enable(state: &GameState, flag: Flag) -> bool {
    CHAIN[..chain_index(flag)]
        .iter()
        .all(|prerequisite| state.flag(*prerequisite))
}

/// Count of completed checkpoints (the started flag does not count).
pub fn completed_checkpoints(state: &GameState) -> usize {
    CHAIN[1..]
        .iter()
        .filter(|checkpoint| state.flag(**checkpoint))
        .count()
}

/// Progress percentage shown by the view: rounded share of completed
/// checkpoints when the game has started, 0 otherwise.
pub fn progress(state: &GameState) -> u8 {
    if !state.game_has_started {
        return 0;
    }
    let completed = completed_checkpoints(state) as f64;
    ((completed / CHECKPOINT_COUNT as f64) * 100.0).round() as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn state(started: bool, cp1: bool, cp2: bool, cp3: bool) -> GameState {
        GameState {
            id: RecordId(1),
            game_has_started: started,
            checkpoint1_has_completed: cp1,
            checkpoint2_has_completed: cp2,
            checkpoint3_has_completed: cp3,
        }
    }

    #[test]
    fn clearing_started_clears_every_checkpoint() {
        let set = write_set_for(Flag::GameStarted, false);
        assert_eq!(set.get(Flag::GameStarted), Some(false));
        assert_eq!(set.get(Flag::Checkpoint1), Some(false));
        assert_eq!(set.get(Flag::Checkpoint2), Some(false));
        assert_eq!(set.get(Flag::Checkpoint3), Some(false));
    }

    #[test]
    fn clearing_checkpoint2_clears_only_checkpoint3() {
        let set = write_set_for(Flag::Checkpoint2, false);
        assert_eq!(set.get(Flag::GameStarted), None);
        assert_eq!(set.get(Flag::Checkpoint1), None);
        assert_eq!(set.get(Flag::Checkpoint2), Some(false));
        assert_eq!(set.get(Flag::Checkpoint3), Some(false));
    }

    #[test]
    fn setting_true_touches_exactly_one_field() {
        for flag in CHAIN {
            let set = write_set_for(flag, true);
            let touched: Vec<_> = set.fields().collect();
            assert_eq!(touched, vec![(flag, true)]);
        }
    }

    #[test]
    fn starting_from_scratch_enables_only_checkpoint1() {
        let set = write_set_for(Flag::GameStarted, true);
        let next = set.apply(&state(false, false, false, false));

        assert!(next.game_has_started);
        assert!(can_enable(&next, Flag::Checkpoint1));
        assert!(!can_enable(&next, Flag::Checkpoint2));
        assert!(!can_enable(&next, Flag::Checkpoint3));
    }

    #[test]
    fn undoing_checkpoint1_zeroes_progress() {
        let all_done = state(true, true, true, true);
        let set = write_set_for(Flag::Checkpoint1, false);
        let next = set.apply(&all_done);

        assert!(next.game_has_started);
        assert!(!next.checkpoint1_has_completed);
        assert!(!next.checkpoint2_has_completed);
        assert!(!next.checkpoint3_has_completed);
        assert_eq!(progress(&next), 0);
    }

    #[test]
    fn reset_checkpoints_leaves_started_untouched() {
        let set = reset_write_set(ResetScope::Checkpoints);
        let next = set.apply(&state(true, true, true, false));
        assert!(next.game_has_started);
        assert_eq!(completed_checkpoints(&next), 0);
    }

    #[test]
    fn reset_full_clears_everything() {
        let set = reset_write_set(ResetScope::Full);
        let next = set.apply(&state(true, true, true, true));
        assert!(!next.game_has_started);
        assert_eq!(completed_checkpoints(&next), 0);
        assert!(next.satisfies_dependency_chain());
    }

    #[test]
    fn progress_is_zero_until_started_regardless_of_checkpoints() {
        // An out-of-order record (possible for callers bypassing the view)
        // still reports 0 until the game starts.
        assert_eq!(progress(&state(false, true, true, true)), 0);
        assert_eq!(progress(&state(false, false, false, false)), 0);
    }

    #[test]
    fn progress_steps() {
        assert_eq!(progress(&state(true, false, false, false)), 0);
        assert_eq!(progress(&state(true, true, false, false)), 33);
        assert_eq!(progress(&state(true, true, true, false)), 67);
        assert_eq!(progress(&state(true, true, true, true)), 100);
    }
}
