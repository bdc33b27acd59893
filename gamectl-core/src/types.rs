//! Domain types for the gamectl singleton record.
//!
//! Serialized field names match the store's column names
//! (`game_has_started`, `checkpoint<N>_has_completed`); never rename them
//! without migrating the persisted row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FlagParseError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Store-assigned key of the singleton record. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// One of the four mutable boolean columns of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "game_has_started")]
    GameStarted,
    #[serde(rename = "checkpoint1_has_completed")]
    Checkpoint1,
    #[serde(rename = "checkpoint2_has_completed")]
    Checkpoint2,
    #[serde(rename = "checkpoint3_has_completed")]
    Checkpoint3,
}

impl Flag {
    /// Checkpoint number (1..=3), or `None` for the started flag.
    pub fn checkpoint_number(self) -> Option<u8> {
        match self {
            Flag::GameStarted => None,
            Flag::Checkpoint1 => Some(1),
            Flag::Checkpoint2 => Some(2),
            Flag::Checkpoint3 => Some(3),
        }
    }

    /// Column name as persisted by the store.
    pub fn column(self) -> &'static str {
        match self {
            Flag::GameStarted => "game_has_started",
            Flag::Checkpoint1 => "checkpoint1_has_completed",
            Flag::Checkpoint2 => "checkpoint2_has_completed",
            Flag::Checkpoint3 => "checkpoint3_has_completed",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::GameStarted => write!(f, "started"),
            Flag::Checkpoint1 => write!(f, "checkpoint1"),
            Flag::Checkpoint2 => write!(f, "checkpoint2"),
            Flag::Checkpoint3 => write!(f, "checkpoint3"),
        }
    }
}

impl FromStr for Flag {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "started" | "game" | "game_has_started" => Ok(Flag::GameStarted),
            "checkpoint1" | "cp1" | "checkpoint1_has_completed" => Ok(Flag::Checkpoint1),
            "checkpoint2" | "cp2" | "checkpoint2_has_completed" => Ok(Flag::Checkpoint2),
            "checkpoint3" | "cp3" | "checkpoint3_has_completed" => Ok(Flag::Checkpoint3),
            other => Err(FlagParseError {
                input: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The singleton game-state row.
///
/// Created exactly once (lazily, all flags false), never deleted, mutated
/// only through [`WriteSet`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub id: RecordId,
    pub game_has_started: bool,
    pub checkpoint1_has_completed: bool,
    pub checkpoint2_has_completed: bool,
    pub checkpoint3_has_completed: bool,
}

impl GameState {
    /// A fresh record with every flag false, as created by the store.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            game_has_started: false,
            checkpoint1_has_completed: false,
            checkpoint2_has_completed: false,
            checkpoint3_has_completed: false,
        }
    }

    /// Current value of a flag.
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::GameStarted => self.game_has_started,
            Flag::Checkpoint1 => self.checkpoint1_has_completed,
            Flag::Checkpoint2 => self.checkpoint2_has_completed,
            Flag::Checkpoint3 => self.checkpoint3_has_completed,
        }
    }

    fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::GameStarted => self.game_has_started = value,
            Flag::Checkpoint1 => self.checkpoint1_has_completed = value,
            Flag::Checkpoint2 => self.checkpoint2_has_completed = value,
            Flag::Checkpoint3 => self.checkpoint3_has_completed = value,
        }
    }

    /// True when the completed checkpoints form a prefix of (1,2,3) and
    /// are empty unless the game has started.
    pub fn satisfies_dependency_chain(&self) -> bool {
        let chain = [
            self.game_has_started,
            self.checkpoint1_has_completed,
            self.checkpoint2_has_completed,
            self.checkpoint3_has_completed,
        ];
        chain.windows(2).all(|pair| pair[0] || !pair[1])
    }
}

// ---------------------------------------------------------------------------
// Write-sets
// ---------------------------------------------------------------------------

/// Partial record: exactly the fields one operation changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_has_started: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint1_has_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint2_has_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint3_has_completed: Option<bool>,
}

impl WriteSet {
    /// Requested value for a flag, if this write-set touches it.
    pub fn get(&self, flag: Flag) -> Option<bool> {
        match flag {
            Flag::GameStarted => self.game_has_started,
            Flag::Checkpoint1 => self.checkpoint1_has_completed,
            Flag::Checkpoint2 => self.checkpoint2_has_completed,
            Flag::Checkpoint3 => self.checkpoint3_has_completed,
        }
    }

    /// Record `flag = value` in this write-set.
    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::GameStarted => self.game_has_started = Some(value),
            Flag::Checkpoint1 => self.checkpoint1_has_completed = Some(value),
            Flag::Checkpoint2 => self.checkpoint2_has_completed = Some(value),
            Flag::Checkpoint3 => self.checkpoint3_has_completed = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Touched fields in chain order.
    pub fn fields(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        crate::policy::CHAIN
            .iter()
            .filter_map(|flag| self.get(*flag).map(|value| (*flag, value)))
    }

    /// Apply this write-set to a record, returning the updated record.
    /// Untouched fields carry over; the id never changes.
    pub fn apply(&self, state: &GameState) -> GameState {
        let mut next = *state;
        for (flag, value) in self.fields() {
            next.set_flag(flag, value);
        }
        next
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
