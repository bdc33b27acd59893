//! gamectl core library — domain types and the dependency policy engine.
//!
//! Public API surface:
//! - [`types`] — record, flags, write-sets
//! - [`policy`] — cascade expansion, enablement, progress
//! - [`error`] — [`FlagParseError`]

pub mod error;
pub mod policy;
pub mod types;

pub use error::FlagParseError;
pub use policy::{ResetScope, CHAIN, CHECKPOINT_COUNT};
pub use types::{Flag, GameState, RecordId, WriteSet};
