//! gamectl state synchronizer.
//!
//! Owns the client-side cached copy of the singleton record and keeps it
//! consistent with the remote store:
//! - [`synchronizer`] — [`Synchronizer`], load / change / reset / merge
//! - [`view`] — [`ViewState`] machine and operator [`Notification`]s
//! - [`error`] — [`SyncError`]

pub mod error;
pub mod synchronizer;
pub mod view;

pub use error::SyncError;
pub use synchronizer::Synchronizer;
pub use view::{Notification, ViewState};
