//! gamectl store daemon — the service holding the singleton game-state
//! row for every operator client.
//!
//! - [`runtime`] — socket server, update fan-out, record-file watcher
//! - [`record`] — YAML persistence of the row
//! - [`paths`] — `~/.gamectl/` layout
//! - [`error`] — [`DaemonError`]

pub mod error;
pub mod paths;
pub mod record;
pub mod runtime;

pub use error::DaemonError;
pub use record::{RecordFile, SINGLETON_ID};
