//! gamectl store seam — the generic query/subscribe interface over the
//! singleton game-state row, plus its two backends.
//!
//! - [`store`] — [`GlobalsStore`] trait and [`ChangeFeed`]
//! - [`protocol`] — JSON-line wire types shared with the daemon
//! - [`socket`] — [`SocketStore`], client for the daemon socket
//! - [`memory`] — [`MemoryStore`], in-memory backend for tests/embedding
//! - [`error`] — [`StoreError`]

pub mod error;
pub mod memory;
pub mod protocol;
pub mod socket;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use protocol::{StoreEvent, StoreRequest, StoreResponse};
pub use socket::SocketStore;
pub use store::{ChangeFeed, GlobalsStore, FEED_BUFFER};
