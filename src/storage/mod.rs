//! Storage backends for tristore
//!
//! Backends implement the `TripleStore` trait. `SqliteStore` persists to a
//! single SQLite file; `MemoryStore` keeps everything in process memory.

mod cancel;
mod memory;
mod sqlite;
mod traits;

pub use cancel::{CallContext, CancellationToken};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DEFAULT_BATCH_SIZE};
pub use traits::{OpenStore, OrderBy, Overrides, StorageError, StorageResult, TripleOptions, TripleStore};
