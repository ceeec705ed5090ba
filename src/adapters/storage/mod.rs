//! Storage Adapters
//!
//! Implementations of the LocalStore port for persisting guest snapshots.
//!
//! ## Available Adapters
//!
//! - **FileLocalStore** - One JSON file per key on disk
//! - **InMemoryLocalStore** - Values kept in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileLocalStore, InMemoryLocalStore};
//!
//! // Production: file-based storage
//! let store = FileLocalStore::new("./data/storefront");
//!
//! // Testing: in-memory storage
//! let store = InMemoryLocalStore::new();
//! ```

mod file_local_store;
mod in_memory_local_store;

pub use file_local_store::FileLocalStore;
pub use in_memory_local_store::InMemoryLocalStore;
