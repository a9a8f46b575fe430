//! Durable key-value storage backing the alias cache.

mod file;
mod memory;
mod traits;

pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::{KeyValueStore, StorageError};
