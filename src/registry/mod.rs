//! Registry layer: entity records, the read contract, an in-memory
//! implementation, and the readiness wait.

pub mod entity;
pub mod memory;
pub mod readiness;
pub mod traits;

pub use entity::RegistryEntity;
pub use memory::InMemoryRegistry;
pub use readiness::{wait_for_registry, Readiness};
pub use traits::Registry;
