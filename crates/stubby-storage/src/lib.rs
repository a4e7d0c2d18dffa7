//! Storage backends for the URL store.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;
pub use stubby_core::error::Result;
pub use stubby_core::{ReadRepository, Repository, StorageError, UrlRecord};
