use crate::alias::Alias;
use crate::context::Context;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored URL mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Surrogate key assigned by the store. Never reused.
    pub id: i64,
    pub alias: Alias,
    /// The long URL the alias resolves to.
    pub target: String,
}

/// A read-only view of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record for a given alias.
    /// Returns `None` if the alias does not exist.
    async fn get(&self, alias: &Alias) -> Result<Option<UrlRecord>>;
}

/// Persistent alias -> target mapping.
///
/// Implementations must enforce alias uniqueness atomically: of two
/// concurrent inserts for the same alias exactly one succeeds and the other
/// returns [`StorageError::Conflict`](crate::StorageError::Conflict).
///
/// Writes take the caller's [`Context`]. If it is cancelled or expires
/// before the write is committed, the write must leave no trace and return
/// [`StorageError::Interrupted`](crate::StorageError::Interrupted).
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record and returns its id.
    /// Returns `Err(Conflict)` if the alias already exists.
    async fn insert(&self, ctx: &Context, alias: &Alias, target: &str) -> Result<i64>;

    /// Deletes the record for a given alias.
    /// Returns the number of removed records, `0` if there was none.
    async fn delete(&self, ctx: &Context, alias: &Alias) -> Result<u64>;
}
