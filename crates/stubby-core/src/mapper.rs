use crate::alias::Alias;
use crate::context::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::MappingError>;

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedMapping {
    /// Surrogate id of the new record.
    pub id: i64,
    /// The alias the target is now reachable under.
    pub alias: Alias,
}

/// The interface a collaborator (such as an HTTP layer) uses to drive the
/// URL store.
#[async_trait]
pub trait UrlMapper: Send + Sync + 'static {
    /// Stores `target` under `desired_alias`, or under a generated alias when
    /// none is given.
    async fn create_mapping(
        &self,
        ctx: &Context,
        target: &str,
        desired_alias: Option<Alias>,
    ) -> Result<CreatedMapping>;

    /// Resolves an alias to its target.
    /// Fails with `AliasNotFound` if the alias does not exist.
    async fn resolve_mapping(&self, ctx: &Context, alias: &Alias) -> Result<String>;

    /// Deletes a mapping by alias.
    /// Returns `true` if the mapping existed and was removed.
    async fn delete_mapping(&self, ctx: &Context, alias: &Alias) -> Result<bool>;
}
