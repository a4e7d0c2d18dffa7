pub mod error;
pub mod random;

pub use error::Error;
pub use random::{EntropySource, RandomAliasGenerator, RandomAliasSettings};

use stubby_core::Alias;

/// Trait for producing candidate aliases.
///
/// Implementations are pure generators that don't interact with storage.
/// Candidates are not guaranteed to be unique; the store detects collisions
/// and asks again.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<Alias>;

    /// Produces the next candidate alias.
    fn generate(&self) -> Self::Output;
}
