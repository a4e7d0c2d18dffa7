use async_trait::async_trait;
use std::sync::Arc;
use stubby_core::{
    Alias, Context, CreatedMapping, MappingError, Repository, StorageError, UrlMapper,
};
use stubby_generator::Generator;
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, MappingError>;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone, TypedBuilder)]
pub struct StoreSettings {
    /// How many generated candidates `create` tries before giving up.
    /// Values below one are raised to one.
    #[builder(default = DEFAULT_MAX_ATTEMPTS, setter(transform = |attempts: u32| attempts.max(1)))]
    pub max_attempts: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The URL store.
///
/// Wraps a [`Repository`] and a [`Generator`] and handles:
/// - alias assignment, with a bounded retry loop when a generated alias
///   collides with an existing one
/// - translation of storage failures into [`MappingError`]
/// - the caller's deadline and cancellation signal
///
/// Uniqueness is left entirely to the repository's atomic insert; the
/// service never checks for an alias before inserting it. Writes hand the
/// context to the repository so an interrupted write is never committed.
#[derive(Debug)]
pub struct UrlStoreService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: StoreSettings,
}

impl<R, G> Clone for UrlStoreService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            settings: self.settings.clone(),
        }
    }
}

impl<R: Repository, G: Generator> UrlStoreService<R, G> {
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, StoreSettings::default())
    }

    pub fn with_settings(repository: R, generator: G, settings: StoreSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Stores `target` and returns the id and alias it was stored under.
    ///
    /// With an explicit `alias` a single insert is attempted and a taken
    /// alias fails with [`MappingError::AliasExists`]. Without one, generated
    /// candidates are tried until one is free or `max_attempts` is used up,
    /// which fails with [`MappingError::AliasExhausted`].
    pub async fn create(
        &self,
        ctx: &Context,
        target: &str,
        alias: Option<Alias>,
    ) -> Result<CreatedMapping> {
        if target.trim().is_empty() {
            return Err(MappingError::InvalidTarget(
                "target cannot be empty".to_string(),
            ));
        }

        let Some(alias) = alias else {
            return self.create_generated(ctx, target).await;
        };

        match self.repository.insert(ctx, &alias, target).await {
            Ok(id) => Ok(CreatedMapping { id, alias }),
            Err(StorageError::Conflict(_)) => Err(MappingError::AliasExists(alias.into_string())),
            Err(other) => Err(other.into()),
        }
    }

    async fn create_generated(&self, ctx: &Context, target: &str) -> Result<CreatedMapping> {
        let attempts = self.settings.max_attempts.max(1);

        for _ in 0..attempts {
            ctx.check()?;
            let candidate: Alias = self.generator.generate().into();

            match self.repository.insert(ctx, &candidate, target).await {
                Ok(id) => {
                    return Ok(CreatedMapping {
                        id,
                        alias: candidate,
                    })
                }
                // collision with a live alias, draw again
                Err(StorageError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(MappingError::AliasExhausted { attempts })
    }

    /// Returns the target stored under `alias`.
    pub async fn resolve(&self, ctx: &Context, alias: &Alias) -> Result<String> {
        match ctx.run(self.repository.get(alias)).await?? {
            Some(record) => Ok(record.target),
            None => Err(MappingError::AliasNotFound(alias.to_string())),
        }
    }

    /// Removes the mapping for `alias` and returns the number of removed
    /// records. Deleting an unknown alias is not an error and returns `0`.
    pub async fn delete(&self, ctx: &Context, alias: &Alias) -> Result<u64> {
        Ok(self.repository.delete(ctx, alias).await?)
    }
}

#[async_trait]
impl<R: Repository, G: Generator> UrlMapper for UrlStoreService<R, G> {
    async fn create_mapping(
        &self,
        ctx: &Context,
        target: &str,
        desired_alias: Option<Alias>,
    ) -> Result<CreatedMapping> {
        self.create(ctx, target, desired_alias).await
    }

    async fn resolve_mapping(&self, ctx: &Context, alias: &Alias) -> Result<String> {
        self.resolve(ctx, alias).await
    }

    async fn delete_mapping(&self, ctx: &Context, alias: &Alias) -> Result<bool> {
        Ok(self.delete(ctx, alias).await? > 0)
    }
}
