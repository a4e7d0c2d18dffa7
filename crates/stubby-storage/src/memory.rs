use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use stubby_core::error::{Result, StorageError};
use stubby_core::repository::{ReadRepository, Repository, UrlRecord};
use stubby_core::{Alias, Context};

#[derive(Debug, Clone)]
struct Entry {
    id: i64,
    target: String,
}

/// In-memory implementation of the repository contract using DashMap.
///
/// Inserts go through DashMap's entry API, which holds the shard lock for
/// the alias while checking and inserting, so two concurrent inserts of the
/// same alias cannot both succeed. Ids are drawn only after the alias was
/// found vacant, so a conflicting insert does not consume one.
///
/// Writes complete synchronously once started, so the context is only
/// checked before touching the map.
#[derive(Debug)]
pub struct InMemoryRepository {
    storage: DashMap<String, Entry>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, alias: &Alias) -> Result<Option<UrlRecord>> {
        Ok(self.storage.get(alias.as_str()).map(|entry| UrlRecord {
            id: entry.id,
            alias: alias.clone(),
            target: entry.target.clone(),
        }))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, ctx: &Context, alias: &Alias, target: &str) -> Result<i64> {
        ctx.check()?;

        match self.storage.entry(alias.as_str().to_owned()) {
            MapEntry::Occupied(_) => Err(StorageError::Conflict(alias.to_string())),
            MapEntry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                slot.insert(Entry {
                    id,
                    target: target.to_owned(),
                });
                Ok(id)
            }
        }
    }

    async fn delete(&self, ctx: &Context, alias: &Alias) -> Result<u64> {
        ctx.check()?;

        Ok(u64::from(self.storage.remove(alias.as_str()).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn alias(s: &str) -> Alias {
        Alias::new_unchecked(s)
    }

    fn ctx() -> Context {
        Context::background()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryRepository::new();

        let id = repo
            .insert(&ctx(), &alias("abc123"), "https://example.com")
            .await
            .unwrap();

        let record = repo.get(&alias("abc123")).await.unwrap().unwrap();
        assert_eq!(id, 1);
        assert_eq!(record.id, 1);
        assert_eq!(record.alias.as_str(), "abc123");
        assert_eq!(record.target, "https://example.com");
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();

        assert!(repo.get(&alias("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_conflict_keeps_first_target() {
        let repo = InMemoryRepository::new();

        repo.insert(&ctx(), &alias("abc123"), "https://example.com")
            .await
            .unwrap();

        let err = repo
            .insert(&ctx(), &alias("abc123"), "https://other.com")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        let record = repo.get(&alias("abc123")).await.unwrap().unwrap();
        assert_eq!(record.target, "https://example.com");
    }

    #[tokio::test]
    async fn conflict_does_not_consume_an_id() {
        let repo = InMemoryRepository::new();

        repo.insert(&ctx(), &alias("a"), "https://a.example").await.unwrap();
        repo.insert(&ctx(), &alias("a"), "https://a.example").await.unwrap_err();
        let id = repo.insert(&ctx(), &alias("b"), "https://b.example").await.unwrap();

        assert_eq!(id, 2);
    }

    #[tokio::test]
    async fn duplicate_targets_are_allowed() {
        let repo = InMemoryRepository::new();

        repo.insert(&ctx(), &alias("one"), "https://example.com").await.unwrap();
        repo.insert(&ctx(), &alias("two"), "https://example.com").await.unwrap();

        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_rows_affected() {
        let repo = InMemoryRepository::new();

        repo.insert(&ctx(), &alias("abc123"), "https://example.com")
            .await
            .unwrap();

        assert_eq!(repo.delete(&ctx(), &alias("abc123")).await.unwrap(), 1);
        assert!(repo.get(&alias("abc123")).await.unwrap().is_none());
        assert_eq!(repo.delete(&ctx(), &alias("abc123")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn alias_is_reusable_with_a_fresh_id() {
        let repo = InMemoryRepository::new();

        let first = repo.insert(&ctx(), &alias("abc"), "https://old.com").await.unwrap();
        repo.delete(&ctx(), &alias("abc")).await.unwrap();
        let second = repo.insert(&ctx(), &alias("abc"), "https://new.com").await.unwrap();

        assert!(second > first);
        let record = repo.get(&alias("abc")).await.unwrap().unwrap();
        assert_eq!(record.target, "https://new.com");
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_alias_have_a_single_winner() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..32u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(&ctx(), &alias("contended"), &format!("https://example{i}.com"))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(err) => assert!(matches!(err, StorageError::Conflict(_))),
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn interrupted_writes_leave_the_map_untouched() {
        let repo = InMemoryRepository::new();
        repo.insert(&ctx(), &alias("kept"), "https://example.com")
            .await
            .unwrap();

        let (cancelled, handle) = Context::background().with_cancel();
        handle.cancel();

        let err = repo
            .insert(&cancelled, &alias("fresh"), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Interrupted(_)));

        let err = repo.delete(&cancelled, &alias("kept")).await.unwrap_err();
        assert!(matches!(err, StorageError::Interrupted(_)));

        assert_eq!(repo.len(), 1);
        assert!(repo.get(&alias("fresh")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_access() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let a = Alias::new_unchecked(format!("code{:03}", i));
                repo.insert(&ctx(), &a, &format!("https://example{}.com", i))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 10);

        for i in 0..10u64 {
            let a = Alias::new_unchecked(format!("code{:03}", i));
            let record = repo.get(&a).await.unwrap().unwrap();
            assert_eq!(record.target, format!("https://example{}.com", i));
        }
    }
}
