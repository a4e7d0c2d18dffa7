use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::error::DatabaseError;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use stubby_core::error::{Result, StorageError};
use stubby_core::repository::{ReadRepository, Repository, UrlRecord};
use stubby_core::{Alias, Context};

const SCHEMA: &str = include_str!("../ddl/sqlite/url_records.sql");

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of the repository contract.
///
/// Alias uniqueness is enforced by the `UNIQUE` constraint on
/// `url_records.alias`, so every insert is a single constrained statement.
/// Deletes are hard deletes and free the alias for reuse. `AUTOINCREMENT`
/// keeps ids from ever being reused, even after the newest row is deleted.
///
/// Writes run inside a transaction that is committed only if the caller's
/// context is still live once the statement returns. A statement abandoned
/// mid-flight keeps running on the connection's worker thread, but the
/// rollback queued by the dropped transaction runs right after it.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool for `database_url`, creating the database
    /// file if it does not exist.
    ///
    /// Connections use WAL journaling and a busy timeout so that concurrent
    /// writers queue up instead of failing with `SQLITE_BUSY`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(map_sqlx_error)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `url_records` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Primary SQLite result codes. Extended codes keep them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_NOMEM: i32 = 7;
const SQLITE_READONLY: i32 = 8;
const SQLITE_IOERR: i32 = 10;
const SQLITE_CORRUPT: i32 = 11;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_NOTADB: i32 = 26;

fn primary_code(err: &dyn DatabaseError) -> Option<i32> {
    err.code()?.parse::<i32>().ok().map(|code| code & 0xff)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::Database(db) => match primary_code(db.as_ref()) {
            // lock not released within the busy timeout, or the disk is
            // unusable: the store cannot take writes right now
            Some(
                SQLITE_BUSY | SQLITE_LOCKED | SQLITE_FULL | SQLITE_IOERR | SQLITE_CANTOPEN
                | SQLITE_READONLY | SQLITE_NOMEM,
            ) => StorageError::Unavailable(message),
            Some(SQLITE_CORRUPT | SQLITE_NOTADB) => StorageError::InvalidData(message),
            _ => StorageError::Query(message),
        },
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        sqlx::Error::Configuration(_) => StorageError::Operation(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, alias: &Alias) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, alias, target
            FROM url_records
            WHERE alias = ?
            LIMIT 1
            "#,
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let stored_alias: String = row.try_get("alias").map_err(map_sqlx_error)?;
        let target: String = row.try_get("target").map_err(map_sqlx_error)?;

        Ok(Some(UrlRecord {
            id,
            alias: Alias::new_unchecked(stored_alias),
            target,
        }))
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert(&self, ctx: &Context, alias: &Alias, target: &str) -> Result<i64> {
        let mut tx = ctx.run(self.pool.begin()).await?.map_err(map_sqlx_error)?;

        let result = ctx
            .run(
                sqlx::query(
                    r#"
                    INSERT INTO url_records (alias, target)
                    VALUES (?, ?)
                    "#,
                )
                .bind(alias.as_str())
                .bind(target)
                .execute(&mut *tx),
            )
            .await?;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(alias.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        ctx.check()?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(id)
    }

    async fn delete(&self, ctx: &Context, alias: &Alias) -> Result<u64> {
        let mut tx = ctx.run(self.pool.begin()).await?.map_err(map_sqlx_error)?;

        let result = ctx
            .run(
                sqlx::query(
                    r#"
                    DELETE FROM url_records
                    WHERE alias = ?
                    "#,
                )
                .bind(alias.as_str())
                .execute(&mut *tx),
            )
            .await?
            .map_err(map_sqlx_error)?;

        ctx.check()?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}
