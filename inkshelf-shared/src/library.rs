/// Per-tenant book datastores
///
/// Each [`TenantHandle`] maps to a physically separate SQLite file; there is
/// no cross-tenant query capability. That physical isolation is the
/// access-control boundary, substituting for per-row authorization.
///
/// Stores are opened lazily on first use and cached for the process
/// lifetime, keyed by handle. SQLite allows one writer at a time, so
/// inserts are serialized with a per-handle exclusion lock; reads go
/// straight to the pool (WAL mode allows readers alongside the writer).
///
/// # Example
///
/// ```no_run
/// use inkshelf_shared::library::LibraryStore;
/// use inkshelf_shared::models::BookFields;
/// use inkshelf_shared::registry::TenantHandle;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = LibraryStore::new();
/// let handle = TenantHandle::new("data/lib1.db");
///
/// let record = store.insert(&handle, &BookFields::default(), "42").await?;
/// let total = store.count(&handle).await?;
/// println!("committed {} ({} total)", record.id, total);
/// # Ok(())
/// # }
/// ```

use crate::models::{BookFields, BookRecord};
use crate::registry::TenantHandle;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Datastore errors
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The underlying file or connection cannot be opened or written
    #[error("tenant datastore unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for LibraryError {
    fn from(err: sqlx::Error) -> Self {
        LibraryError::Unavailable(err.to_string())
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Unavailable(err.to_string())
    }
}

/// One open tenant datastore: its pool plus the per-handle write lock
struct TenantDb {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl TenantDb {
    async fn open(handle: &TenantHandle) -> Result<Self, LibraryError> {
        if let Some(parent) = handle.as_path().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite://{}?mode=rwc", handle.as_str());
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await?;

        // WAL keeps readers unblocked while the per-handle lock serializes writers
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                author TEXT NOT NULL,
                title TEXT NOT NULL,
                publication_year INTEGER NOT NULL,
                category TEXT NOT NULL,
                publisher TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::info!(handle = %handle, "opened tenant datastore");

        Ok(TenantDb {
            pool,
            write_lock: Mutex::new(()),
        })
    }
}

/// Registry of open tenant datastores, keyed by handle
pub struct LibraryStore {
    databases: RwLock<HashMap<TenantHandle, Arc<TenantDb>>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        LibraryStore {
            databases: RwLock::new(HashMap::new()),
        }
    }

    /// Opens the datastore for `handle` if needed, creating file and schema.
    ///
    /// Called eagerly when a tenant is registered or selected; every other
    /// operation also opens lazily through the same path.
    pub async fn prepare(&self, handle: &TenantHandle) -> Result<(), LibraryError> {
        self.db(handle).await.map(|_| ())
    }

    async fn db(&self, handle: &TenantHandle) -> Result<Arc<TenantDb>, LibraryError> {
        {
            let databases = self.databases.read().await;
            if let Some(db) = databases.get(handle) {
                return Ok(db.clone());
            }
        }

        let mut databases = self.databases.write().await;
        // Re-check: another task may have opened it while we waited
        if let Some(db) = databases.get(handle) {
            return Ok(db.clone());
        }

        let db = Arc::new(TenantDb::open(handle).await?);
        databases.insert(handle.clone(), db.clone());
        Ok(db)
    }

    /// Appends a committed record to the tenant's datastore.
    pub async fn insert(
        &self,
        handle: &TenantHandle,
        fields: &BookFields,
        user_id: &str,
    ) -> Result<BookRecord, LibraryError> {
        let db = self.db(handle).await?;

        let record = BookRecord {
            id: Uuid::new_v4().to_string(),
            author: fields.author.clone(),
            title: fields.title.clone(),
            publication_year: fields.publication_year,
            category: fields.category.clone(),
            publisher: fields.publisher.clone(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };

        let _write = db.write_lock.lock().await;
        sqlx::query(
            r#"
            INSERT INTO books (id, author, title, publication_year, category, publisher, user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.author)
        .bind(&record.title)
        .bind(record.publication_year)
        .bind(&record.category)
        .bind(&record.publisher)
        .bind(&record.user_id)
        .bind(record.created_at)
        .execute(&db.pool)
        .await?;

        tracing::debug!(handle = %handle, record_id = %record.id, "committed book record");
        Ok(record)
    }

    /// Total committed records for the handle.
    pub async fn count(&self, handle: &TenantHandle) -> Result<i64, LibraryError> {
        let db = self.db(handle).await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&db.pool)
            .await?;
        Ok(count)
    }

    /// Records whose author contains `pattern` (case follows SQLite LIKE).
    pub async fn find_by_author(
        &self,
        handle: &TenantHandle,
        pattern: &str,
    ) -> Result<Vec<BookRecord>, LibraryError> {
        let db = self.db(handle).await?;
        let records = sqlx::query_as::<_, BookRecord>(
            r#"
            SELECT id, author, title, publication_year, category, publisher, user_id, created_at
            FROM books
            WHERE author LIKE ?
            "#,
        )
        .bind(format!("%{}%", pattern))
        .fetch_all(&db.pool)
        .await?;
        Ok(records)
    }

    /// Records with the given publication year.
    pub async fn find_by_year(
        &self,
        handle: &TenantHandle,
        year: i64,
    ) -> Result<Vec<BookRecord>, LibraryError> {
        let db = self.db(handle).await?;
        let records = sqlx::query_as::<_, BookRecord>(
            r#"
            SELECT id, author, title, publication_year, category, publisher, user_id, created_at
            FROM books
            WHERE publication_year = ?
            "#,
        )
        .bind(year)
        .fetch_all(&db.pool)
        .await?;
        Ok(records)
    }

    /// The most recently committed records, newest first.
    pub async fn recent(
        &self,
        handle: &TenantHandle,
        limit: i64,
    ) -> Result<Vec<BookRecord>, LibraryError> {
        let db = self.db(handle).await?;
        let records = sqlx::query_as::<_, BookRecord>(
            r#"
            SELECT id, author, title, publication_year, category, publisher, user_id, created_at
            FROM books
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&db.pool)
        .await?;
        Ok(records)
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}
