// SQLite key/value store mirroring the in-memory entity lists.
// One row per storage key; values are JSON text (raw string for activeWorkspaceId).

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub const KEY_WORKSPACES: &str = "workspaces";
pub const KEY_ACTIVE_WORKSPACE: &str = "activeWorkspaceId";
pub const KEY_SERVERS: &str = "servers";
pub const KEY_CONTAINERS: &str = "containers";
pub const KEY_DOMAINS: &str = "domains";
pub const KEY_AGENTS: &str = "agents";
pub const KEY_API_TOKENS: &str = "apiTokens";

/// A pending mirror write. `value: None` removes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageWrite {
    pub key: String,
    pub value: Option<String>,
}

impl StorageWrite {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

pub struct StorageRepo {
    pool: SqlitePool,
}

impl StorageRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "storage", operation = "get"))]
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(row.try_get("value")?))
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.apply(&[StorageWrite::set(key, value)]).await
    }

    pub async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.apply(&[StorageWrite::remove(key)]).await
    }

    /// Applies a batch of writes in one transaction.
    #[instrument(skip(self, writes), fields(repo = "storage", operation = "apply", writes_count = writes.len()))]
    pub async fn apply(&self, writes: &[StorageWrite]) -> anyhow::Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for w in writes {
            match &w.value {
                Some(value) => {
                    sqlx::query(
                        "INSERT INTO kv (key, value, updated_at) VALUES ($1, $2, $3)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    )
                    .bind(&w.key)
                    .bind(value)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM kv WHERE key = $1")
                        .bind(&w.key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn keys(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv ORDER BY key ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get("key")?);
        }
        Ok(out)
    }
}
