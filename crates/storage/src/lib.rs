use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::Path,
    str::FromStr,
    sync::Arc,
};
use tokio::sync::RwLock;

use shared::domain::{InputState, PersistedInputs, DATASET_SIZE_KEY, DOMAIN_KEY};

pub const DEFAULT_ORIGIN: &str = "autoscore";

/// Durable string map. Writes are last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store. Every key lives under the `origin` it was opened with,
/// so several profiles can share one database file without seeing each other.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    origin: String,
}

impl Storage {
    pub async fn new(database_url: &str, origin: impl Into<String>) -> Result<Self> {
        let database_url = normalize_database_url(database_url);
        create_parent_dir(&database_url)?;

        let connect_options = SqliteConnectOptions::from_str(&database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        let pool = pool_options(&database_url)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open input store at '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            origin: origin.into(),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM input_store WHERE origin = ?1 AND key = ?2",
        )
        .bind(&self.origin)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read key '{key}'"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO input_store (origin, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (origin, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.origin)
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write key '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM input_store WHERE origin = ?1 AND key = ?2")
            .bind(&self.origin)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove key '{key}'"))?;
        Ok(())
    }
}

/// Process-local store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// The two form fields on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct InputStore {
    store: Arc<dyn KeyValueStore>,
}

impl InputStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads each key on its own; an absent key leaves its slot `None`.
    pub async fn load(&self) -> Result<PersistedInputs> {
        Ok(PersistedInputs {
            domain: self.store.get(DOMAIN_KEY).await?,
            dataset_size: self.store.get(DATASET_SIZE_KEY).await?,
        })
    }

    /// Overwrites both keys, empty strings included.
    pub async fn save(&self, domain: &str, dataset_size: &str) -> Result<()> {
        self.store.set(DOMAIN_KEY, domain).await?;
        self.store.set(DATASET_SIZE_KEY, dataset_size).await?;
        tracing::debug!(domain, dataset_size, "persisted form inputs");
        Ok(())
    }

    pub async fn save_state(&self, state: &InputState) -> Result<()> {
        self.save(&state.domain, &state.dataset_size).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(DOMAIN_KEY).await?;
        self.store.remove(DATASET_SIZE_KEY).await?;
        Ok(())
    }
}

const MEMORY_URL: &str = "sqlite::memory:";

/// Each in-memory connection is its own database, so the memory pool holds
/// exactly one connection for its whole life.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.starts_with(MEMORY_URL) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

/// Plain paths become `sqlite://` URLs; an empty value means an in-memory store.
pub fn normalize_database_url(raw: &str) -> String {
    match raw.trim() {
        "" => MEMORY_URL.to_string(),
        url if url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite://{}", path.replace('\\', "/")),
    }
}

fn create_parent_dir(database_url: &str) -> Result<()> {
    if database_url.starts_with(MEMORY_URL) {
        return Ok(());
    }
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}' for the input store", parent.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
