//! SQLite-backed token storage.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::auth::TokenStore;
use crate::errors::ClientError;

/// Token store persisting one row per storage key.
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of stored tokens, across every console session.
    pub async fn count(&self) -> Result<i64, ClientError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM tokens")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        let row = sqlx::query("SELECT token FROM tokens WHERE storage_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("token")))
    }

    async fn save(&self, key: &str, token: &str) -> Result<(), ClientError> {
        let now = timestamp(Utc::now());
        sqlx::query(
            "INSERT INTO tokens (storage_key, token, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(storage_key) DO UPDATE SET token = excluded.token, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(token)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, ClientError> {
        let result = sqlx::query("DELETE FROM tokens WHERE storage_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_if_matches(&self, key: &str, token: &str) -> Result<bool, ClientError> {
        // Single conditional statement so concurrent rejections cannot both succeed
        let result = sqlx::query("DELETE FROM tokens WHERE storage_key = ? AND token = ?")
            .bind(key)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_saved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClientError> {
        let result = sqlx::query("DELETE FROM tokens WHERE updated_at < ?")
            .bind(timestamp(cutoff))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Fixed-width UTC timestamps so `updated_at` compares correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn store() -> (SqliteTokenStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("tokens.sqlite"))
            .await
            .expect("Failed to init DB");
        (SqliteTokenStore::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_save_load_overwrite() {
        let (store, _dir) = store().await;

        assert!(store.load("mdm_token").await.unwrap().is_none());

        store.save("mdm_token", "first").await.unwrap();
        store.save("mdm_token", "second").await.unwrap();

        assert_eq!(
            store.load("mdm_token").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _dir) = store().await;
        store.save("mdm_token", "abc").await.unwrap();

        assert!(store.remove("mdm_token").await.unwrap());
        assert!(!store.remove("mdm_token").await.unwrap());
        assert!(store.load("mdm_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_if_matches() {
        let (store, _dir) = store().await;
        store.save("mdm_token", "current").await.unwrap();

        assert!(!store.remove_if_matches("mdm_token", "stale").await.unwrap());
        assert!(store.remove_if_matches("mdm_token", "current").await.unwrap());
        assert!(!store.remove_if_matches("mdm_token", "current").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_saved_before() {
        let (store, _dir) = store().await;
        store.save("mdm_token:old", "stale").await.unwrap();
        store.save("mdm_token:new", "fresh").await.unwrap();
        sqlx::query("UPDATE tokens SET updated_at = ? WHERE storage_key = ?")
            .bind(timestamp(Utc::now() - chrono::Duration::days(3)))
            .bind("mdm_token:old")
            .execute(&store.pool)
            .await
            .unwrap();

        let removed = store
            .remove_saved_before(Utc::now() - chrono::Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.load("mdm_token:old").await.unwrap().is_none());
        assert_eq!(
            store.load("mdm_token:new").await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tokens_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.sqlite");

        {
            let pool = init_database(&path).await.unwrap();
            SqliteTokenStore::new(pool.clone())
                .save("mdm_token:abc", "persisted")
                .await
                .unwrap();
            pool.close().await;
        }

        let pool = init_database(&path).await.unwrap();
        let store = SqliteTokenStore::new(pool);
        assert_eq!(
            store.load("mdm_token:abc").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
